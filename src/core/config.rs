//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.charla/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::notices::Locale;
use crate::core::state::{DEFAULT_INITIAL_TIMEOUT_MS, SessionConfig};
use crate::transport::http::{
    DEFAULT_CHAT_PATH, DEFAULT_HEALTH_PATH, DEFAULT_HEARTBEAT_MS, DEFAULT_REQUEST_TIMEOUT_MS,
};
use crate::transport::policy::{
    Backoff, DEFAULT_DELAY_MS, DEFAULT_HANDSHAKE_TIMEOUT_MS, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_MAX_DELAY_MS, ReconnectPolicy,
};
use crate::transport::{HttpBackendConfig, TransportSettings};

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CharlaConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub reconnect: ReconnectConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub locale: Option<Locale>,
    pub initial_timeout_ms: Option<u64>,
    pub log_file: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ServerConfig {
    pub url: Option<String>,
    pub chat_path: Option<String>,
    pub health_path: Option<String>,
    pub request_timeout_ms: Option<u64>,
    /// 0 disables the liveness probe.
    pub heartbeat_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ReconnectConfig {
    pub max_attempts: Option<u32>,
    pub delay_ms: Option<u64>,
    pub max_delay_ms: Option<u64>,
    pub backoff: Option<Backoff>,
    pub handshake_timeout_ms: Option<u64>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_LOG_FILE: &str = "charla.log";

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub url: String,
    pub chat_path: String,
    pub health_path: String,
    pub request_timeout: Duration,
    pub heartbeat: Option<Duration>,
    pub policy: ReconnectPolicy,
    pub initial_timeout: Duration,
    pub locale: Locale,
    pub log_file: String,
}

impl ResolvedConfig {
    pub fn backend_config(&self) -> HttpBackendConfig {
        HttpBackendConfig {
            base_url: self.url.clone(),
            chat_path: self.chat_path.clone(),
            health_path: self.health_path.clone(),
            request_timeout: self.request_timeout,
            handshake_timeout: self.policy.handshake_timeout,
        }
    }

    pub fn transport_settings(&self) -> TransportSettings {
        TransportSettings {
            policy: self.policy.clone(),
            heartbeat: self.heartbeat,
            locale: self.locale,
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            max_attempts: self.policy.max_attempts,
            initial_timeout: self.initial_timeout,
            locale: self.locale,
        }
    }
}

/// Values supplied on the command line. `None` means "not given".
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub url: Option<String>,
    pub locale: Option<Locale>,
}

/// Values read from `CHARLA_*` environment variables.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    pub url: Option<String>,
    pub locale: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("CHARLA_URL").ok(),
            locale: std::env::var("CHARLA_LOCALE").ok(),
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.charla/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".charla").join("config.toml"))
}

/// Load config from `explicit`, or from `~/.charla/config.toml`.
///
/// A missing default file is generated (commented out) and yields
/// `CharlaConfig::default()`. A missing explicit file is an error.
pub fn load_config(explicit: Option<&Path>) -> Result<CharlaConfig, ConfigError> {
    if let Some(path) = explicit {
        return read_config(path);
    }

    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(CharlaConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(CharlaConfig::default());
    }

    read_config(&path)
}

fn read_config(path: &Path) -> Result<CharlaConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config = parse_config(&contents)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

pub fn parse_config(contents: &str) -> Result<CharlaConfig, ConfigError> {
    toml::from_str(contents).map_err(ConfigError::Parse)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r#"# Charla Configuration
# All settings are optional. Defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# locale = "en"                      # "en" or "es" (or CHARLA_LOCALE)
# initial_timeout_ms = 7000          # warn if the first connect takes longer
# log_file = "charla.log"

# [server]
# url = "http://127.0.0.1:5000"      # or CHARLA_URL, or --url
# chat_path = "/api/chat"
# health_path = "/"
# request_timeout_ms = 10000
# heartbeat_ms = 25000               # 0 disables the liveness probe

# [reconnect]
# max_attempts = 5
# delay_ms = 2000
# max_delay_ms = 5000
# backoff = "exponential"            # "exponential" or "fixed"
# handshake_timeout_ms = 10000
"#;

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory: {}", e);
            return;
        }
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config from the file, the process environment and CLI flags.
pub fn resolve(config: &CharlaConfig, cli: &CliOverrides) -> Result<ResolvedConfig, ConfigError> {
    resolve_with(config, &EnvOverrides::from_env(), cli)
}

/// Resolve by collapsing: defaults → config file → env → CLI.
pub fn resolve_with(
    config: &CharlaConfig,
    env: &EnvOverrides,
    cli: &CliOverrides,
) -> Result<ResolvedConfig, ConfigError> {
    // URL: CLI → env → config → default
    let url = cli
        .url
        .clone()
        .or_else(|| env.url.clone())
        .or_else(|| config.server.url.clone())
        .unwrap_or_else(|| DEFAULT_URL.to_string());

    // Locale: CLI → env → config → default
    let env_locale = env
        .locale
        .as_deref()
        .map(str::parse::<Locale>)
        .transpose()
        .map_err(ConfigError::Invalid)?;
    let locale = cli
        .locale
        .or(env_locale)
        .or(config.general.locale)
        .unwrap_or_default();

    let r = &config.reconnect;
    let delay = Duration::from_millis(r.delay_ms.unwrap_or(DEFAULT_DELAY_MS));
    let mut max_delay = Duration::from_millis(r.max_delay_ms.unwrap_or(DEFAULT_MAX_DELAY_MS));
    if max_delay < delay {
        warn!(
            "reconnect.max_delay_ms ({:?}) is below delay_ms ({:?}), using delay_ms",
            max_delay, delay
        );
        max_delay = delay;
    }
    let policy = ReconnectPolicy {
        max_attempts: r.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS),
        delay,
        max_delay,
        backoff: r.backoff.unwrap_or_default(),
        handshake_timeout: Duration::from_millis(
            r.handshake_timeout_ms.unwrap_or(DEFAULT_HANDSHAKE_TIMEOUT_MS),
        ),
    };

    let heartbeat = match config.server.heartbeat_ms.unwrap_or(DEFAULT_HEARTBEAT_MS) {
        0 => None,
        ms => Some(Duration::from_millis(ms)),
    };

    Ok(ResolvedConfig {
        url,
        chat_path: config
            .server
            .chat_path
            .clone()
            .unwrap_or_else(|| DEFAULT_CHAT_PATH.to_string()),
        health_path: config
            .server
            .health_path
            .clone()
            .unwrap_or_else(|| DEFAULT_HEALTH_PATH.to_string()),
        request_timeout: Duration::from_millis(
            config
                .server
                .request_timeout_ms
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS),
        ),
        heartbeat,
        policy,
        initial_timeout: Duration::from_millis(
            config
                .general
                .initial_timeout_ms
                .unwrap_or(DEFAULT_INITIAL_TIMEOUT_MS),
        ),
        locale,
        log_file: config
            .general
            .log_file
            .clone()
            .unwrap_or_else(|| DEFAULT_LOG_FILE.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve_plain(config: &CharlaConfig) -> ResolvedConfig {
        resolve_with(config, &EnvOverrides::default(), &CliOverrides::default()).unwrap()
    }

    #[test]
    fn test_resolve_uses_defaults_when_empty() {
        let resolved = resolve_plain(&CharlaConfig::default());
        assert_eq!(resolved.url, DEFAULT_URL);
        assert_eq!(resolved.chat_path, "/api/chat");
        assert_eq!(resolved.policy, ReconnectPolicy::default());
        assert_eq!(resolved.initial_timeout, Duration::from_millis(7000));
        assert_eq!(resolved.heartbeat, Some(Duration::from_millis(25_000)));
        assert_eq!(resolved.locale, Locale::En);
        assert_eq!(resolved.log_file, "charla.log");
    }

    #[test]
    fn test_sparse_toml_parses() {
        let config = parse_config(
            r#"
[reconnect]
max_attempts = 3
"#,
        )
        .unwrap();
        assert_eq!(config.reconnect.max_attempts, Some(3));
        assert!(config.reconnect.delay_ms.is_none());
        assert!(config.server.url.is_none());
    }

    #[test]
    fn test_full_toml_parses() {
        let config = parse_config(
            r#"
[general]
locale = "es"
initial_timeout_ms = 3000

[server]
url = "https://chat.example.org"
chat_path = "/v2/chat"
heartbeat_ms = 0

[reconnect]
backoff = "fixed"
delay_ms = 500
"#,
        )
        .unwrap();
        let resolved = resolve_plain(&config);
        assert_eq!(resolved.locale, Locale::Es);
        assert_eq!(resolved.url, "https://chat.example.org");
        assert_eq!(resolved.heartbeat, None);
        assert_eq!(resolved.policy.backoff, Backoff::Fixed);
        assert_eq!(resolved.policy.delay, Duration::from_millis(500));
        assert_eq!(resolved.backend_config().chat_path, "/v2/chat");
        assert_eq!(resolved.session_config().initial_timeout, Duration::from_millis(3000));
    }

    #[test]
    fn test_unknown_backoff_is_parse_error() {
        let result = parse_config("[reconnect]\nbackoff = \"linear\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_override_order_cli_then_env_then_file() {
        let config = CharlaConfig {
            server: ServerConfig {
                url: Some("http://file".to_string()),
                ..Default::default()
            },
            general: GeneralConfig {
                locale: Some(Locale::En),
                ..Default::default()
            },
            ..Default::default()
        };
        let env = EnvOverrides {
            url: Some("http://env".to_string()),
            locale: Some("es".to_string()),
        };

        let resolved = resolve_with(&config, &env, &CliOverrides::default()).unwrap();
        assert_eq!(resolved.url, "http://env");
        assert_eq!(resolved.locale, Locale::Es);

        let cli = CliOverrides {
            url: Some("http://cli".to_string()),
            locale: Some(Locale::En),
        };
        let resolved = resolve_with(&config, &env, &cli).unwrap();
        assert_eq!(resolved.url, "http://cli");
        assert_eq!(resolved.locale, Locale::En);
    }

    #[test]
    fn test_bad_env_locale_is_rejected() {
        let env = EnvOverrides {
            locale: Some("klingon".to_string()),
            ..Default::default()
        };
        let result = resolve_with(&CharlaConfig::default(), &env, &CliOverrides::default());
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_max_delay_never_below_delay() {
        let config = CharlaConfig {
            reconnect: ReconnectConfig {
                delay_ms: Some(3000),
                max_delay_ms: Some(1000),
                ..Default::default()
            },
            ..Default::default()
        };
        let resolved = resolve_plain(&config);
        assert_eq!(resolved.policy.max_delay, Duration::from_millis(3000));
    }

    #[test]
    fn test_session_and_transport_share_attempt_cap() {
        let config = CharlaConfig {
            reconnect: ReconnectConfig {
                max_attempts: Some(2),
                ..Default::default()
            },
            ..Default::default()
        };
        let resolved = resolve_plain(&config);
        assert_eq!(resolved.session_config().max_attempts, 2);
        assert_eq!(resolved.transport_settings().policy.max_attempts, 2);
    }

    #[test]
    fn test_explicit_missing_file_is_io_error() {
        let result = load_config(Some(Path::new("/nonexistent/charla/config.toml")));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
