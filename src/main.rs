use std::fs::File;
use std::path::PathBuf;

use charla::core::config::{self, CliOverrides};
use charla::core::notices::Locale;
use charla::tui;
use clap::Parser;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

#[derive(Parser)]
#[command(name = "charla", about = "Terminal client for a realtime help chat")]
struct Args {
    /// Chat server base URL (overrides CHARLA_URL and the config file)
    #[arg(short, long)]
    url: Option<String>,

    /// Interface language: en or es
    #[arg(short, long)]
    locale: Option<Locale>,

    /// Config file to use instead of ~/.charla/config.toml
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    let file_config = config::load_config(args.config.as_deref())?;
    let resolved = config::resolve(
        &file_config,
        &CliOverrides {
            url: args.url,
            locale: args.locale,
        },
    )?;

    // File logger; the terminal belongs to the UI
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    if let Ok(log_file) = File::create(&resolved.log_file) {
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }

    log::info!(
        "Charla starting up against {} (locale: {})",
        resolved.url,
        resolved.locale
    );

    tui::run(resolved)?;
    Ok(())
}
