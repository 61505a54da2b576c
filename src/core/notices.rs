//! # Notices
//!
//! Every user-readable line the client can show that did not come from the
//! backend's answer text. Kept in one table so status messages are
//! classified in one place and can be rendered in either supported locale.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Es,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Locale::En),
            "es" | "spanish" | "español" => Ok(Locale::Es),
            other => Err(format!("unsupported locale '{other}' (expected 'en' or 'es')")),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locale::En => write!(f, "en"),
            Locale::Es => write!(f, "es"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Connecting,
    /// Watchdog fired before the first connect.
    SlowConnection,
    ServerDisconnected,
    /// Lost the connection; automatic reconnection follows.
    Disconnected,
    ConnectionError,
    ConnectionTimeout,
    Reconnecting(u32),
    ReconnectFailed,
    TransportUnavailable,
    NotConnected,
    Busy,
    LoginAdvisory,
    UnexpectedResponse,
    UnknownChatError,
    Typing,
    RequestTimedOut,
    ServerError,
    CommunicationError,
}

impl Notice {
    pub fn text(self, locale: Locale) -> String {
        match locale {
            Locale::En => self.english(),
            Locale::Es => self.spanish(),
        }
    }

    fn english(self) -> String {
        match self {
            Notice::Connecting => "Starting chat connection...".into(),
            Notice::SlowConnection => {
                "The connection is taking a while. Check the server or try reloading.".into()
            }
            Notice::ServerDisconnected => "Disconnected by the server. Try reloading.".into(),
            Notice::Disconnected => "Disconnected. Trying to reconnect...".into(),
            Notice::ConnectionError => {
                "Connection error. Check your network and try reloading.".into()
            }
            Notice::ConnectionTimeout => "The connection timed out.".into(),
            Notice::Reconnecting(n) => format!("Trying to reconnect ({n})..."),
            Notice::ReconnectFailed => "Could not reconnect. Please reload.".into(),
            Notice::TransportUnavailable => "The chat transport is not available.".into(),
            Notice::NotConnected => "You are not connected. Trying to reconnect...".into(),
            Notice::Busy => "Please wait for the assistant to reply.".into(),
            Notice::LoginAdvisory => "Please log in to get more personalized answers.".into(),
            Notice::UnexpectedResponse => "Unexpected response from the server.".into(),
            Notice::UnknownChatError => "An unknown chat error occurred.".into(),
            Notice::Typing => "The assistant is typing...".into(),
            Notice::RequestTimedOut => "The chatbot request took too long.".into(),
            Notice::ServerError => "The chat server failed to process the request.".into(),
            Notice::CommunicationError => "Could not communicate with the chat server.".into(),
        }
    }

    fn spanish(self) -> String {
        match self {
            Notice::Connecting => "Iniciando conexión con el chat...".into(),
            Notice::SlowConnection => {
                "La conexión está tardando. Verifique el servidor o intente recargar.".into()
            }
            Notice::ServerDisconnected => "Desconectado por el servidor. Intenta recargar.".into(),
            Notice::Disconnected => "Desconectado. Intentando reconectar...".into(),
            Notice::ConnectionError => {
                "Error de conexión. Verifica tu red e intenta recargar.".into()
            }
            Notice::ConnectionTimeout => "La conexión ha expirado.".into(),
            Notice::Reconnecting(n) => format!("Intentando reconectar ({n})..."),
            Notice::ReconnectFailed => "No se pudo reconectar. Por favor, recarga la página.".into(),
            Notice::TransportUnavailable => "El chat no está disponible.".into(),
            Notice::NotConnected => "No estás conectado. Intentando reconectar...".into(),
            Notice::Busy => "Espera a que el asistente responda.".into(),
            Notice::LoginAdvisory => {
                "Por favor, inicia sesión para obtener respuestas más personalizadas.".into()
            }
            Notice::UnexpectedResponse => "Respuesta inesperada del servidor.".into(),
            Notice::UnknownChatError => "Ocurrió un error desconocido con el chat.".into(),
            Notice::Typing => "El asistente está escribiendo...".into(),
            Notice::RequestTimedOut => "La solicitud al chatbot tardó demasiado.".into(),
            Notice::ServerError => "Error del servidor de chat al procesar la solicitud.".into(),
            Notice::CommunicationError => "Error de comunicación con el servidor de chat.".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconnecting_includes_attempt_number() {
        assert_eq!(
            Notice::Reconnecting(3).text(Locale::En),
            "Trying to reconnect (3)..."
        );
        assert_eq!(
            Notice::Reconnecting(2).text(Locale::Es),
            "Intentando reconectar (2)..."
        );
    }

    #[test]
    fn test_locale_parses_case_insensitively() {
        assert_eq!("ES".parse::<Locale>().unwrap(), Locale::Es);
        assert_eq!(" en ".parse::<Locale>().unwrap(), Locale::En);
        assert!("fr".parse::<Locale>().is_err());
    }

    #[test]
    fn test_every_notice_has_text_in_both_locales() {
        let all = [
            Notice::Connecting,
            Notice::SlowConnection,
            Notice::ServerDisconnected,
            Notice::Disconnected,
            Notice::ConnectionError,
            Notice::ConnectionTimeout,
            Notice::Reconnecting(1),
            Notice::ReconnectFailed,
            Notice::TransportUnavailable,
            Notice::NotConnected,
            Notice::Busy,
            Notice::LoginAdvisory,
            Notice::UnexpectedResponse,
            Notice::UnknownChatError,
            Notice::Typing,
            Notice::RequestTimedOut,
            Notice::ServerError,
            Notice::CommunicationError,
        ];
        for notice in all {
            assert!(!notice.text(Locale::En).is_empty(), "{notice:?}");
            assert!(!notice.text(Locale::Es).is_empty(), "{notice:?}");
            assert_ne!(notice.text(Locale::En), notice.text(Locale::Es));
        }
    }
}
