use serde::{Deserialize, Serialize};

/// Which party produced a displayed chat line.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "bot")]
    Bot,
    #[serde(rename = "bot-error")]
    BotError,
    #[serde(rename = "bot-info")]
    BotInfo,
    /// Local notices (rejected sends). Never sent to the backend.
    #[serde(rename = "system")]
    System,
}

impl Origin {
    pub fn label(self) -> &'static str {
        match self {
            Origin::User => "user",
            Origin::Bot => "bot",
            Origin::BotError => "bot-error",
            Origin::BotInfo => "bot-info",
            Origin::System => "system",
        }
    }
}

/// A chat line. Immutable once built; handed to the observer by value.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Message {
    origin: Origin,
    text: String,
}

impl Message {
    pub fn new(origin: Origin, text: impl Into<String>) -> Self {
        Self {
            origin,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Origin::User, text)
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self::new(Origin::Bot, text)
    }

    pub fn bot_error(text: impl Into<String>) -> Self {
        Self::new(Origin::BotError, text)
    }

    pub fn bot_info(text: impl Into<String>) -> Self {
        Self::new(Origin::BotInfo, text)
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Origin::System, text)
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}
