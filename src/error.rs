use crate::provider::{Fallback, friendly_message};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("{0}")]
    Provider(#[from] crate::provider::Error),

    /// The gateway answered but without usable text.
    #[error("{0}")]
    EmptyResponse(&'static str),

    #[error("{0}")]
    Command(#[from] crate::chat::CommandError),

    #[error("no messages to send")]
    NoMessages,

    #[error("generation canceled")]
    Cancelled,

    #[error("save history: {0}")]
    Transcript(#[from] crate::transcript::TranscriptError),

    #[error("read input: {0}")]
    Input(std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// One-line message for the terminal.
    ///
    /// Provider errors go through status classification; everything else
    /// uses its display text.
    #[must_use]
    pub fn user_message(&self, fallback: Fallback) -> String {
        match self {
            Self::Provider(e) => friendly_message(e, fallback),
            other => {
                let text = other.to_string();
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    crate::provider::UNKNOWN_ERROR.to_string()
                } else {
                    trimmed.to_string()
                }
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
