//! Interactive multi-turn chat.

mod commands;
mod repl;
mod session;

pub use commands::{CommandError, SlashCommand, help_text};
pub use repl::{InputLines, Repl, complete_turn, spawn_line_reader};
pub use session::{DEFAULT_SYSTEM_PROMPT, Session};

use crate::config::ConfigError;
use std::path::PathBuf;

pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_SAVE_PATH: &str = "gonkagate-chat-history.json";

/// Per-run chat options taken from the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatSettings {
    pub stream: bool,
    pub temperature: f32,
    pub system_prompt: String,
    /// Auto-save target; also the default for `/save`.
    pub save_path: Option<PathBuf>,
}

impl ChatSettings {
    /// Validate raw flag values.
    pub fn from_flags(
        stream: &str,
        temperature: f32,
        system_prompt: Option<&str>,
        save_path: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let stream = parse_stream_value(stream)?;

        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::InvalidTemperature(temperature));
        }

        let system_prompt = system_prompt
            .map(str::trim)
            .filter(|prompt| !prompt.is_empty())
            .unwrap_or(DEFAULT_SYSTEM_PROMPT)
            .to_string();

        let save_path = save_path
            .map(str::trim)
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            stream,
            temperature,
            system_prompt,
            save_path,
        })
    }
}

/// Accepts the usual boolean spellings; empty means `true`.
pub fn parse_stream_value(raw: &str) -> Result<bool, ConfigError> {
    match raw.trim() {
        "" | "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        _ => Err(ConfigError::InvalidStream(raw.to_string())),
    }
}
