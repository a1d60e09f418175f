//! Saved conversation transcripts.

use crate::provider::ChatMessage;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("create save directory: {0}")]
    CreateDir(std::io::Error),

    #[error("serialize transcript: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("write transcript: {0}")]
    Write(std::io::Error),

    #[error("read transcript: {0}")]
    Read(std::io::Error),
}

/// Settings in effect when the transcript was saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub model: String,
    pub base_url: String,
    pub streaming: bool,
    pub temperature: f32,
    pub system_prompt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    #[serde(default)]
    pub saved_at: String,
    pub meta: Metadata,
    pub messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new(meta: Metadata, messages: Vec<ChatMessage>) -> Self {
        Self {
            saved_at: String::new(),
            meta,
            messages,
        }
    }

    /// Write as pretty JSON, creating parent directories as needed.
    ///
    /// `saved_at` is stamped with the current UTC time when empty.
    pub fn save(&self, path: &Path) -> Result<(), TranscriptError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(TranscriptError::CreateDir)?;
        }

        let mut transcript = self.clone();
        if transcript.saved_at.is_empty() {
            transcript.saved_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        }

        let mut data = serde_json::to_string_pretty(&transcript)?;
        data.push('\n');
        std::fs::write(path, data).map_err(TranscriptError::Write)?;

        tracing::debug!(path = %path.display(), messages = transcript.messages.len(), "transcript saved");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, TranscriptError> {
        let data = std::fs::read_to_string(path).map_err(TranscriptError::Read)?;
        Ok(serde_json::from_str(&data)?)
    }
}
