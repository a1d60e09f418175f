//! Configuration resolved from the environment.

use thiserror::Error;

/// The only base URL requests are sent to.
pub const BASE_URL: &str = "https://api.gonkagate.com/v1";

/// Model value shipped in sample `.env` files; treated as unset.
pub const MODEL_PLACEHOLDER: &str = "your_model";

pub const API_KEY_VAR: &str = "GONKAGATE_API_KEY";
pub const API_KEY_FALLBACK_VAR: &str = "OPENAI_API_KEY";
pub const MODEL_VAR: &str = "GONKAGATE_MODEL";
/// Read only to warn that they have no effect.
pub const IGNORED_BASE_URL_VARS: [&str; 2] = ["GONKAGATE_BASE_URL", "OPENAI_BASE_URL"];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error(
        "Missing API key. Set GONKAGATE_API_KEY (recommended) or OPENAI_API_KEY in your environment."
    )]
    MissingApiKey,

    #[error("Missing model. Set GONKAGATE_MODEL in your environment.")]
    MissingModel,

    #[error("Missing model. Set GONKAGATE_MODEL in your environment or pass --model.")]
    MissingModelOrFlag,

    #[error("invalid --stream value {0:?}: expected true or false")]
    InvalidStream(String),

    #[error("invalid temperature {0:.2}: expected value between 0 and 2")]
    InvalidTemperature(f32),
}

/// Settings read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_key: Option<String>,
    pub base_url: &'static str,
    pub model: Option<String>,
    /// A base-URL override variable was set and is being ignored.
    pub base_url_overridden: bool,
}

/// Validated credentials ready for a request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub model: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .finish()
    }
}

impl Config {
    /// Resolve from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve using an arbitrary variable lookup.
    ///
    /// Blank values count as unset, so `OPENAI_API_KEY` is used when
    /// `GONKAGATE_API_KEY` is present but empty.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| non_blank(lookup(name));

        Self {
            api_key: read(API_KEY_VAR).or_else(|| read(API_KEY_FALLBACK_VAR)),
            base_url: BASE_URL,
            model: read(MODEL_VAR),
            base_url_overridden: IGNORED_BASE_URL_VARS.iter().any(|&name| read(name).is_some()),
        }
    }

    /// Prefer an explicit model over the environment.
    #[must_use]
    pub fn with_model_override(mut self, model: Option<&str>) -> Self {
        if let Some(model) = non_blank(model.map(str::to_string)) {
            self.model = Some(model);
        }
        self
    }

    /// Warning to print when base-URL overrides were found.
    pub fn base_url_warning(&self) -> Option<String> {
        self.base_url_overridden.then(|| {
            format!(
                "Warning: GONKAGATE_BASE_URL and OPENAI_BASE_URL are ignored. Base URL is fixed to {}.",
                self.base_url
            )
        })
    }

    /// Check that both the key and a real model are present.
    pub fn validate(&self) -> Result<Credentials, ConfigError> {
        let api_key = self.api_key.clone().ok_or(ConfigError::MissingApiKey)?;
        let model = self
            .model
            .clone()
            .filter(|model| model != MODEL_PLACEHOLDER)
            .ok_or(ConfigError::MissingModel)?;

        Ok(Credentials { api_key, model })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
