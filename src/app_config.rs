use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::Path;
use anyhow::{Context, Result};

use crate::errors::ConfigError;
use crate::language_utils;
use crate::providers::BackendFamily;
use crate::translation::encoding::PromptEncoding;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and resolving the credentials of the selected backend.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Source language name or ISO code
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language name or ISO code
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Model name; its family selects the backend
    #[serde(default)]
    pub model: Option<String>,

    /// Subtitle entries per request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Batches sent between two cooldown pauses
    #[serde(default = "default_rpm_limit")]
    pub rpm_limit: usize,

    /// Length of the cooldown pause in seconds
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,

    /// How subtitle lines are framed in the prompt
    #[serde(default)]
    pub encoding: PromptEncoding,

    /// Sentinel used by the separator encoding
    #[serde(default = "default_separator")]
    pub separator: String,

    /// Embed the few-shot calibration block in every prompt
    #[serde(default)]
    pub few_shot: bool,

    /// Extra attempts for a batch after a transient backend error
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Base backoff for retries in milliseconds, doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// HTTP timeout for one request in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Resolved credentials for one backend family
#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    /// API key sent with every request
    pub api_key: String,

    /// Base URL of the API, if the family has a configurable one
    pub base_url: Option<String>,
}

impl Credentials {
    /// Resolve credentials for a backend family from a variable lookup
    ///
    /// `lookup` is usually [`Credentials::env_lookup`]; tests pass a closure over a map.
    pub fn resolve<F>(family: BackendFamily, lookup: F) -> std::result::Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |variable: &str| {
            lookup(variable)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or_else(|| ConfigError::MissingCredential { variable: variable.to_string() })
        };

        match family {
            BackendFamily::OpenAI => Ok(Self {
                api_key: required(OPENAI_API_KEY_VAR)?,
                base_url: Some(required(OPENAI_BASE_URL_VAR)?),
            }),
            BackendFamily::Gemini => Ok(Self {
                api_key: required(GOOGLE_API_KEY_VAR)?,
                base_url: lookup(GEMINI_BASE_URL_VAR).filter(|url| !url.trim().is_empty()),
            }),
        }
    }

    /// Process environment lookup; call `load_dotenv` first to see `.env` values
    pub fn env_lookup(variable: &str) -> Option<String> {
        std::env::var(variable).ok()
    }

    /// Load `.env` into the process environment without overriding set variables
    pub fn load_dotenv() {
        match dotenvy::dotenv() {
            Ok(path) => log::debug!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => {},
            Err(e) => log::warn!("Failed to load .env file: {}", e),
        }
    }
}

pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const OPENAI_BASE_URL_VAR: &str = "OPENAPI_BASE_URL";
pub const GOOGLE_API_KEY_VAR: &str = "GOOGLE_API_KEY";
pub const GEMINI_BASE_URL_VAR: &str = "GEMINI_BASE_URL";

fn default_source_language() -> String {
    "English".to_string()
}

fn default_target_language() -> String {
    "Persian".to_string()
}

fn default_batch_size() -> usize {
    200
}

fn default_rpm_limit() -> usize {
    15
}

fn default_cooldown_secs() -> u64 {
    30
}

fn default_separator() -> String {
    "||SEP||".to_string()
}

fn default_retry_count() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_timeout_secs() -> u64 {
    120
}

impl Config {
    /// Load a configuration file, falling back to defaults when it does not exist
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("Config file {:?} not found, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.model_name().is_none() {
            return Err(ConfigError::MissingModel);
        }

        if self.batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize(self.batch_size));
        }

        if self.rpm_limit == 0 {
            return Err(ConfigError::InvalidRateLimit(self.rpm_limit));
        }

        language_utils::resolve_language_name(&self.source_language)?;
        language_utils::resolve_language_name(&self.target_language)?;

        Ok(())
    }

    /// The model name, if one is set and non-blank
    pub fn model_name(&self) -> Option<&str> {
        self.model.as_deref()
            .map(str::trim)
            .filter(|model| !model.is_empty())
    }

    /// Source language as written in prompts
    pub fn source_language_name(&self) -> std::result::Result<String, ConfigError> {
        language_utils::resolve_language_name(&self.source_language)
    }

    /// Target language as written in prompts
    pub fn target_language_name(&self) -> std::result::Result<String, ConfigError> {
        language_utils::resolve_language_name(&self.target_language)
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            model: None,
            batch_size: default_batch_size(),
            rpm_limit: default_rpm_limit(),
            cooldown_secs: default_cooldown_secs(),
            encoding: PromptEncoding::default(),
            separator: default_separator(),
            few_shot: false,
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            timeout_secs: default_timeout_secs(),
            log_level: LogLevel::default(),
        }
    }
}
