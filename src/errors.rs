/*!
 * Error types for the subtranslate application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 *
 * Fatal errors (`ConfigError`, `TranslationError`) abort a run before any request
 * is sent. Per-batch errors (`BatchError`) are contained by the orchestrator and
 * reported alongside the translated output.
 */

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The API answered successfully but carried no text
    #[error("API returned an empty response")]
    EmptyResponse,
}

impl ProviderError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ConnectionError(_) | Self::RateLimitExceeded(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            _ => false,
        }
    }

    /// Map a non-success HTTP status to the matching error variant
    pub fn from_status(status_code: u16, message: String) -> Self {
        match status_code {
            401 | 403 => Self::AuthenticationError(message),
            429 => Self::RateLimitExceeded(message),
            _ => Self::ApiError { status_code, message },
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() || error.is_connect() {
            Self::ConnectionError(error.to_string())
        } else if error.is_decode() {
            Self::ParseError(error.to_string())
        } else {
            Self::RequestFailed(error.to_string())
        }
    }
}

/// Configuration problems detected before a run starts
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    /// No model name was given
    #[error("No model name specified. Use -m/--model-name or set \"model\" in the config file")]
    MissingModel,

    /// A credential environment variable is absent or empty
    #[error("Missing credential: set the {variable} environment variable or add it to a .env file")]
    MissingCredential {
        /// Name of the absent variable
        variable: String,
    },

    /// Batch size must be a positive integer
    #[error("Invalid batch size {0}: must be a positive integer")]
    InvalidBatchSize(usize),

    /// Requests-per-cooldown must be a positive integer
    #[error("Invalid rate limit {0}: must be a positive integer")]
    InvalidRateLimit(usize),

    /// Language is neither a known ISO code nor a usable name
    #[error("Invalid language: {0:?}")]
    InvalidLanguage(String),
}

/// Errors that abort a translation run
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Configuration is incomplete or invalid
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The model name does not belong to any supported backend family
    #[error("Unknown model {0:?}: expected a name containing \"gpt\", \"gemini\" or \"gemma\"")]
    UnknownModel(String),
}

/// Errors contained at batch granularity
#[derive(Error, Debug)]
pub enum BatchError {
    /// Sending the prompt failed
    #[error("Backend error: {0}")]
    Backend(#[from] ProviderError),

    /// The response did not carry one line per source entry
    #[error("Line count mismatch: expected {expected} lines, got {actual}")]
    LineCountMismatch {
        /// Number of entries in the batch
        expected: usize,
        /// Number of lines parsed from the response
        actual: usize,
    },
}

/// Errors that can occur during subtitle processing
#[derive(Error, Debug)]
pub enum SubtitleError {
    /// The content contained no subtitle cues at all
    #[error("No subtitle entries found")]
    NoEntries,

    /// A cue block started with something other than a sequence number
    #[error("Invalid sequence number at line {line}: {content:?}")]
    InvalidSequenceNumber {
        /// 1-based line number
        line: usize,
        /// The offending line
        content: String,
    },

    /// A cue had no timing line
    #[error("Missing timecode for entry {seq_num}")]
    MissingTimecode {
        /// Sequence number of the cue
        seq_num: usize,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from subtitle processing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}

impl From<ConfigError> for AppError {
    fn from(error: ConfigError) -> Self {
        Self::Translation(TranslationError::Config(error))
    }
}
