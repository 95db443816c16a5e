/*!
 * Provider implementations for different LLM services.
 *
 * This module contains client implementations for the supported backends:
 * - OpenAI: Responses API (or any compatible server behind `OPENAPI_BASE_URL`)
 * - Gemini: Google Generative Language API, serving Gemini and Gemma models
 *
 * The backend is picked from the model name alone, see [`BackendFamily::from_model_name`].
 */

use async_trait::async_trait;
use log::warn;
use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;

use crate::app_config::{Config, Credentials};
use crate::errors::{ProviderError, TranslationError};

/// Common trait for the concrete HTTP clients
///
/// Each client speaks its own request/response envelope; [`Backend`] hides the
/// difference behind [`LlmBackend::send`].
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// The request type for this provider
    type Request: Send + Sync;

    /// The response type for this provider
    type Response: Send + Sync;

    /// Complete a request using this provider
    ///
    /// # Arguments
    /// * `request` - The request to complete
    ///
    /// # Returns
    /// * `Result<Self::Response, ProviderError>` - The response from the provider or an error
    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError>;

    /// Extract text from the provider response
    fn extract_text(response: &Self::Response) -> String;
}

/// Uniform "send prompt, get text" operation used by the batch orchestrator
///
/// Calls are single-shot and stateless: nothing is carried from one batch to the next.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Send one prompt and return the generated text
    async fn send(&self, model: &str, prompt: &str) -> Result<String, ProviderError>;
}

/// Known model families
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendFamily {
    /// "gpt" models, OpenAI-style envelope
    OpenAI,
    /// "gemini" and "gemma" models, Google-style envelope
    Gemini,
}

impl BackendFamily {
    /// Select a backend family by substring match on the model name
    pub fn from_model_name(model: &str) -> Result<Self, TranslationError> {
        let lowered = model.to_lowercase();
        if lowered.contains("gpt") {
            Ok(Self::OpenAI)
        } else if lowered.contains("gemini") || lowered.contains("gemma") {
            Ok(Self::Gemini)
        } else {
            Err(TranslationError::UnknownModel(model.to_string()))
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::OpenAI => "OpenAI",
            Self::Gemini => "Gemini",
        }
    }
}

/// Retry settings for transient backend failures
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one
    pub max_retries: u32,
    /// Base backoff in milliseconds, doubled on each retry
    pub backoff_base_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff_base_ms: 1000,
        }
    }
}

impl RetryPolicy {
    /// No retries at all
    pub fn none() -> Self {
        Self { max_retries: 0, backoff_base_ms: 0 }
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << (attempt.saturating_sub(1)).min(16);
        Duration::from_millis(self.backoff_base_ms.saturating_mul(factor))
    }

    /// Run `operation` until it succeeds, fails permanently or runs out of attempts
    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = self.backoff(attempt);
                    warn!("{} request failed ({}), retry {}/{} in {:?}", label, e, attempt, self.max_retries, delay);
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// The closed set of real backends
#[derive(Debug)]
pub enum Backend {
    OpenAI(OpenAI),
    Gemini(Gemini),
}

impl Backend {
    /// Build the backend for the configured model, resolving credentials through `lookup`
    ///
    /// Fails with `UnknownModel` or a configuration error before any request is made.
    pub fn from_config<F>(config: &Config, lookup: F) -> Result<Self, TranslationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        config.validate()?;
        let model = config.model_name().unwrap_or_default();
        let family = BackendFamily::from_model_name(model)?;
        let credentials = Credentials::resolve(family, lookup)?;

        let retry = RetryPolicy {
            max_retries: config.retry_count,
            backoff_base_ms: config.retry_backoff_ms,
        };
        let timeout = Duration::from_secs(config.timeout_secs);

        Ok(match family {
            BackendFamily::OpenAI => Self::OpenAI(OpenAI::new_with_config(
                credentials.api_key,
                credentials.base_url.unwrap_or_default(),
                timeout,
                retry,
            )),
            BackendFamily::Gemini => Self::Gemini(Gemini::new_with_config(
                credentials.api_key,
                credentials.base_url.unwrap_or_else(|| gemini::DEFAULT_ENDPOINT.to_string()),
                timeout,
                retry,
            )),
        })
    }

    pub fn family(&self) -> BackendFamily {
        match self {
            Self::OpenAI(_) => BackendFamily::OpenAI,
            Self::Gemini(_) => BackendFamily::Gemini,
        }
    }
}

/// Trim the extracted text and reject empty answers
fn non_empty(text: String) -> Result<String, ProviderError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(ProviderError::EmptyResponse)
    } else {
        Ok(trimmed.to_string())
    }
}

#[async_trait]
impl LlmBackend for Backend {
    async fn send(&self, model: &str, prompt: &str) -> Result<String, ProviderError> {
        match self {
            Self::OpenAI(client) => {
                let response = client.complete(OpenAIRequest::new(model, prompt)).await?;
                non_empty(OpenAI::extract_text(&response))
            }
            Self::Gemini(client) => {
                let response = client.complete(GeminiRequest::new(model, prompt)).await?;
                non_empty(Gemini::extract_text(&response))
            }
        }
    }
}

pub mod gemini;
pub mod mock;
pub mod openai;

pub use gemini::{Gemini, GeminiRequest};
pub use openai::{OpenAI, OpenAIRequest};
