use std::time::Duration;
use async_trait::async_trait;
use serde::{Serialize, Deserialize};
use reqwest::Client;
use url::Url;
use log::{debug, error, warn};

use crate::errors::ProviderError;
use super::{Provider, RetryPolicy};

/// Public Generative Language API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

/// Gemini client for the `generateContent` API (Gemini and Gemma models)
#[derive(Debug)]
pub struct Gemini {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API endpoint URL
    endpoint: String,
    /// Retry settings for transient failures
    retry: RetryPolicy,
}

/// generateContent request
#[derive(Debug, Serialize)]
pub struct GeminiRequest {
    /// The model to use; part of the URL, not of the body
    #[serde(skip)]
    model: String,

    /// Conversation turns, a single user turn here
    contents: Vec<GeminiContent>,

    /// Sampling configuration
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

/// One conversation turn
#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiContent {
    /// "user" or "model"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Text parts of the turn
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

/// One text part
#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiPart {
    #[serde(default)]
    pub text: String,
}

/// Generation options
#[derive(Debug, Serialize, Default)]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    #[serde(rename = "maxOutputTokens", skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

/// generateContent response
#[derive(Debug, Deserialize)]
pub struct GeminiResponse {
    /// Generated candidates; the first one is used
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,

    /// Token usage information
    #[serde(rename = "usageMetadata", default)]
    pub usage_metadata: Option<UsageMetadata>,
}

/// One generated candidate
#[derive(Debug, Deserialize)]
pub struct GeminiCandidate {
    #[serde(default)]
    pub content: Option<GeminiContent>,

    #[serde(rename = "finishReason", default)]
    pub finish_reason: Option<String>,
}

/// Token usage information
#[derive(Debug, Deserialize)]
pub struct UsageMetadata {
    #[serde(rename = "promptTokenCount", default)]
    pub prompt_token_count: u64,
    #[serde(rename = "candidatesTokenCount", default)]
    pub candidates_token_count: u64,
}

impl GeminiRequest {
    /// Create a new single-turn request
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart { text: prompt.into() }],
            }],
            generation_config: None,
        }
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.generation_config.get_or_insert_with(GenerationConfig::default).temperature = Some(temperature);
        self
    }

    /// Set the maximum number of output tokens
    pub fn max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.generation_config.get_or_insert_with(GenerationConfig::default).max_output_tokens = Some(max_output_tokens);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl Gemini {
    /// Create a new Gemini client against the public endpoint
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::new_with_config(api_key, DEFAULT_ENDPOINT, Duration::from_secs(120), RetryPolicy::default())
    }

    /// Create a new Gemini client with configuration
    pub fn new_with_config(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            retry,
        }
    }

    fn generate_url(&self, model: &str) -> Result<Url, ProviderError> {
        let raw = format!("{}/v1beta/models/{}:generateContent", self.endpoint.trim_end_matches('/'), model);
        Url::parse(&raw).map_err(|e| ProviderError::RequestFailed(format!("Invalid Gemini URL {}: {}", raw, e)))
    }

    async fn send_once(&self, url: &Url, request: &GeminiRequest) -> Result<GeminiResponse, ProviderError> {
        let response = self.client.post(url.clone())
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Gemini API error ({}): {}", status, error_text);
            return Err(ProviderError::from_status(status.as_u16(), error_text));
        }

        let body = response.text().await?;
        serde_json::from_str::<GeminiResponse>(&body)
            .map_err(|e| ProviderError::ParseError(format!("{} in Gemini response", e)))
    }
}

#[async_trait]
impl Provider for Gemini {
    type Request = GeminiRequest;
    type Response = GeminiResponse;

    async fn complete(&self, request: GeminiRequest) -> Result<GeminiResponse, ProviderError> {
        let url = self.generate_url(&request.model)?;
        debug!("Sending request to Gemini model {}", request.model);

        let response = self.retry.run("Gemini", || self.send_once(&url, &request)).await?;

        if let Some(reason) = response.candidates.first().and_then(|c| c.finish_reason.as_deref()) {
            if reason != "STOP" {
                warn!("Gemini finished with reason {}, output may be incomplete", reason);
            }
        }
        if let Some(usage) = &response.usage_metadata {
            debug!("Gemini usage: {} in / {} out tokens", usage.prompt_token_count, usage.candidates_token_count);
        }
        Ok(response)
    }

    fn extract_text(response: &GeminiResponse) -> String {
        response.candidates.first()
            .and_then(|c| c.content.as_ref())
            .map(|content| content.parts.iter().map(|p| p.text.as_str()).collect())
            .unwrap_or_default()
    }
}
