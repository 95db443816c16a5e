use std::time::Duration;
use async_trait::async_trait;
use serde::{Serialize, Deserialize};
use reqwest::Client;
use log::{debug, error};

use crate::errors::ProviderError;
use super::{Provider, RetryPolicy};

/// OpenAI client for the Responses API
#[derive(Debug)]
pub struct OpenAI {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API base URL, e.g. `https://api.openai.com/v1`
    endpoint: String,
    /// Retry settings for transient failures
    retry: RetryPolicy,
}

/// Responses API request
#[derive(Debug, Serialize, Default)]
pub struct OpenAIRequest {
    /// The model to use
    model: String,

    /// The prompt, sent as a single user input
    input: String,

    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    /// Upper bound on generated tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

impl OpenAIRequest {
    /// Create a new request for a single prompt
    pub fn new(model: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            input: input.into(),
            ..Default::default()
        }
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum number of output tokens
    pub fn max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }
}

/// Responses API response
#[derive(Debug, Deserialize)]
pub struct OpenAIResponse {
    /// Output items (messages, reasoning, tool calls)
    #[serde(default)]
    pub output: Vec<OpenAIOutputItem>,

    /// Convenience aggregate some compatible servers include
    #[serde(default)]
    pub output_text: Option<String>,

    /// Token usage information
    #[serde(default)]
    pub usage: Option<TokenUsage>,
}

/// One output item
#[derive(Debug, Deserialize)]
pub struct OpenAIOutputItem {
    /// Item type, "message" for generated text
    #[serde(rename = "type", default)]
    pub item_type: String,

    /// Content parts of the item
    #[serde(default)]
    pub content: Vec<OpenAIContent>,
}

/// One content part of an output item
#[derive(Debug, Deserialize)]
pub struct OpenAIContent {
    /// Part type, "output_text" for generated text
    #[serde(rename = "type")]
    pub content_type: String,

    /// The text of the part
    #[serde(default)]
    pub text: String,
}

/// Token usage information
#[derive(Debug, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

impl OpenAI {
    /// Create a new OpenAI client with default timeout and retry settings
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self::new_with_config(api_key, endpoint, Duration::from_secs(120), RetryPolicy::default())
    }

    /// Create a new OpenAI client with configuration
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

    fn responses_url(&self) -> String {
        format!("{}/responses", self.endpoint.trim_end_matches('/'))
    }

    async fn send_once(&self, request: &OpenAIRequest) -> Result<OpenAIResponse, ProviderError> {
        let response = self.client.post(self.responses_url())
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("OpenAI API error ({}): {}", status, error_text);
            return Err(ProviderError::from_status(status.as_u16(), error_text));
        }

        let body = response.text().await?;
        serde_json::from_str::<OpenAIResponse>(&body)
            .map_err(|e| ProviderError::ParseError(format!("{} in OpenAI response", e)))
    }
}

#[async_trait]
impl Provider for OpenAI {
    type Request = OpenAIRequest;
    type Response = OpenAIResponse;

    async fn complete(&self, request: OpenAIRequest) -> Result<OpenAIResponse, ProviderError> {
        debug!("Sending {} chars to OpenAI model {}", request.input.len(), request.model);
        let response = self.retry.run("OpenAI", || self.send_once(&request)).await?;

        if let Some(usage) = &response.usage {
            debug!("OpenAI usage: {} in / {} out tokens", usage.input_tokens, usage.output_tokens);
        }
        Ok(response)
    }

    fn extract_text(response: &OpenAIResponse) -> String {
        if let Some(text) = response.output_text.as_ref().filter(|t| !t.is_empty()) {
            return text.clone();
        }

        response.output.iter()
            .filter(|item| item.item_type == "message")
            .flat_map(|item| item.content.iter())
            .filter(|c| c.content_type == "output_text")
            .map(|c| c.text.as_str())
            .collect()
    }
}
