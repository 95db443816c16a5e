/*!
 * Mock backend implementation for testing.
 *
 * The mock reads the units back out of the prompt it receives and answers in the
 * same encoding, so the whole prompt → send → parse cycle runs without a network:
 * - `MockBackend::working()` - Translates every unit with a transform function
 * - `MockBackend::drop_last()` - Answers with one unit fewer than it was given
 * - `MockBackend::failing()` - Always fails with an error
 * - `MockBackend::fail_on(n)` - Fails only on the n-th call (0-based)
 */

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::errors::ProviderError;
use crate::providers::LlmBackend;
use crate::translation::encoding::{LineEncoding, PromptEncoding};

/// Behavior mode for the mock backend
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with one translated unit per source unit
    Working,
    /// Succeeds but leaves out the last unit
    DropLast,
    /// Always fails with an error
    Failing,
    /// Fails on the given call index, works otherwise
    FailOn { call: usize },
    /// Returns an empty response
    Empty,
}

/// Scripted backend that echoes the units of each prompt
#[derive(Debug)]
pub struct MockBackend {
    /// Behavior mode
    behavior: MockBehavior,
    /// Encoding used to read prompts and write answers
    codec: Box<dyn LineEncoding>,
    /// Translation applied to each unit
    transform: fn(&str) -> String,
    /// Number of `send` calls so far
    call_count: Arc<AtomicUsize>,
    /// Every prompt received, in order
    prompts: Arc<Mutex<Vec<String>>>,
}

fn default_transform(text: &str) -> String {
    format!("[translated] {}", text)
}

fn is_numbered(line: &str) -> bool {
    match line.split_once(". ") {
        Some((prefix, _)) => !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_digit()),
        None => false,
    }
}

impl MockBackend {
    /// Create a new mock backend with the specified behavior, numbered encoding
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            codec: PromptEncoding::Numbered.codec(""),
            transform: default_transform,
            call_count: Arc::new(AtomicUsize::new(0)),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a working mock backend that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a mock backend that answers one unit short
    pub fn drop_last() -> Self {
        Self::new(MockBehavior::DropLast)
    }

    /// Create a failing mock backend that always returns errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock backend that fails only on call `call`
    pub fn fail_on(call: usize) -> Self {
        Self::new(MockBehavior::FailOn { call })
    }

    /// Create a mock backend that returns empty text
    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Read prompts and write answers in another encoding
    pub fn with_encoding(mut self, encoding: PromptEncoding, separator: &str) -> Self {
        self.codec = encoding.codec(separator);
        self
    }

    /// Set the per-unit translation
    pub fn with_transform(mut self, transform: fn(&str) -> String) -> Self {
        self.transform = transform;
        self
    }

    /// Number of `send` calls made so far
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Prompts received so far
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock()
            .map(|prompts| prompts.clone())
            .unwrap_or_default()
    }

    /// Recover the batch units from a prompt
    ///
    /// The batch is the last block of numbered lines, or the last line for the separator encoding.
    fn units_in(&self, prompt: &str) -> Vec<String> {
        match self.codec.kind() {
            PromptEncoding::Numbered => {
                let lines: Vec<&str> = prompt.lines().collect();
                let end = lines.iter().rposition(|line| is_numbered(line)).map(|i| i + 1).unwrap_or(0);
                let start = lines[..end].iter().rposition(|line| !is_numbered(line)).map(|i| i + 1).unwrap_or(0);
                self.codec.decode(&lines[start..end].join("\n"))
            }
            PromptEncoding::Separator => {
                let body = prompt.lines().last().unwrap_or_default();
                self.codec.decode(body)
            }
        }
    }

    fn answer(&self, units: &[String]) -> String {
        let translated: Vec<String> = units.iter().map(|unit| (self.transform)(unit)).collect();
        let refs: Vec<&str> = translated.iter().map(String::as_str).collect();
        self.codec.encode(&refs)
    }
}

#[async_trait]
impl LlmBackend for MockBackend {
    async fn send(&self, _model: &str, prompt: &str) -> Result<String, ProviderError> {
        let call = self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        let units = self.units_in(prompt);
        match self.behavior {
            MockBehavior::Working => Ok(self.answer(&units)),
            MockBehavior::DropLast => {
                let kept = units.len().saturating_sub(1);
                Ok(self.answer(&units[..kept]))
            }
            MockBehavior::Failing => Err(ProviderError::ApiError {
                status_code: 500,
                message: "Simulated API failure".to_string(),
            }),
            MockBehavior::FailOn { call: failing } if call == failing => Err(ProviderError::ConnectionError(
                format!("Simulated connection failure on call {}", call),
            )),
            MockBehavior::FailOn { .. } => Ok(self.answer(&units)),
            MockBehavior::Empty => Err(ProviderError::EmptyResponse),
        }
    }
}
