/*!
 * Core translation service.
 *
 * This module contains the `TranslationService`, which binds a validated
 * configuration to a backend, and the `RunLog` that collects the diagnostics
 * of one run.
 */

use std::sync::{Arc, Mutex};
use log::Level;

use crate::app_config::Config;
use crate::errors::TranslationError;
use crate::providers::{Backend, BackendFamily, LlmBackend};
use crate::subtitle_processor::SubtitleEntry;

use super::batch::{BatchTranslator, TranslationReport};
use super::encoding::LineEncoding;
use super::prompts::TranslationPromptBuilder;

/// Log entry captured during a run
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub level: Level,
    pub message: String,
}

/// Diagnostics of one run
///
/// Created by the caller and handed to the translator. Cloning shares the same
/// buffer. With `echo` set, every entry also goes to the `log` facade.
#[derive(Debug, Clone, Default)]
pub struct RunLog {
    entries: Arc<Mutex<Vec<LogEntry>>>,
    echo: bool,
}

impl RunLog {
    /// Capture entries and forward them to the `log` facade
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
            echo: true,
        }
    }

    /// Capture entries only, e.g. while a progress bar owns the terminal
    pub fn captured() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
            echo: false,
        }
    }

    pub fn log(&self, level: Level, message: impl Into<String>) {
        let message = message.into();
        if self.echo {
            log::log!(level, "{}", message);
        }
        self.entries.lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(LogEntry { level, message });
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(Level::Error, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(Level::Warn, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(Level::Info, message);
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.log(Level::Debug, message);
    }

    /// Snapshot of all captured entries
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Captured warnings and errors
    pub fn issues(&self) -> Vec<LogEntry> {
        self.entries()
            .into_iter()
            .filter(|entry| entry.level <= Level::Warn)
            .collect()
    }

    pub fn has_issues(&self) -> bool {
        !self.issues().is_empty()
    }
}

/// Main translation service for subtitle translation
pub struct TranslationService<B: LlmBackend = Backend> {
    /// Backend the prompts are sent to
    pub(crate) backend: B,

    /// Configuration for the translation service
    pub config: Config,

    /// Trimmed model name
    pub(crate) model: String,

    /// Prompt builder with resolved language names
    pub(crate) prompt_builder: TranslationPromptBuilder,

    /// Encoding selected for this run
    pub(crate) codec: Box<dyn LineEncoding>,
}

impl TranslationService<Backend> {
    /// Create a service talking to the backend the model name selects
    ///
    /// `lookup` resolves credential variables, usually from the environment.
    pub fn from_config<F>(config: Config, lookup: F) -> Result<Self, TranslationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = Backend::from_config(&config, lookup)?;
        Self::with_backend(config, backend)
    }
}

impl<B: LlmBackend> TranslationService<B> {
    /// Create a service around an existing backend
    ///
    /// The configuration and the model family are checked here, so a bad model
    /// name fails before any batch is built.
    pub fn with_backend(config: Config, backend: B) -> Result<Self, TranslationError> {
        config.validate()?;
        let model = config.model_name().unwrap_or_default().to_string();
        BackendFamily::from_model_name(&model)?;

        let prompt_builder = TranslationPromptBuilder::new(
            &config.source_language_name()?,
            &config.target_language_name()?,
        ).with_few_shot(config.few_shot);
        let codec = config.encoding.codec(&config.separator);

        Ok(Self {
            backend,
            config,
            model,
            prompt_builder,
            codec,
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Source language name as used in prompts
    pub fn source_language(&self) -> &str {
        self.prompt_builder.source_language()
    }

    /// Target language name as used in prompts and output file names
    pub fn target_language(&self) -> &str {
        self.prompt_builder.target_language()
    }

    /// Translate entries in place and report per-batch outcomes
    pub async fn translate_entries(
        &self,
        entries: &mut [SubtitleEntry],
        run_log: &RunLog,
        progress_callback: impl Fn(usize, usize),
    ) -> Result<TranslationReport, TranslationError> {
        let report = BatchTranslator::new(self)
            .translate_batches(entries, run_log, progress_callback)
            .await?;
        Ok(report)
    }
}
