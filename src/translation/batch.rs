/*!
 * Batch translation processing.
 *
 * This module splits subtitle entries into batches and drives each batch
 * through prompt → send → parse → write-back, strictly one after another.
 * A failed batch leaves its entries untouched and does not stop the run.
 */

use std::time::Duration;

use crate::errors::{BatchError, ConfigError};
use crate::providers::LlmBackend;
use crate::subtitle_processor::SubtitleEntry;

use super::core::{RunLog, TranslationService};

/// Split `items` into contiguous batches of `batch_size`, the last one possibly shorter
pub fn chunk<T>(items: &[T], batch_size: usize) -> Result<Vec<&[T]>, ConfigError> {
    if batch_size == 0 {
        return Err(ConfigError::InvalidBatchSize(batch_size));
    }
    Ok(items.chunks(batch_size).collect())
}

/// Lifecycle of one batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Pending,
    Sent,
    Parsed,
    Failed,
}

/// Outcome of one batch
#[derive(Debug)]
pub struct BatchReport {
    /// Position of the batch in the run, 0-based
    pub index: usize,
    /// Sequence numbers of the entries the batch covered
    pub seq_nums: Vec<usize>,
    /// Final state, `Parsed` or `Failed`
    pub state: BatchState,
    /// Why the batch failed
    pub error: Option<BatchError>,
}

/// Outcome of a whole run
#[derive(Debug, Default)]
pub struct TranslationReport {
    /// One report per batch, in order
    pub batches: Vec<BatchReport>,
    /// Number of rate-limit pauses taken
    pub cooldowns: usize,
}

impl TranslationReport {
    /// Batches that ended in `Failed`
    pub fn failed_batches(&self) -> Vec<&BatchReport> {
        self.batches.iter()
            .filter(|batch| batch.state == BatchState::Failed)
            .collect()
    }

    /// Sequence numbers of entries left in the source language
    pub fn untranslated_entries(&self) -> Vec<usize> {
        self.failed_batches()
            .into_iter()
            .flat_map(|batch| batch.seq_nums.iter().copied())
            .collect()
    }

    /// Number of entries written back with a translation
    pub fn translated_count(&self) -> usize {
        self.batches.iter()
            .filter(|batch| batch.state == BatchState::Parsed)
            .map(|batch| batch.seq_nums.len())
            .sum()
    }

    /// Whether every batch was translated
    pub fn is_complete(&self) -> bool {
        self.batches.iter().all(|batch| batch.state == BatchState::Parsed)
    }
}

/// Batch translator for processing subtitle entries in batches
pub struct BatchTranslator<'a, B: LlmBackend> {
    /// The translation service to use
    service: &'a TranslationService<B>,
}

impl<'a, B: LlmBackend> BatchTranslator<'a, B> {
    /// Create a new batch translator
    pub fn new(service: &'a TranslationService<B>) -> Self {
        Self { service }
    }

    /// Translate `entries` in place
    ///
    /// Entries with blank text are never sent and keep their text. The progress
    /// callback receives `(completed_batches, total_batches)` after each batch.
    pub async fn translate_batches(
        &self,
        entries: &mut [SubtitleEntry],
        run_log: &RunLog,
        progress_callback: impl Fn(usize, usize),
    ) -> Result<TranslationReport, ConfigError> {
        let config = &self.service.config;
        let positions: Vec<usize> = entries.iter()
            .enumerate()
            .filter(|(_, entry)| entry.is_translatable())
            .map(|(pos, _)| pos)
            .collect();

        let skipped = entries.len() - positions.len();
        if skipped > 0 {
            run_log.debug(format!("Skipping {} entries with empty text", skipped));
        }

        if config.rpm_limit == 0 {
            return Err(ConfigError::InvalidRateLimit(config.rpm_limit));
        }
        let batches = chunk(&positions, config.batch_size)?;
        let mut report = TranslationReport::default();
        if batches.is_empty() {
            return Ok(report);
        }

        let total = batches.len();
        let cooldown = Duration::from_secs(config.cooldown_secs);
        run_log.info(format!("Translating {} entries in {} batches", positions.len(), total));

        for (index, batch) in batches.into_iter().enumerate() {
            let batch_report = self.translate_batch(index, total, batch, entries, run_log).await;
            report.batches.push(batch_report);
            progress_callback(index + 1, total);

            let dispatched = index + 1;
            if dispatched % config.rpm_limit == 0 && dispatched < total {
                run_log.info(format!(
                    "Sent {} batches, pausing {}s for the rate limit",
                    dispatched, config.cooldown_secs
                ));
                tokio::time::sleep(cooldown).await;
                report.cooldowns += 1;
            }
        }

        let failed = report.failed_batches().len();
        if failed > 0 {
            run_log.warn(format!(
                "{} of {} batches failed, {} entries left untranslated",
                failed, total, report.untranslated_entries().len()
            ));
        }
        Ok(report)
    }

    async fn translate_batch(
        &self,
        index: usize,
        total: usize,
        positions: &[usize],
        entries: &mut [SubtitleEntry],
        run_log: &RunLog,
    ) -> BatchReport {
        let mut report = BatchReport {
            index,
            seq_nums: positions.iter().map(|&pos| entries[pos].seq_num).collect(),
            state: BatchState::Pending,
            error: None,
        };

        let originals: Vec<&str> = positions.iter().map(|&pos| entries[pos].text.as_str()).collect();
        let prompt = self.service.prompt_builder.build(self.service.codec.as_ref(), &originals);

        report.state = BatchState::Sent;
        run_log.debug(format!("Batch {}/{}: sending {} entries", index + 1, total, positions.len()));

        let raw = match self.service.backend.send(&self.service.model, &prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                run_log.error(format!(
                    "Batch {}/{} failed: {}\nUntranslated texts:\n{}",
                    index + 1, total, e, originals.join("\n")
                ));
                report.state = BatchState::Failed;
                report.error = Some(BatchError::Backend(e));
                return report;
            }
        };

        let translated = self.service.codec.decode(&raw);
        if translated.len() != positions.len() {
            run_log.error(format!(
                "Batch {}/{}: expected {} lines, got {}\nOriginal texts:\n{}\nParsed output:\n{}",
                index + 1, total, positions.len(), translated.len(),
                originals.join("\n"), translated.join("\n")
            ));
            report.state = BatchState::Failed;
            report.error = Some(BatchError::LineCountMismatch {
                expected: positions.len(),
                actual: translated.len(),
            });
            return report;
        }

        for (&pos, text) in positions.iter().zip(translated) {
            entries[pos].text = text;
        }
        report.state = BatchState::Parsed;
        report
    }
}
