use anyhow::{Result, Context, anyhow};
use log::{error, warn, info, debug};
use std::path::{Path, PathBuf};
use indicatif::{ProgressBar, ProgressStyle};

use crate::app_config::{Config, Credentials};
use crate::file_utils::FileManager;
use crate::providers::LlmBackend;
use crate::subtitle_processor::SubtitleCollection;
use crate::translation::{LogEntry, RunLog, TranslationReport, TranslationService};

// @module: Application controller for subtitle translation

// @const: Issues log written next to the output
pub const ISSUES_LOG_FILE: &str = "subtranslate.issues.log";

/// Main application controller for subtitle translation
pub struct Controller {
    // @field: App configuration
    config: Config,

    // @field: Draw a progress bar while translating
    show_progress: bool,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            show_progress: true,
        }
    }

    /// Enable or disable the progress bar
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Translate one subtitle file with the backend the configured model selects
    ///
    /// Returns `None` when the output already exists and `force_overwrite` is off.
    pub async fn run(&self, input_file: PathBuf, output_file: Option<PathBuf>, force_overwrite: bool) -> Result<Option<TranslationReport>> {
        // Configuration problems surface here, before any file is touched
        let service = TranslationService::from_config(self.config.clone(), Credentials::env_lookup)?;
        info!("Using {} model {}", service.backend().family().display_name(), service.model());

        self.run_with_service(&service, input_file, output_file, force_overwrite).await
    }

    /// Translate one subtitle file with an already built service
    pub async fn run_with_service<B: LlmBackend>(
        &self,
        service: &TranslationService<B>,
        input_file: PathBuf,
        output_file: Option<PathBuf>,
        force_overwrite: bool,
    ) -> Result<Option<TranslationReport>> {
        let start_time = std::time::Instant::now();

        if !FileManager::file_exists(&input_file) {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        let output_path = output_file.unwrap_or_else(|| {
            FileManager::generate_output_path(&input_file, service.target_language())
        });
        if output_path.exists() && !force_overwrite {
            warn!("Skipping {:?}, translation already exists (use -f to force overwrite)", output_path);
            return Ok(None);
        }

        let mut subtitles = SubtitleCollection::from_srt_file(&input_file)?;
        info!("Loaded {} subtitle entries from {:?}", subtitles.entries.len(), input_file);

        let run_log = if self.show_progress { RunLog::captured() } else { RunLog::new() };
        let report = self.translate_with_progress(service, &mut subtitles, &run_log).await?;

        let output_dir = output_path.parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        self.report_issues(service, &run_log, &output_dir);

        subtitles.write_to_srt(&output_path)
            .with_context(|| format!("Failed to save translated subtitles to {:?}", output_path))?;

        let untranslated = report.untranslated_entries();
        if untranslated.is_empty() {
            info!("Translated {} entries in {}", report.translated_count(), Self::format_duration(start_time.elapsed()));
        } else {
            warn!(
                "Translated {} entries in {}, {} left in {}: {:?}",
                report.translated_count(),
                Self::format_duration(start_time.elapsed()),
                untranslated.len(),
                service.source_language(),
                untranslated
            );
        }
        info!("Saved translated subtitles to {:?}", output_path);

        Ok(Some(report))
    }

    async fn translate_with_progress<B: LlmBackend>(
        &self,
        service: &TranslationService<B>,
        subtitles: &mut SubtitleCollection,
        run_log: &RunLog,
    ) -> Result<TranslationReport> {
        let progress_bar = if self.show_progress {
            let progress_bar = ProgressBar::new(0);
            let template_result = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} batches ({percent}%) {msg} {eta}")
                .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
                .unwrap_or_else(|_| ProgressStyle::default_bar());
            progress_bar.set_style(template_result.progress_chars("█▓▒░"));
            progress_bar.set_message("Translating");
            progress_bar
        } else {
            ProgressBar::hidden()
        };

        let pb = progress_bar.clone();
        let report = service.translate_entries(&mut subtitles.entries, run_log, move |completed, total| {
            pb.set_length(total as u64);
            pb.set_position(completed as u64);
        }).await;

        progress_bar.finish_and_clear();
        let report = report?;

        // The bar owned the terminal; show what was captured meanwhile
        if self.show_progress {
            for entry in run_log.entries() {
                match entry.level {
                    log::Level::Error => error!("{}", entry.message),
                    log::Level::Warn => warn!("{}", entry.message),
                    log::Level::Info => info!("{}", entry.message),
                    _ => debug!("{}", entry.message),
                }
            }
        }

        if report.cooldowns > 0 {
            debug!("Took {} rate-limit pauses", report.cooldowns);
        }
        Ok(report)
    }

    /// Write warnings and errors of the run to the issues log
    fn report_issues<B: LlmBackend>(&self, service: &TranslationService<B>, run_log: &RunLog, output_dir: &Path) {
        let issues = run_log.issues();
        if issues.is_empty() {
            return;
        }

        let errors = issues.iter().filter(|entry| entry.level == log::Level::Error).count();
        info!("Translation completed with {} errors and {} warnings.", errors, issues.len() - errors);

        let log_file_path = output_dir.join(ISSUES_LOG_FILE);
        let context = format!("{} ({})", service.model(), chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
        match Self::write_logs_to_file(&issues, &log_file_path, &context) {
            Ok(()) => info!("Logs written to {:?}", log_file_path),
            Err(e) => warn!("Failed to write logs to file: {}", e),
        }
    }

    fn write_logs_to_file(logs: &[LogEntry], file_path: &Path, translation_context: &str) -> Result<()> {
        let mut log_content = String::new();

        log_content.push_str(&format!("Translation Log - {}\n", chrono::Local::now().format("%Y-%m-%d %H:%M:%S")));
        log_content.push_str(&format!("Context: {}\n\n", translation_context));

        for entry in logs {
            log_content.push_str(&format!("[{}] {}\n", entry.level, entry.message));
        }

        FileManager::write_to_file(file_path, &log_content)
    }

    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
