// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow};
use log::{error, info, debug, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::path::PathBuf;
use std::io::Write;
use clap::{Parser, ValueEnum, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use subtranslate::app_config::{self, Config, Credentials};
use subtranslate::app_controller::Controller;
use subtranslate::errors::TranslationError;
use subtranslate::translation::PromptEncoding;

/// CLI Wrapper for PromptEncoding to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliEncoding {
    Numbered,
    Separator,
}

impl From<CliEncoding> for PromptEncoding {
    fn from(cli_encoding: CliEncoding) -> Self {
        match cli_encoding {
            CliEncoding::Numbered => PromptEncoding::Numbered,
            CliEncoding::Separator => PromptEncoding::Separator,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate shell completions for subtranslate
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// subtranslate - translate SRT subtitles with LLMs
///
/// Sends the subtitles in batches to an OpenAI or Gemini model and writes
/// the translated file next to the input.
#[derive(Parser, Debug)]
#[command(name = "subtranslate")]
#[command(version = "0.1.0")]
#[command(about = "Translate SRT subtitles with LLMs")]
#[command(args_conflicts_with_subcommands = true)]
#[command(long_about = "subtranslate sends SRT subtitles in batches to an LLM and writes the translation next to the input.

EXAMPLES:
    subtranslate -m gpt-4o-mini movie.srt               # English to Persian (defaults)
    subtranslate -m gemini-2.0-flash -t fr movie.srt    # Translate to French
    subtranslate -m gemma-3-27b-it -e separator movie.srt
    subtranslate -f -b 100 -m gpt-4o movie.srt          # Smaller batches, overwrite output
    subtranslate completions bash > subtranslate.bash   # Generate bash completions

CREDENTIALS:
    gpt models         OPENAI_API_KEY and OPENAPI_BASE_URL
    gemini/gemma       GOOGLE_API_KEY (GEMINI_BASE_URL optional)
    Variables may also come from a .env file in the working directory.

CONFIGURATION:
    Options may be stored in conf.json (or the file given with --config).
    Command line flags override values from the file.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// SRT file to translate
    #[arg(value_name = "FILE")]
    input_file: Option<PathBuf>,

    /// Source language name or code (e.g. 'English', 'en')
    #[arg(short, long = "source")]
    source_language: Option<String>,

    /// Target language name or code (e.g. 'Persian', 'fa')
    #[arg(short, long = "target")]
    target_language: Option<String>,

    /// Model name; selects the backend
    #[arg(short, long = "model-name", env = "SUBTRANSLATE_MODEL")]
    model: Option<String>,

    /// Subtitle entries per request
    #[arg(short, long)]
    batch_size: Option<usize>,

    /// Batches between two cooldown pauses
    #[arg(long)]
    rpm_limit: Option<usize>,

    /// Length of a cooldown pause in seconds
    #[arg(long)]
    cooldown_secs: Option<u64>,

    /// How lines are framed in the prompt
    #[arg(short, long, value_enum)]
    encoding: Option<CliEncoding>,

    /// Embed few-shot examples in every prompt
    #[arg(long)]
    few_shot: bool,

    /// Output file (default: <stem>_<target>.<ext> next to the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Configuration file path
    #[arg(short, long = "config", default_value = "conf.json")]
    config_path: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

impl CommandLineOptions {
    /// Apply command line overrides on top of the file configuration
    fn apply_to(&self, config: &mut Config) {
        if let Some(source) = &self.source_language {
            config.source_language = source.clone();
        }
        if let Some(target) = &self.target_language {
            config.target_language = target.clone();
        }
        if let Some(model) = &self.model {
            config.model = Some(model.clone());
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(rpm_limit) = self.rpm_limit {
            config.rpm_limit = rpm_limit;
        }
        if let Some(cooldown_secs) = self.cooldown_secs {
            config.cooldown_secs = cooldown_secs;
        }
        if let Some(encoding) = &self.encoding {
            config.encoding = encoding.clone().into();
        }
        if self.few_shot {
            config.few_shot = true;
        }
        if let Some(log_level) = &self.log_level {
            config.log_level = log_level.clone().into();
        }
    }
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger::new(level)))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji and ANSI colour for log level
    fn decoration(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("❌ ", "1;31"),
            Level::Warn => ("🚧 ", "1;33"),
            Level::Info => (" ", "1;32"),
            Level::Debug => ("🔍 ", "1;36"),
            Level::Trace => ("📋 ", "1;35"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (emoji, colour) = Self::decoration(record.level());
            let _ = writeln!(
                std::io::stderr(),
                "\x1B[{}m{} {} {}\x1B[0m",
                colour, now, emoji, record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Accept everything here; the effective level is set once the config is known
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Some(Commands::Completions { shell }) = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "subtranslate", &mut std::io::stdout());
        return Ok(());
    }

    if let Err(e) = run_translate(cli).await {
        error!("{:#}", e);
        let code = if e.downcast_ref::<TranslationError>().is_some() { 2 } else { 1 };
        std::process::exit(code);
    }
    Ok(())
}

async fn run_translate(options: CommandLineOptions) -> Result<()> {
    let input_file = options.input_file.clone()
        .ok_or_else(|| anyhow!("FILE is required when no subcommand is specified"))?;

    let mut config = Config::load_or_default(&options.config_path)?;
    options.apply_to(&mut config);
    log::set_max_level(config.log_level.to_level_filter());
    debug!("Effective configuration: {:?}", config);

    Credentials::load_dotenv();

    let controller = Controller::with_config(config);
    match controller.run(input_file, options.output.clone(), options.force_overwrite).await? {
        Some(report) if !report.is_complete() => {
            info!("{} batches failed; see the issues log for details", report.failed_batches().len());
        }
        _ => {}
    }

    Ok(())
}
