// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::{Path, PathBuf};

use snaptrad::app_config::{self, Config, TranslationProvider, API_KEY_ENV};
use snaptrad::console;
use snaptrad::CaptureController;

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    Gemini,
    #[value(name = "openai")]
    OpenAI,
    Anthropic,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::Gemini => TranslationProvider::Gemini,
            CliTranslationProvider::OpenAI => TranslationProvider::OpenAI,
            CliTranslationProvider::Anthropic => TranslationProvider::Anthropic,
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
    /// Interactive capture and translation (default command)
    Shell,

    /// Translate a single image file and print the result
    Translate {
        /// Image file to translate
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Generate shell completions for snaptrad
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// SnapTrad - photo-to-translation assistant
///
/// Takes a photo of technical text, from the camera or an image file, and
/// translates it into Brazilian Portuguese with a multimodal model.
#[derive(Parser, Debug)]
#[command(name = "snaptrad")]
#[command(version)]
#[command(about = "Photo-to-translation assistant for engineering text")]
#[command(long_about = "SnapTrad captures an image of technical text and asks a multimodal model to translate it.

EXAMPLES:
    snaptrad                                   # Interactive shell
    snaptrad translate placa.jpg               # Translate one image file
    snaptrad -p openai -m gpt-4o translate x.png
    snaptrad --log-level debug                 # Shell with debug logging
    snaptrad completions bash > snaptrad.bash  # Generate bash completions

CONFIGURATION:
    Configuration is read from snaptrad.json in the working directory, then
    from the user configuration directory. A default file is created when
    none exists. The API key may also come from the SNAPTRAD_API_KEY
    environment variable.

SUPPORTED PROVIDERS:
    gemini    - Google Gemini (default: gemini-flash-latest)
    openai    - OpenAI or a compatible server (default: gpt-4o-mini)
    anthropic - Anthropic Claude (default: claude-3-5-haiku-latest)")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config_path: Option<PathBuf>,

    /// Translation provider to use
    #[arg(short, long, value_enum, global = true)]
    provider: Option<CliTranslationProvider>,

    /// Model name to use for translation
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// API key for the provider
    #[arg(long, env = API_KEY_ENV, hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Upper bound for one translation request, in seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
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
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
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
            let color = Self::color_for_level(record.level());
            let _ = writeln!(
                std::io::stderr(),
                "{}{} {:<5} {}\x1B[0m",
                color,
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Start permissive; the configured level is applied once the config is read
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Some(Commands::Completions { shell }) = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "snaptrad", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(&cli)?;
    let mut controller = CaptureController::from_config(&config)?;

    match cli.command {
        Some(Commands::Translate { file }) => run_translate(&mut controller, &file).await,
        Some(Commands::Shell) | None => run_shell(&mut controller).await,
        Some(Commands::Completions { .. }) => Ok(()),
    }
}

/// Load or create the configuration, then apply command line overrides
fn load_config(cli: &CommandLineOptions) -> Result<Config> {
    if let Some(cmd_log_level) = &cli.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let config_path = Config::resolve_path(cli.config_path.as_deref());
    let mut config = if config_path.exists() {
        Config::load(&config_path)?
    } else {
        warn!(
            "Config file not found at '{}', creating default config.",
            config_path.display()
        );
        let config = Config::default();
        create_parent_dir(&config_path)?;
        config.save(&config_path)?;
        config
    };

    if let Some(provider) = &cli.provider {
        config.translation.provider = provider.clone().into();
    }
    if let Some(model) = &cli.model {
        config.translation.model = model.clone();
    }
    if let Some(api_key) = &cli.api_key {
        config.translation.api_key = api_key.clone();
    }
    if let Some(timeout_secs) = cli.timeout_secs {
        config.translation.timeout_secs = timeout_secs;
    }
    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;

    log::set_max_level(config.log_level.to_level_filter());

    if config.translation.get_api_key().is_none() {
        warn!(
            "No API key configured; set {} or translation.api_key in {}",
            API_KEY_ENV,
            config_path.display()
        );
    }

    Ok(config)
}

fn create_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    Ok(())
}

async fn run_translate(controller: &mut CaptureController, file: &Path) -> Result<()> {
    let text = controller.translate_file(file).await.map_err(|e| match e {
        snaptrad::AppError::Session(error) => anyhow::anyhow!(error.user_message()),
        other => anyhow::anyhow!(other),
    })?;
    println!("{}", text);
    Ok(())
}

async fn run_shell(controller: &mut CaptureController) -> Result<()> {
    info!("Type 'help' for the list of commands");
    let input = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    console::run_shell(controller, input, &mut stdout).await
}
