use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Camera config
    #[serde(default)]
    pub camera: CameraConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Name of the single environment variable that supplies the API key
pub const API_KEY_ENV: &str = "SNAPTRAD_API_KEY";

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "snaptrad.json";

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    // @provider: Google Gemini generateContent REST API
    #[default]
    Gemini,
    // @provider: OpenAI chat completions (or any compatible server)
    OpenAI,
    // @provider: Anthropic messages API
    Anthropic,
}

impl TranslationProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Gemini => "Gemini",
            Self::OpenAI => "OpenAI",
            Self::Anthropic => "Anthropic",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Gemini => "gemini".to_string(),
            Self::OpenAI => "openai".to_string(),
            Self::Anthropic => "anthropic".to_string(),
        }
    }

    // @returns: Model used when none is configured
    pub fn default_model(&self) -> String {
        match self {
            Self::Gemini => "gemini-flash-latest".to_string(),
            Self::OpenAI => "gpt-4o-mini".to_string(),
            Self::Anthropic => "claude-3-5-haiku-latest".to_string(),
        }
    }

    // @returns: Endpoint used when none is configured
    pub fn default_endpoint(&self) -> String {
        match self {
            Self::Gemini => "https://generativelanguage.googleapis.com".to_string(),
            Self::OpenAI => "https://api.openai.com/v1".to_string(),
            Self::Anthropic => "https://api.anthropic.com".to_string(),
        }
    }
}

// Implement Display trait for TranslationProvider
impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

// Implement FromStr trait for TranslationProvider
impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAI),
            "anthropic" => Ok(Self::Anthropic),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Translation provider to use
    #[serde(default)]
    pub provider: TranslationProvider,

    /// API key for the provider; empty means not configured
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Model name; empty selects the provider default
    #[serde(default = "String::new")]
    pub model: String,

    /// Service URL; empty selects the provider default
    #[serde(default = "String::new")]
    pub endpoint: String,

    /// Upper bound for one translation request, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Instruction sent along with every image
    #[serde(default = "default_instruction")]
    pub instruction: String,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: TranslationProvider::default(),
            api_key: String::new(),
            model: String::new(),
            endpoint: String::new(),
            timeout_secs: default_timeout_secs(),
            instruction: default_instruction(),
        }
    }
}

impl TranslationConfig {
    /// Get the model for the active provider
    pub fn get_model(&self) -> String {
        if !self.model.trim().is_empty() {
            return self.model.trim().to_string();
        }
        self.provider.default_model()
    }

    /// Get the endpoint for the active provider
    pub fn get_endpoint(&self) -> String {
        if !self.endpoint.trim().is_empty() {
            return self.endpoint.trim().trim_end_matches('/').to_string();
        }
        self.provider.default_endpoint()
    }

    /// Get the API key, or `None` when it is blank
    pub fn get_api_key(&self) -> Option<String> {
        let key = self.api_key.trim();
        if key.is_empty() {
            None
        } else {
            Some(key.to_string())
        }
    }
}

/// Camera device configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CameraConfig {
    /// ffmpeg executable used to read the device
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,

    /// ffmpeg input format (demuxer) for the device
    #[serde(default = "default_input_format")]
    pub input_format: String,

    /// Device for the rear/environment-facing camera
    #[serde(default = "default_environment_device")]
    pub environment_device: String,

    /// Device for the front/user-facing camera
    #[serde(default = "default_user_device")]
    pub user_device: String,

    /// Frame width in pixels
    #[serde(default = "default_width")]
    pub width: u32,

    /// Frame height in pixels
    #[serde(default = "default_height")]
    pub height: u32,

    /// JPEG quality used for snapshots (1-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// Seconds to wait for the first frame after opening the device
    #[serde(default = "default_startup_timeout_secs")]
    pub startup_timeout_secs: u64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            input_format: default_input_format(),
            environment_device: default_environment_device(),
            user_device: default_user_device(),
            width: default_width(),
            height: default_height(),
            jpeg_quality: default_jpeg_quality(),
            startup_timeout_secs: default_startup_timeout_secs(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_instruction() -> String {
    "Você é um tradutor técnico de engenharia. Identifique o texto nesta imagem e traduza-o para o Português do Brasil, mantendo os termos técnicos da área.".to_string()
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_input_format() -> String {
    "video4linux2".to_string()
}

fn default_environment_device() -> String {
    "/dev/video0".to_string()
}

fn default_user_device() -> String {
    "/dev/video1".to_string()
}

fn default_width() -> u32 {
    1280
}

fn default_height() -> u32 {
    720
}

fn default_jpeg_quality() -> u8 {
    90
}

fn default_startup_timeout_secs() -> u64 {
    10
}

impl Config {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Write configuration as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let config_json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))?;
        Ok(())
    }

    /// Resolve the config path: an explicit path wins, then the working directory,
    /// then the user configuration directory
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        let local = PathBuf::from(DEFAULT_CONFIG_FILE);
        if local.exists() {
            return local;
        }
        match dirs::config_dir() {
            Some(dir) => {
                let candidate = dir.join("snaptrad").join(DEFAULT_CONFIG_FILE);
                if candidate.exists() { candidate } else { local }
            }
            None => local,
        }
    }

    /// Validate the configuration for consistency and required values
    ///
    /// A missing API key is not a configuration error: it is reported when
    /// a translation is submitted.
    pub fn validate(&self) -> Result<()> {
        if self.translation.timeout_secs == 0 {
            return Err(anyhow!("translation.timeout_secs must be greater than zero"));
        }

        if self.translation.instruction.trim().is_empty() {
            return Err(anyhow!("translation.instruction must not be empty"));
        }

        let endpoint = self.translation.get_endpoint();
        url::Url::parse(&endpoint)
            .with_context(|| format!("Invalid translation endpoint URL: {}", endpoint))?;

        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(anyhow!("camera.width and camera.height must be greater than zero"));
        }

        if !(1..=100).contains(&self.camera.jpeg_quality) {
            return Err(anyhow!(
                "camera.jpeg_quality must be between 1 and 100, got {}",
                self.camera.jpeg_quality
            ));
        }

        Ok(())
    }
}
