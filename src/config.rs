use crate::components::scanner::CaptureConstraints;
use crate::error::{config_error, env_error, AppResult};
use chrono_tz::Tz;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// Default chat-completions endpoint used for recognition
pub const DEFAULT_RECOGNIZER_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// Default vision model
pub const DEFAULT_RECOGNIZER_MODEL: &str = "gpt-4o";

/// Optional capture constraint overrides
pub const CAPTURE_CONFIG_PATH: &str = "config/capture.toml";

/// Settings for the external recognition service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognizerConfig {
    /// API key, only needed by commands that call the recognizer
    pub api_key: Option<String>,
    /// Chat-completions endpoint
    pub endpoint: String,
    /// Model name
    pub model: String,
    /// Upper bound for the reply length
    pub max_tokens: u32,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_RECOGNIZER_ENDPOINT.to_string(),
            model: DEFAULT_RECOGNIZER_MODEL.to_string(),
            max_tokens: 300,
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Timezone used to resolve dates and to write local calendar times
    pub timezone: String,
    /// Image file or directory the snapshot source samples from
    pub source_path: PathBuf,
    /// Directory exported calendar files are written to
    pub output_dir: PathBuf,
    /// Recognizer settings
    pub recognizer: RecognizerConfig,
    /// Constraints passed to the visual source on acquisition
    pub capture: CaptureConstraints,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
            source_path: PathBuf::from("snapshots"),
            output_dir: PathBuf::from("calendar"),
            recognizer: RecognizerConfig::default(),
            capture: CaptureConstraints::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment and config file
    pub fn load() -> AppResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let defaults = Config::default();

        let timezone = env::var("TIMEZONE").unwrap_or(defaults.timezone);
        let source_path = env::var("SNAPCAL_SOURCE")
            .map(PathBuf::from)
            .unwrap_or(defaults.source_path);
        let output_dir = env::var("SNAPCAL_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.output_dir);

        let endpoint = env::var("OPENAI_ENDPOINT").unwrap_or(defaults.recognizer.endpoint);
        Url::parse(&endpoint)
            .map_err(|e| config_error(&format!("Invalid OPENAI_ENDPOINT '{}': {}", endpoint, e)))?;

        let recognizer = RecognizerConfig {
            api_key: env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()),
            endpoint,
            model: env::var("OPENAI_MODEL").unwrap_or(defaults.recognizer.model),
            max_tokens: defaults.recognizer.max_tokens,
        };

        let capture = Self::load_capture(Path::new(CAPTURE_CONFIG_PATH))?
            .unwrap_or(defaults.capture);

        let config = Config {
            timezone,
            source_path,
            output_dir,
            recognizer,
            capture,
        };

        // Fail early on a bad timezone name
        config.tz()?;

        Ok(config)
    }

    /// Read capture constraints from a TOML file if it exists
    pub fn load_capture(path: &Path) -> AppResult<Option<CaptureConstraints>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)?;
        let capture = toml::from_str::<CaptureConstraints>(&content)?;
        Ok(Some(capture))
    }

    /// Parsed timezone
    pub fn tz(&self) -> AppResult<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| config_error(&format!("Invalid TIMEZONE '{}': {}", self.timezone, e)))
    }

    /// API key for the recognizer
    pub fn recognizer_api_key(&self) -> AppResult<&str> {
        self.recognizer
            .api_key
            .as_deref()
            .ok_or_else(|| env_error("OPENAI_API_KEY"))
    }
}
