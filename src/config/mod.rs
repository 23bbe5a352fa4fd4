//! Environment-backed configuration.
//!
//! Most settings have defaults. Override with `TRIAGE_*` environment variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{
    DEFAULT_ENCODER_MODEL_ID, DEFAULT_MAX_TOKENS, DEPARTMENT_ENCODER_FILE, DEPARTMENT_MODEL_FILE,
    PRIORITY_ENCODER_FILE, PRIORITY_MODEL_FILE,
};
use crate::encoder::{DevicePreference, EncoderConfig};

/// Pipeline configuration loaded from environment variables.
///
/// Use [`TriageConfig::from_env`] to read `TRIAGE_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct TriageConfig {
    /// Directory holding the four classifier artifacts. Default: `./models`.
    pub models_dir: PathBuf,

    /// Encoder directory (`config.json`, `model.safetensors`, `tokenizer.json`).
    /// Default: `<models_dir>/bert-base-uncased`.
    pub encoder_path: PathBuf,

    /// Name/version of the pretrained encoder. Default: `bert-base-uncased`.
    pub encoder_model_id: String,

    /// Tokenizer truncation length. Default: `128`.
    pub max_tokens: usize,

    /// Compute device preference. Default: `auto`.
    pub device: DevicePreference,

    /// Caller-side timeout applied by [`PredictionService`](crate::service::PredictionService).
    pub predict_timeout: Option<Duration>,

    /// Run the encoder in deterministic stub mode (no encoder files required).
    pub encoder_stub: bool,
}

impl Default for TriageConfig {
    fn default() -> Self {
        let models_dir = PathBuf::from("./models");
        let encoder_path = models_dir.join(DEFAULT_ENCODER_MODEL_ID);
        Self {
            models_dir,
            encoder_path,
            encoder_model_id: DEFAULT_ENCODER_MODEL_ID.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            device: DevicePreference::Auto,
            predict_timeout: None,
            encoder_stub: false,
        }
    }
}

impl TriageConfig {
    const ENV_MODELS_DIR: &'static str = "TRIAGE_MODELS_DIR";
    const ENV_ENCODER_PATH: &'static str = "TRIAGE_ENCODER_PATH";
    const ENV_ENCODER_MODEL_ID: &'static str = "TRIAGE_ENCODER_MODEL_ID";
    const ENV_MAX_TOKENS: &'static str = "TRIAGE_MAX_TOKENS";
    const ENV_DEVICE: &'static str = "TRIAGE_DEVICE";
    const ENV_PREDICT_TIMEOUT_MS: &'static str = "TRIAGE_PREDICT_TIMEOUT_MS";
    const ENV_ENCODER_STUB: &'static str = "TRIAGE_ENCODER_STUB";

    /// Creates a config rooted at `models_dir`, with the encoder directory inside it.
    pub fn new<P: Into<PathBuf>>(models_dir: P) -> Self {
        let models_dir = models_dir.into();
        let encoder_path = models_dir.join(DEFAULT_ENCODER_MODEL_ID);
        Self {
            models_dir,
            encoder_path,
            ..Default::default()
        }
    }

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let models_dir = Self::parse_path_from_env(Self::ENV_MODELS_DIR, defaults.models_dir);
        let encoder_path = Self::parse_optional_path_from_env(Self::ENV_ENCODER_PATH)
            .unwrap_or_else(|| models_dir.join(DEFAULT_ENCODER_MODEL_ID));
        let encoder_model_id =
            Self::parse_string_from_env(Self::ENV_ENCODER_MODEL_ID, defaults.encoder_model_id);
        let max_tokens = Self::parse_max_tokens_from_env(defaults.max_tokens)?;
        let device = Self::parse_device_from_env(defaults.device)?;
        let predict_timeout = Self::parse_timeout_from_env()?;
        let encoder_stub = Self::parse_bool_from_env(Self::ENV_ENCODER_STUB);

        Ok(Self {
            models_dir,
            encoder_path,
            encoder_model_id,
            max_tokens,
            device,
            predict_timeout,
            encoder_stub,
        })
    }

    /// Validates paths and basic invariants (does not load anything).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_tokens < 2 {
            return Err(ConfigError::InvalidMaxTokens {
                value: self.max_tokens,
            });
        }

        Self::require_dir(&self.models_dir)?;
        for path in [
            self.department_model_path(),
            self.department_encoder_path(),
            self.priority_model_path(),
            self.priority_encoder_path(),
        ] {
            Self::require_file(&path)?;
        }

        if !self.encoder_stub {
            Self::require_dir(&self.encoder_path)?;
        }

        Ok(())
    }

    pub fn department_model_path(&self) -> PathBuf {
        self.models_dir.join(DEPARTMENT_MODEL_FILE)
    }

    pub fn department_encoder_path(&self) -> PathBuf {
        self.models_dir.join(DEPARTMENT_ENCODER_FILE)
    }

    pub fn priority_model_path(&self) -> PathBuf {
        self.models_dir.join(PRIORITY_MODEL_FILE)
    }

    pub fn priority_encoder_path(&self) -> PathBuf {
        self.models_dir.join(PRIORITY_ENCODER_FILE)
    }

    /// Builds the encoder configuration implied by these settings.
    pub fn encoder_config(&self) -> EncoderConfig {
        let base = if self.encoder_stub {
            EncoderConfig::stub()
        } else {
            EncoderConfig::new(self.encoder_path.clone())
        };

        EncoderConfig {
            model_id: self.encoder_model_id.clone(),
            max_tokens: self.max_tokens,
            device: self.device,
            ..base
        }
    }

    fn require_dir(path: &Path) -> Result<(), ConfigError> {
        if !path.exists() {
            return Err(ConfigError::PathNotFound {
                path: path.to_path_buf(),
            });
        }
        if !path.is_dir() {
            return Err(ConfigError::NotADirectory {
                path: path.to_path_buf(),
            });
        }
        Ok(())
    }

    fn require_file(path: &Path) -> Result<(), ConfigError> {
        if !path.exists() {
            return Err(ConfigError::PathNotFound {
                path: path.to_path_buf(),
            });
        }
        if !path.is_file() {
            return Err(ConfigError::NotAFile {
                path: path.to_path_buf(),
            });
        }
        Ok(())
    }

    fn parse_max_tokens_from_env(default: usize) -> Result<usize, ConfigError> {
        match env::var(Self::ENV_MAX_TOKENS) {
            Ok(value) => {
                let max_tokens: usize =
                    value
                        .trim()
                        .parse()
                        .map_err(|e| ConfigError::MaxTokensParseError {
                            value: value.clone(),
                            source: e,
                        })?;

                if max_tokens < 2 {
                    return Err(ConfigError::InvalidMaxTokens { value: max_tokens });
                }

                Ok(max_tokens)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_device_from_env(default: DevicePreference) -> Result<DevicePreference, ConfigError> {
        match env::var(Self::ENV_DEVICE) {
            Ok(value) => DevicePreference::parse(&value)
                .ok_or(ConfigError::InvalidDevice { value }),
            Err(_) => Ok(default),
        }
    }

    fn parse_timeout_from_env() -> Result<Option<Duration>, ConfigError> {
        match env::var(Self::ENV_PREDICT_TIMEOUT_MS) {
            Ok(value) if !value.trim().is_empty() => {
                let millis: u64 =
                    value
                        .trim()
                        .parse()
                        .map_err(|e| ConfigError::TimeoutParseError {
                            value: value.clone(),
                            source: e,
                        })?;
                Ok(Some(Duration::from_millis(millis)))
            }
            _ => Ok(None),
        }
    }

    fn parse_path_from_env(var_name: &str, default: PathBuf) -> PathBuf {
        Self::parse_optional_path_from_env(var_name).unwrap_or(default)
    }

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(default)
    }

    fn parse_bool_from_env(var_name: &str) -> bool {
        env::var(var_name)
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false)
    }
}
