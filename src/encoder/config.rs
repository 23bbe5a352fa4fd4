use std::path::PathBuf;

use crate::constants::{DEFAULT_EMBEDDING_DIM, DEFAULT_ENCODER_MODEL_ID, DEFAULT_MAX_TOKENS};

use super::device::DevicePreference;
use super::error::EncoderError;

#[derive(Debug, Clone)]
/// Configuration for [`BertEncoder`](super::BertEncoder).
pub struct EncoderConfig {
    /// Directory with `config.json`, `model.safetensors` and `tokenizer.json`.
    pub model_dir: PathBuf,
    /// Name/version of the pretrained model, recorded in logs and checked
    /// against classifier artifacts.
    pub model_id: String,
    /// Tokenizer truncation length.
    pub max_tokens: usize,
    /// Compute device preference.
    pub device: DevicePreference,
    /// Output dimension in stub mode. Ignored when a model is loaded (the
    /// model's `hidden_size` wins).
    pub embedding_dim: usize,
    /// If true, run in deterministic stub mode (no model files required).
    pub testing_stub: bool,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::new(),
            model_id: DEFAULT_ENCODER_MODEL_ID.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            device: DevicePreference::Auto,
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            testing_stub: false,
        }
    }
}

impl EncoderConfig {
    pub const CONFIG_FILE: &'static str = "config.json";
    pub const WEIGHTS_FILE: &'static str = "model.safetensors";
    pub const TOKENIZER_FILE: &'static str = "tokenizer.json";

    /// Creates a config for an encoder directory.
    pub fn new<P: Into<PathBuf>>(model_dir: P) -> Self {
        Self {
            model_dir: model_dir.into(),
            ..Default::default()
        }
    }

    /// Creates a stub config (no model files; produces deterministic embeddings).
    pub fn stub() -> Self {
        Self {
            testing_stub: true,
            ..Default::default()
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_device(mut self, device: DevicePreference) -> Self {
        self.device = device;
        self
    }

    pub fn with_embedding_dim(mut self, embedding_dim: usize) -> Self {
        self.embedding_dim = embedding_dim;
        self
    }

    pub fn config_path(&self) -> PathBuf {
        self.model_dir.join(Self::CONFIG_FILE)
    }

    pub fn weights_path(&self) -> PathBuf {
        self.model_dir.join(Self::WEIGHTS_FILE)
    }

    pub fn tokenizer_path(&self) -> PathBuf {
        self.model_dir.join(Self::TOKENIZER_FILE)
    }

    /// Validates required fields and, outside stub mode, that every artifact exists.
    pub fn validate(&self) -> Result<(), EncoderError> {
        if self.max_tokens < 2 {
            return Err(EncoderError::InvalidConfig {
                reason: format!(
                    "max_tokens must leave room for [CLS] and [SEP], got {}",
                    self.max_tokens
                ),
            });
        }

        if self.testing_stub {
            if self.embedding_dim == 0 {
                return Err(EncoderError::InvalidConfig {
                    reason: "embedding_dim cannot be zero".to_string(),
                });
            }
            return Ok(());
        }

        if self.model_dir.as_os_str().is_empty() {
            return Err(EncoderError::InvalidConfig {
                reason: "model_dir is required (stubbing is disabled)".to_string(),
            });
        }

        for path in [
            self.model_dir.clone(),
            self.config_path(),
            self.weights_path(),
            self.tokenizer_path(),
        ] {
            if !path.exists() {
                return Err(EncoderError::ModelNotFound { path });
            }
        }

        Ok(())
    }
}
