//! Contextual encoder: normalized text to a fixed-size `[CLS]` embedding.
//!
//! [`BertEncoder`] wraps a pretrained BERT checkpoint (candle) and its
//! `tokenizer.json`. Use [`EncoderConfig::stub`] for tests/examples without model
//! files. The orchestrator talks to encoders through [`TextEncoder`] so tests
//! can substitute a mock.

/// BERT backbone loading and `[CLS]` extraction.
pub mod bert;
/// Encoder configuration.
pub mod config;
/// Device selection (CPU / Metal / CUDA).
pub mod device;
mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
/// Tokenizer loading helpers.
pub mod utils;

#[cfg(test)]
mod tests;

pub use config::EncoderConfig;
pub use device::{DevicePreference, device_label, select_device};
pub use error::EncoderError;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockEncoder;

use candle_core::{DType, Device, Tensor};
use parking_lot::Mutex;
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use bert::BertBackbone;
use utils::load_tokenizer_for_encoding;

/// Turns text into embedding vectors of a fixed dimension.
pub trait TextEncoder: Send + Sync {
    /// Embeds one text.
    fn embed(&self, text: &str) -> Result<Vec<f32>, EncoderError>;

    /// Embeds several texts; output order matches input order.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EncoderError> {
        texts.iter().map(|text| self.embed(text)).collect()
    }

    /// Dimension of every vector this encoder returns.
    fn embedding_dim(&self) -> usize;

    /// Name/version of the underlying model.
    fn model_id(&self) -> &str;
}

enum EncoderBackend {
    Model {
        model: BertBackbone,
        tokenizer: Tokenizer,
        device: Device,
        // Serializes forward passes on accelerated devices; `None` on CPU.
        gate: Option<Mutex<()>>,
    },
    Stub {
        device: Device,
    },
}

/// BERT `[CLS]` encoder (supports stub mode).
pub struct BertEncoder {
    backend: EncoderBackend,
    config: EncoderConfig,
    embedding_dim: usize,
}

impl std::fmt::Debug for BertEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BertEncoder")
            .field(
                "backend",
                &match &self.backend {
                    EncoderBackend::Model { device, .. } => format!("Model({:?})", device),
                    EncoderBackend::Stub { device } => format!("Stub({:?})", device),
                },
            )
            .field("model_id", &self.config.model_id)
            .field("embedding_dim", &self.embedding_dim)
            .field("max_tokens", &self.config.max_tokens)
            .finish()
    }
}

impl BertEncoder {
    /// Loads the encoder from a config (stub mode is supported).
    ///
    /// Any failure here is fatal for the pipeline: there is no degraded mode.
    pub fn load(config: EncoderConfig) -> Result<Self, EncoderError> {
        config.validate()?;

        let device = select_device(config.device)?;
        debug!(?device, "Selected compute device for encoder");

        if config.testing_stub {
            warn!("Encoder running in STUB mode (testing only)");
            let embedding_dim = config.embedding_dim;
            return Ok(Self {
                backend: EncoderBackend::Stub { device },
                config,
                embedding_dim,
            });
        }

        info!(
            model_dir = %config.model_dir.display(),
            model_id = %config.model_id,
            "Loading encoder model"
        );

        let model = BertBackbone::load(&config.model_dir, &device).map_err(|e| {
            EncoderError::ModelLoadFailed {
                reason: format!("Failed to load BERT model: {}", e),
            }
        })?;

        if config.max_tokens > model.max_position_embeddings() {
            return Err(EncoderError::InvalidConfig {
                reason: format!(
                    "max_tokens ({}) exceeds model max_position_embeddings ({})",
                    config.max_tokens,
                    model.max_position_embeddings()
                ),
            });
        }

        let tokenizer = load_tokenizer_for_encoding(&config.tokenizer_path(), config.max_tokens)
            .map_err(|e| EncoderError::ModelLoadFailed {
                reason: format!("Failed to load tokenizer: {}", e),
            })?;

        let embedding_dim = model.hidden_size();
        let gate = (!device.is_cpu()).then(|| Mutex::new(()));

        info!(
            model_id = %config.model_id,
            device = device_label(&device),
            embedding_dim,
            max_tokens = config.max_tokens,
            "Encoder model loaded successfully"
        );

        Ok(Self {
            backend: EncoderBackend::Model {
                model,
                tokenizer,
                device,
                gate,
            },
            config,
            embedding_dim,
        })
    }

    /// Shorthand for `BertEncoder::load(EncoderConfig::stub())`.
    pub fn stub() -> Result<Self, EncoderError> {
        Self::load(EncoderConfig::stub())
    }

    fn embed_batch_with_model(
        &self,
        texts: &[&str],
        model: &BertBackbone,
        tokenizer: &Tokenizer,
        device: &Device,
        gate: Option<&Mutex<()>>,
    ) -> Result<Vec<Vec<f32>>, EncoderError> {
        let encodings = tokenizer.encode_batch(texts.to_vec(), true).map_err(|e| {
            EncoderError::TokenizationFailed {
                reason: e.to_string(),
            }
        })?;

        let batch_size = encodings.len();
        let seq_len = encodings.first().map(|e| e.get_ids().len()).unwrap_or(0);
        if seq_len == 0 {
            return Err(EncoderError::TokenizationFailed {
                reason: "tokenizer produced no tokens".to_string(),
            });
        }
        if let Some(bad) = encodings.iter().find(|e| e.get_ids().len() != seq_len) {
            return Err(EncoderError::TokenizationFailed {
                reason: format!(
                    "unpadded batch: expected {} tokens, got {}",
                    seq_len,
                    bad.get_ids().len()
                ),
            });
        }

        debug!(
            batch_size,
            token_count = seq_len,
            "Generating embeddings (transformer forward pass)"
        );

        let input_ids: Vec<u32> = encodings
            .iter()
            .flat_map(|e| e.get_ids().to_vec())
            .collect();
        let attention_mask: Vec<u32> = encodings
            .iter()
            .flat_map(|e| e.get_attention_mask().to_vec())
            .collect();
        let token_type_ids: Vec<u32> = encodings
            .iter()
            .flat_map(|e| e.get_type_ids().to_vec())
            .collect();

        let input_ids = Tensor::from_vec(input_ids, (batch_size, seq_len), device)?;
        let attention_mask = Tensor::from_vec(attention_mask, (batch_size, seq_len), device)?;
        let token_type_ids = Tensor::from_vec(token_type_ids, (batch_size, seq_len), device)?;

        let cls = {
            let _guard = gate.map(|g| g.lock());
            model
                .cls_embeddings(&input_ids, &token_type_ids, Some(&attention_mask))
                .map_err(|e| EncoderError::InferenceFailed {
                    reason: format!("Transformer forward pass failed: {}", e),
                })?
        };

        let embeddings = cls.to_dtype(DType::F32)?.to_vec2::<f32>().map_err(|e| {
            EncoderError::InferenceFailed {
                reason: format!("Failed to convert embeddings to vec: {}", e),
            }
        })?;

        Ok(embeddings)
    }

    /// Returns `true` if running in stub mode.
    pub fn is_stub(&self) -> bool {
        matches!(self.backend, EncoderBackend::Stub { .. })
    }

    /// Returns the device chosen at load time.
    pub fn device(&self) -> &Device {
        match &self.backend {
            EncoderBackend::Model { device, .. } | EncoderBackend::Stub { device } => device,
        }
    }

    /// Returns the encoder configuration.
    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }
}

impl TextEncoder for BertEncoder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EncoderError> {
        let mut batch = self.embed_batch(&[text])?;
        batch.pop().ok_or_else(|| EncoderError::InferenceFailed {
            reason: "encoder returned no embedding".to_string(),
        })
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EncoderError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        match &self.backend {
            EncoderBackend::Model {
                model,
                tokenizer,
                device,
                gate,
            } => self.embed_batch_with_model(texts, model, tokenizer, device, gate.as_ref()),
            EncoderBackend::Stub { .. } => Ok(texts
                .iter()
                .map(|text| stub_embedding(text, self.embedding_dim))
                .collect()),
        }
    }

    fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }

    fn model_id(&self) -> &str {
        &self.config.model_id
    }
}

/// Deterministic pseudo-embedding seeded from the text hash, values in `[-1, 1]`.
pub(crate) fn stub_embedding(text: &str, dim: usize) -> Vec<f32> {
    use std::hash::{DefaultHasher, Hash, Hasher};

    debug!(text_len = text.len(), "Generating stub embedding");

    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    let mut state = hasher.finish();

    let mut embedding = Vec::with_capacity(dim);
    for _ in 0..dim {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
        let value = ((state >> 32) as f32 / u32::MAX as f32) * 2.0 - 1.0;
        embedding.push(value);
    }
    embedding
}
