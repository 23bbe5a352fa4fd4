use thiserror::Error;

use crate::classifier::{Category, ClassifierError};
use crate::config::ConfigError;
use crate::encoder::EncoderError;

/// Startup failure. The pipeline has no degraded mode, so callers abort on these.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("encoder error: {0}")]
    Encoder(#[from] EncoderError),

    #[error("{category} classifier error: {source}")]
    Classifier {
        category: Category,
        #[source]
        source: ClassifierError,
    },

    #[error("{category} classifier expects {expected}-dim embeddings, encoder produces {actual}")]
    DimensionMismatch {
        category: Category,
        expected: usize,
        actual: usize,
    },
}

/// Per-request failure. Converted into the fallback result by `Predictor::predict`.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("complaint text is empty after normalization")]
    EmptyInput,

    #[error("embedding failed: {0}")]
    Encoding(#[from] EncoderError),

    #[error("{category} classification failed: {source}")]
    Classification {
        category: Category,
        #[source]
        source: ClassifierError,
    },
}
