//! Triage library crate (used by the `triage` binary and integration tests).
//!
//! Classifies free-text customer complaints into a department and a priority:
//! text normalization, a BERT `[CLS]` embedding, two linear classifiers, and a
//! fallback policy that always yields an answer.
//!
//! # Public API Surface
//!
//! ## Core Types
//! - [`TriageConfig`], [`ConfigError`] - Environment-backed configuration
//! - [`Predictor`], [`PredictionResult`], [`Categories`] - The prediction pipeline
//! - [`PredictionService`] - Async façade over the blocking pipeline
//!
//! ## Stages
//! - [`normalize`] - Training/serving text cleanup
//! - [`BertEncoder`], [`EncoderConfig`], [`TextEncoder`] - Embedding generation
//! - [`CategoryClassifier`], [`LinearModel`], [`LabelEncoder`] - Classification
//!
//! ## Test/Mock Support
//! [`MockEncoder`] is available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod classifier;
pub mod config;
pub mod constants;
pub mod encoder;
pub mod normalize;
pub mod pipeline;
pub mod service;

pub use classifier::{Category, CategoryClassifier, ClassifierError, LabelEncoder, LinearModel};
pub use config::{ConfigError, TriageConfig};
pub use constants::{
    DEFAULT_EMBEDDING_DIM, DEFAULT_ENCODER_MODEL_ID, DEFAULT_MAX_TOKENS, DimValidationError,
    FALLBACK_DEPARTMENT, FALLBACK_PRIORITY, validate_embedding_dim,
};
pub use encoder::{BertEncoder, DevicePreference, EncoderConfig, EncoderError, TextEncoder};
pub use normalize::normalize;
pub use pipeline::{
    Categories, PipelineError, PredictError, Prediction, PredictionResult, Predictor,
};
pub use service::PredictionService;

#[cfg(any(test, feature = "mock"))]
pub use encoder::MockEncoder;
