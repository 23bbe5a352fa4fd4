//! Cross-cutting, shared constants.
//!
//! # Dimension Invariants
//!
//! The embedding dimension is fixed by the encoder architecture and must equal the
//! input dimension the classifiers were trained on. The constant below is the
//! default for `bert-base-uncased`; the real value is read from the encoder's
//! `config.json` and checked with [`validate_embedding_dim`] when the pipeline is
//! assembled.

pub const DEFAULT_EMBEDDING_DIM: usize = 768;

/// Truncation length used when the classifiers were trained.
pub const DEFAULT_MAX_TOKENS: usize = 128;

pub const DEFAULT_ENCODER_MODEL_ID: &str = "bert-base-uncased";

/// Department assigned when classification fails.
pub const FALLBACK_DEPARTMENT: &str = "General Inquiry";

/// Priority assigned when classification fails.
pub const FALLBACK_PRIORITY: &str = "Medium";

pub const DEPARTMENT_MODEL_FILE: &str = "dept_model.safetensors";
pub const DEPARTMENT_ENCODER_FILE: &str = "dept_encoder.json";
pub const PRIORITY_MODEL_FILE: &str = "prio_model.safetensors";
pub const PRIORITY_ENCODER_FILE: &str = "prio_encoder.json";

/// Error returned when dimension validation fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DimValidationError {
    /// Embedding dimension cannot be zero.
    ZeroDimension,
    /// Runtime dimension does not match expected dimension.
    DimensionMismatch { expected: usize, actual: usize },
}

impl std::fmt::Display for DimValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroDimension => write!(f, "embedding dimension cannot be zero"),
            Self::DimensionMismatch { expected, actual } => {
                write!(
                    f,
                    "dimension mismatch: expected {}, got {}",
                    expected, actual
                )
            }
        }
    }
}

impl std::error::Error for DimValidationError {}

/// Validates that a runtime embedding dimension matches the expected dimension.
///
/// Use this at module boundaries to catch dimension mismatches early, rather than
/// producing silently wrong predictions deep in the pipeline.
///
/// # Example
///
/// ```
/// use triage::constants::{validate_embedding_dim, DEFAULT_EMBEDDING_DIM};
///
/// let encoder_dim = 768;
/// validate_embedding_dim(encoder_dim, DEFAULT_EMBEDDING_DIM).unwrap();
/// ```
pub fn validate_embedding_dim(actual: usize, expected: usize) -> Result<(), DimValidationError> {
    if expected == 0 || actual == 0 {
        return Err(DimValidationError::ZeroDimension);
    }
    if actual != expected {
        return Err(DimValidationError::DimensionMismatch { expected, actual });
    }
    Ok(())
}
