use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("classifier artifact not found at path: {path}")]
    ArtifactNotFound { path: PathBuf },

    #[error("failed to load classifier artifact {path}: {reason}")]
    ArtifactLoadFailed { path: PathBuf, reason: String },

    #[error("invalid classifier artifact: {reason}")]
    InvalidArtifact { reason: String },

    #[error("label encoder was fitted for encoder '{expected}', but the pipeline uses '{actual}'")]
    SourceModelMismatch { expected: String, actual: String },

    #[error("embedding has {actual} dimensions, classifier expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("classifier produced non-finite scores")]
    NonFiniteScores,

    #[error("class index {index} is outside the label space of {len} labels")]
    LabelOutOfRange { index: usize, len: usize },

    #[error("classifier computation failed: {reason}")]
    ComputationFailed { reason: String },
}

impl From<candle_core::Error> for ClassifierError {
    fn from(err: candle_core::Error) -> Self {
        ClassifierError::ComputationFailed {
            reason: err.to_string(),
        }
    }
}
