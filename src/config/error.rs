//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `TRIAGE_MAX_TOKENS` could not be parsed as a number.
    #[error("failed to parse max tokens '{value}': {source}")]
    MaxTokensParseError {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// Max tokens must be at least 2 (room for the special tokens).
    #[error("invalid max tokens '{value}': must be at least 2")]
    InvalidMaxTokens { value: usize },

    /// `TRIAGE_PREDICT_TIMEOUT_MS` could not be parsed as a number.
    #[error("failed to parse prediction timeout '{value}': {source}")]
    TimeoutParseError {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// Device preference was not one of `auto`, `cpu`, `cuda`, `metal`.
    #[error("invalid device '{value}': expected one of auto, cpu, cuda, metal")]
    InvalidDevice { value: String },

    /// Specified path does not exist on the filesystem.
    #[error("path does not exist: {path}")]
    PathNotFound { path: PathBuf },

    /// Path exists but is not a file (when a file was expected).
    #[error("path is not a file: {path}")]
    NotAFile { path: PathBuf },

    /// Path exists but is not a directory (when a directory was expected).
    #[error("path is not a directory: {path}")]
    NotADirectory { path: PathBuf },
}
