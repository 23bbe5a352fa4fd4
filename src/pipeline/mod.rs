//! Prediction orchestrator: normalize, embed, classify, then apply the fallback policy.
//!
//! Every stage returns its own `Result`; [`Predictor::predict`] merges them into
//! [`PredictError`] and turns any failure into [`PredictionResult::fallback`].
//! Use [`Predictor::try_predict`] to see the typed error instead.

pub mod error;
pub mod predictor;
pub mod types;


pub use error::{PipelineError, PredictError};
pub use predictor::Predictor;
pub use types::{Categories, Prediction, PredictionResult};
