//! Async façade over the blocking [`Predictor`].
//!
//! Inference is CPU/GPU bound, so each request runs on tokio's blocking pool.
//! An elapsed timeout or a panicked worker still yields a [`PredictionResult`]
//! (the fallback); the blocking work itself runs to completion.


use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::TriageConfig;
use crate::encoder::{BertEncoder, TextEncoder};
use crate::pipeline::{Categories, PipelineError, PredictionResult, Predictor};

fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Cloneable handle for serving predictions from async code.
#[derive(Debug)]
pub struct PredictionService<E: TextEncoder = BertEncoder> {
    predictor: Arc<Predictor<E>>,
    timeout: Option<Duration>,
}

impl<E: TextEncoder> Clone for PredictionService<E> {
    fn clone(&self) -> Self {
        Self {
            predictor: Arc::clone(&self.predictor),
            timeout: self.timeout,
        }
    }
}

impl PredictionService<BertEncoder> {
    /// Loads the pipeline and applies the configured timeout.
    pub fn from_config(config: &TriageConfig) -> Result<Self, PipelineError> {
        let predictor = Predictor::load(config)?;
        Ok(Self::new(Arc::new(predictor)).with_timeout(config.predict_timeout))
    }
}

impl<E: TextEncoder + 'static> PredictionService<E> {
    pub fn new(predictor: Arc<Predictor<E>>) -> Self {
        Self {
            predictor,
            timeout: None,
        }
    }

    /// Sets (or clears) the caller-side timeout per request.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Classifies `text` on the blocking pool.
    pub async fn predict(&self, text: impl Into<String>) -> PredictionResult {
        let text = text.into();
        let predictor = Arc::clone(&self.predictor);
        let task = tokio::task::spawn_blocking(move || predictor.predict(&text));

        let joined = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, task).await {
                Ok(joined) => joined,
                Err(_) => {
                    warn!(
                        timeout_ms = saturating_millis(limit),
                        "Prediction timed out; returning fallback categorization"
                    );
                    return PredictionResult::fallback(format!(
                        "prediction timed out after {} ms",
                        limit.as_millis()
                    ));
                }
            },
            None => task.await,
        };

        match joined {
            Ok(result) => {
                debug!(success = result.success, "Prediction task finished");
                result
            }
            Err(e) => {
                warn!(error = %e, "Prediction task failed; returning fallback categorization");
                PredictionResult::fallback(format!("prediction task failed: {}", e))
            }
        }
    }

    /// Classifies several texts as one blocking batch.
    pub async fn predict_batch(&self, texts: Vec<String>) -> Vec<PredictionResult> {
        let count = texts.len();
        let predictor = Arc::clone(&self.predictor);
        let task = tokio::task::spawn_blocking(move || {
            let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
            predictor.predict_batch(&refs)
        });

        let joined = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, task).await {
                Ok(joined) => joined.map_err(|e| format!("prediction task failed: {}", e)),
                Err(_) => Err(format!("prediction timed out after {} ms", limit.as_millis())),
            },
            None => task
                .await
                .map_err(|e| format!("prediction task failed: {}", e)),
        };

        joined.unwrap_or_else(|reason| {
            warn!(%reason, batch_size = count, "Batch prediction failed; returning fallback categorization");
            (0..count)
                .map(|_| PredictionResult::fallback(reason.as_str()))
                .collect()
        })
    }

    pub fn available_categories(&self) -> &Categories {
        self.predictor.available_categories()
    }

    pub fn predictor(&self) -> &Arc<Predictor<E>> {
        &self.predictor
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}
