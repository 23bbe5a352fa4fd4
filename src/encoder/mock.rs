//! Scriptable in-memory encoder for tests.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::constants::DEFAULT_ENCODER_MODEL_ID;

use super::error::EncoderError;
use super::{TextEncoder, stub_embedding};

/// Mock encoder keyed by the (already normalized) text it receives.
///
/// Unknown texts get a deterministic hash-seeded vector, so the mock behaves
/// like the stub encoder unless told otherwise.
#[derive(Debug, Clone)]
pub struct MockEncoder {
    dim: usize,
    model_id: String,
    vectors: HashMap<String, Vec<f32>>,
    failing: HashSet<String>,
    panicking: HashSet<String>,
    fail_all: bool,
    latency: Option<Duration>,
    calls: Arc<AtomicUsize>,
}

impl MockEncoder {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            model_id: DEFAULT_ENCODER_MODEL_ID.to_string(),
            vectors: HashMap::new(),
            failing: HashSet::new(),
            panicking: HashSet::new(),
            fail_all: false,
            latency: None,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Returns `vector` for `text` (the vector may deliberately have the wrong length).
    pub fn with_vector(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }

    /// Fails with a tokenization error for `text`.
    pub fn failing_on(mut self, text: &str) -> Self {
        self.failing.insert(text.to_string());
        self
    }

    /// Panics when asked to embed `text`.
    pub fn panicking_on(mut self, text: &str) -> Self {
        self.panicking.insert(text.to_string());
        self
    }

    /// Fails every call with an inference error.
    pub fn failing_always(mut self) -> Self {
        self.fail_all = true;
        self
    }

    /// Sleeps for `latency` on every call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn with_model_id(mut self, model_id: &str) -> Self {
        self.model_id = model_id.to_string();
        self
    }

    /// Number of `embed` calls made so far (batches count once per text).
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TextEncoder for MockEncoder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EncoderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            std::thread::sleep(latency);
        }

        if self.panicking.contains(text) {
            panic!("mock encoder asked to panic on {:?}", text);
        }

        if self.fail_all {
            return Err(EncoderError::InferenceFailed {
                reason: "mock encoder configured to fail".to_string(),
            });
        }

        if self.failing.contains(text) {
            return Err(EncoderError::TokenizationFailed {
                reason: format!("mock tokenizer rejected {:?}", text),
            });
        }

        Ok(self
            .vectors
            .get(text)
            .cloned()
            .unwrap_or_else(|| stub_embedding(text, self.dim)))
    }

    fn embedding_dim(&self) -> usize {
        self.dim
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
