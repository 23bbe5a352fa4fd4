//! Test fixtures for integration tests.

use std::path::Path;

use tempfile::TempDir;

use triage::classifier::{LabelEncoder, LinearModel};
use triage::config::TriageConfig;
use triage::constants::{
    DEFAULT_EMBEDDING_DIM, DEFAULT_ENCODER_MODEL_ID, DEPARTMENT_ENCODER_FILE,
    DEPARTMENT_MODEL_FILE, PRIORITY_ENCODER_FILE, PRIORITY_MODEL_FILE,
};

pub const DEPARTMENTS: [&str; 5] = [
    "Account Management",
    "Billing",
    "Fraud",
    "General Inquiry",
    "Technical Support",
];

pub const PRIORITIES: [&str; 3] = ["High", "Low", "Medium"];

pub const SAMPLE_COMPLAINTS: [&str; 5] = [
    "My credit card was charged twice for the same purchase",
    "I can't log into my account, forgot password",
    "The mobile app keeps crashing when I try to upload photos",
    "Someone used my account without permission",
    "I need help with a refund for my recent order",
];

/// Deterministic weights in `[-0.5, 0.5]`.
pub fn seeded_weights(seed: u64, rows: usize, dim: usize) -> Vec<Vec<f32>> {
    let mut state = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15).wrapping_add(1);
    (0..rows)
        .map(|_| {
            (0..dim)
                .map(|_| {
                    state = state
                        .wrapping_mul(6364136223846793005)
                        .wrapping_add(1442695040888963407);
                    ((state >> 40) as f32 / (1u64 << 24) as f32) - 0.5
                })
                .collect()
        })
        .collect()
}

fn write_classifier(
    dir: &Path,
    model_file: &str,
    encoder_file: &str,
    labels: &[&str],
    seed: u64,
    dim: usize,
    encoder_model: Option<&str>,
) {
    let model = LinearModel::new(seeded_weights(seed, labels.len(), dim), vec![0.0; labels.len()])
        .expect("fixture model should be valid");
    model
        .save(&dir.join(model_file))
        .expect("fixture model should save");

    let mut encoder = LabelEncoder::new(labels.iter().map(|s| s.to_string()).collect())
        .expect("fixture labels should be valid");
    if let Some(model_id) = encoder_model {
        encoder = encoder.with_encoder_model(model_id);
    }
    encoder
        .save(&dir.join(encoder_file))
        .expect("fixture label encoder should save");
}

/// Writes classifier artifacts into a temp dir and returns a stub-encoder config for it.
pub struct ModelsDirBuilder {
    dim: usize,
    department_dim: Option<usize>,
    encoder_model: Option<String>,
}

impl Default for ModelsDirBuilder {
    fn default() -> Self {
        Self {
            dim: DEFAULT_EMBEDDING_DIM,
            department_dim: None,
            encoder_model: Some(DEFAULT_ENCODER_MODEL_ID.to_string()),
        }
    }
}

impl ModelsDirBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fits the department model on a different dimension than the encoder produces.
    pub fn department_dim(mut self, dim: usize) -> Self {
        self.department_dim = Some(dim);
        self
    }

    pub fn encoder_model(mut self, model_id: Option<&str>) -> Self {
        self.encoder_model = model_id.map(str::to_string);
        self
    }

    pub fn build(self) -> (TempDir, TriageConfig) {
        let dir = TempDir::new().expect("temp dir should be created");

        write_classifier(
            dir.path(),
            DEPARTMENT_MODEL_FILE,
            DEPARTMENT_ENCODER_FILE,
            &DEPARTMENTS,
            7,
            self.department_dim.unwrap_or(self.dim),
            self.encoder_model.as_deref(),
        );
        write_classifier(
            dir.path(),
            PRIORITY_MODEL_FILE,
            PRIORITY_ENCODER_FILE,
            &PRIORITIES,
            11,
            self.dim,
            self.encoder_model.as_deref(),
        );

        let mut config = TriageConfig::new(dir.path());
        config.encoder_stub = true;
        (dir, config)
    }
}
