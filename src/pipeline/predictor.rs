use tracing::{debug, info, warn};

use crate::classifier::{Category, CategoryClassifier};
use crate::config::TriageConfig;
use crate::constants::{DimValidationError, validate_embedding_dim};
use crate::encoder::{BertEncoder, TextEncoder, device_label};
use crate::normalize::normalize;

use super::error::{PipelineError, PredictError};
use super::types::{Categories, Prediction, PredictionResult};

/// Loaded prediction pipeline: encoder plus department and priority classifiers.
///
/// Immutable once built. Share it across threads with `Arc<Predictor>`.
#[derive(Debug)]
pub struct Predictor<E: TextEncoder = BertEncoder> {
    encoder: E,
    department: CategoryClassifier,
    priority: CategoryClassifier,
    categories: Categories,
}

impl Predictor<BertEncoder> {
    /// Loads the encoder and both classifiers from the configured locations.
    pub fn load(config: &TriageConfig) -> Result<Self, PipelineError> {
        config.validate()?;

        let encoder = BertEncoder::load(config.encoder_config())?;
        info!(
            model_id = encoder.model_id(),
            device = device_label(encoder.device()),
            embedding_dim = encoder.embedding_dim(),
            stub = encoder.is_stub(),
            "Encoder ready"
        );

        let department = CategoryClassifier::load(
            Category::Department,
            &config.department_model_path(),
            &config.department_encoder_path(),
        )
        .map_err(|source| PipelineError::Classifier {
            category: Category::Department,
            source,
        })?;

        let priority = CategoryClassifier::load(
            Category::Priority,
            &config.priority_model_path(),
            &config.priority_encoder_path(),
        )
        .map_err(|source| PipelineError::Classifier {
            category: Category::Priority,
            source,
        })?;

        Self::new(encoder, department, priority)
    }
}

impl<E: TextEncoder> Predictor<E> {
    /// Assembles a pipeline from already-loaded parts.
    ///
    /// Fails when a classifier was fitted on a different embedding dimension or
    /// a different source encoder than `encoder` provides.
    pub fn new(
        encoder: E,
        department: CategoryClassifier,
        priority: CategoryClassifier,
    ) -> Result<Self, PipelineError> {
        let actual = encoder.embedding_dim();

        for classifier in [&department, &priority] {
            let category = classifier.category();
            validate_embedding_dim(actual, classifier.input_dim()).map_err(|e| match e {
                DimValidationError::DimensionMismatch { expected, actual } => {
                    PipelineError::DimensionMismatch {
                        category,
                        expected,
                        actual,
                    }
                }
                DimValidationError::ZeroDimension => PipelineError::DimensionMismatch {
                    category,
                    expected: classifier.input_dim(),
                    actual,
                },
            })?;

            classifier
                .check_source_model(encoder.model_id())
                .map_err(|source| PipelineError::Classifier { category, source })?;
        }

        let categories = Categories {
            departments: department.labels().to_vec(),
            priorities: priority.labels().to_vec(),
        };

        info!(
            embedding_dim = actual,
            departments = ?categories.departments,
            priorities = ?categories.priorities,
            "Prediction pipeline assembled"
        );

        Ok(Self {
            encoder,
            department,
            priority,
            categories,
        })
    }

    /// Classifies a complaint, substituting the fallback categorization on any failure.
    ///
    /// Only returned errors fall back. A panic in the encoder or a classifier
    /// unwinds to the caller; [`PredictionService`](crate::service::PredictionService)
    /// turns worker panics into the fallback.
    pub fn predict(&self, text: &str) -> PredictionResult {
        match self.try_predict(text) {
            Ok(prediction) => prediction.into(),
            Err(e) => {
                warn!(error = %e, "Prediction failed; returning fallback categorization");
                PredictionResult::fallback(e.to_string())
            }
        }
    }

    /// Classifies a complaint, returning the typed error instead of the fallback.
    pub fn try_predict(&self, text: &str) -> Result<Prediction, PredictError> {
        let cleaned = normalize(text);
        if cleaned.is_empty() {
            return Err(PredictError::EmptyInput);
        }

        debug!(
            raw_len = text.len(),
            normalized_len = cleaned.len(),
            "Predicting"
        );

        let embedding = self.encoder.embed(&cleaned)?;
        self.classify(&embedding)
    }

    /// Classifies many complaints with one encoder batch.
    ///
    /// The fallback applies per item. If the batch forward pass fails, every
    /// non-empty item falls back with that error. Panics propagate as in [`Predictor::predict`].
    pub fn predict_batch(&self, texts: &[&str]) -> Vec<PredictionResult> {
        let cleaned: Vec<String> = texts.iter().map(|t| normalize(t)).collect();
        let non_empty: Vec<&str> = cleaned
            .iter()
            .filter(|t| !t.is_empty())
            .map(String::as_str)
            .collect();

        debug!(
            batch_size = texts.len(),
            non_empty = non_empty.len(),
            "Predicting batch"
        );

        let embeddings = if non_empty.is_empty() {
            Ok(Vec::new())
        } else {
            self.encoder.embed_batch(&non_empty)
        };

        let mut embeddings = match embeddings {
            Ok(embeddings) if embeddings.len() == non_empty.len() => embeddings.into_iter(),
            Ok(embeddings) => {
                let reason = format!(
                    "encoder returned {} embeddings for {} texts",
                    embeddings.len(),
                    non_empty.len()
                );
                warn!(%reason, "Batch embedding failed; returning fallback categorization");
                return cleaned
                    .iter()
                    .map(|t| Self::batch_failure(t, &reason))
                    .collect();
            }
            Err(e) => {
                let reason = PredictError::from(e).to_string();
                warn!(error = %reason, "Batch embedding failed; returning fallback categorization");
                return cleaned
                    .iter()
                    .map(|t| Self::batch_failure(t, &reason))
                    .collect();
            }
        };

        cleaned
            .iter()
            .map(|text| {
                let outcome = if text.is_empty() {
                    Err(PredictError::EmptyInput)
                } else {
                    match embeddings.next() {
                        Some(embedding) => self.classify(&embedding),
                        None => Err(PredictError::EmptyInput),
                    }
                };
                match outcome {
                    Ok(prediction) => prediction.into(),
                    Err(e) => {
                        warn!(error = %e, "Prediction failed; returning fallback categorization");
                        PredictionResult::fallback(e.to_string())
                    }
                }
            })
            .collect()
    }

    fn batch_failure(cleaned: &str, reason: &str) -> PredictionResult {
        if cleaned.is_empty() {
            PredictionResult::fallback(PredictError::EmptyInput.to_string())
        } else {
            PredictionResult::fallback(reason)
        }
    }

    fn classify(&self, embedding: &[f32]) -> Result<Prediction, PredictError> {
        let department = self
            .department
            .classify(embedding)
            .map_err(|source| PredictError::Classification {
                category: Category::Department,
                source,
            })?;
        let priority = self
            .priority
            .classify(embedding)
            .map_err(|source| PredictError::Classification {
                category: Category::Priority,
                source,
            })?;

        Ok(Prediction {
            department: department.to_string(),
            priority: priority.to_string(),
        })
    }

    /// The label spaces of both classifiers.
    pub fn available_categories(&self) -> &Categories {
        &self.categories
    }

    pub fn encoder(&self) -> &E {
        &self.encoder
    }
}
