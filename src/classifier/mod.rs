//! Category classifiers: embedding vector to a label from a fixed label space.
//!
//! Each [`CategoryClassifier`] pairs a fitted [`LinearModel`] with the
//! [`LabelEncoder`] that decodes its class indices. The pipeline loads two of
//! them (department and priority) at startup; neither changes afterwards.

pub mod error;
pub mod labels;
pub mod linear;


pub use error::ClassifierError;
pub use labels::LabelEncoder;
pub use linear::LinearModel;

use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

/// Which of the two classification targets a classifier predicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Department,
    Priority,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Department => "department",
            Category::Priority => "priority",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trained linear classifier plus its label decoder.
#[derive(Debug)]
pub struct CategoryClassifier {
    category: Category,
    model: LinearModel,
    labels: LabelEncoder,
}

impl CategoryClassifier {
    /// Loads the model and label encoder artifacts.
    ///
    /// Failure is fatal for the pipeline: there is no training path at serving time.
    pub fn load(
        category: Category,
        model_path: &Path,
        encoder_path: &Path,
    ) -> Result<Self, ClassifierError> {
        let model = LinearModel::load(model_path)?;
        let labels = LabelEncoder::load(encoder_path)?;
        let classifier = Self::from_parts(category, model, labels)?;

        info!(
            category = %category,
            model_path = %model_path.display(),
            classes = classifier.labels().len(),
            input_dim = classifier.input_dim(),
            "Classifier loaded"
        );

        Ok(classifier)
    }

    /// Assembles a classifier, checking that the model's rows fit the label count.
    pub fn from_parts(
        category: Category,
        model: LinearModel,
        labels: LabelEncoder,
    ) -> Result<Self, ClassifierError> {
        let rows = model.rows();
        let classes = labels.len();
        // A single decision row scores class 1 against class 0.
        let fits = if rows == 1 { classes == 2 } else { rows == classes };

        if !fits {
            return Err(ClassifierError::InvalidArtifact {
                reason: format!(
                    "{} model has {} decision rows but {} labels",
                    category, rows, classes
                ),
            });
        }

        Ok(Self {
            category,
            model,
            labels,
        })
    }

    /// Writes the model and label encoder artifacts.
    pub fn save(&self, model_path: &Path, encoder_path: &Path) -> Result<(), ClassifierError> {
        self.model.save(model_path)?;
        self.labels.save(encoder_path)
    }

    /// Predicts the class index for an embedding.
    ///
    /// Multiclass models take the highest-scoring row (the first one on ties);
    /// binary models pick class 1 when the single score is positive.
    pub fn predict_index(&self, embedding: &[f32]) -> Result<usize, ClassifierError> {
        let scores = self.model.decision_function(embedding)?;
        if scores.iter().any(|s| !s.is_finite()) {
            return Err(ClassifierError::NonFiniteScores);
        }

        let index = if self.is_binary() {
            usize::from(scores[0] > 0.0)
        } else {
            let mut best = 0;
            for (i, score) in scores.iter().enumerate().skip(1) {
                if *score > scores[best] {
                    best = i;
                }
            }
            best
        };

        debug!(category = %self.category, index, "Classified embedding");
        Ok(index)
    }

    /// Classifies an embedding into a label of this classifier's label space.
    pub fn classify(&self, embedding: &[f32]) -> Result<&str, ClassifierError> {
        let index = self.predict_index(embedding)?;
        self.labels.decode(index)
    }

    /// Fails if the label encoder records a different source encoder than `model_id`.
    pub fn check_source_model(&self, model_id: &str) -> Result<(), ClassifierError> {
        match self.labels.encoder_model() {
            Some(expected) if expected != model_id => Err(ClassifierError::SourceModelMismatch {
                expected: expected.to_string(),
                actual: model_id.to_string(),
            }),
            _ => Ok(()),
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn name(&self) -> &'static str {
        self.category.as_str()
    }

    /// The label space, in class-index order.
    pub fn labels(&self) -> &[String] {
        self.labels.classes()
    }

    pub fn input_dim(&self) -> usize {
        self.model.input_dim()
    }

    pub fn is_binary(&self) -> bool {
        self.model.rows() == 1
    }
}
