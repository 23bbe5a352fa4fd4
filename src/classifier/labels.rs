use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use super::error::ClassifierError;

/// Maps class indices back to human-readable labels.
///
/// On disk this is a JSON document:
///
/// ```json
/// { "classes": ["Billing", "Technical Support"], "encoder_model": "bert-base-uncased" }
/// ```
///
/// `classes` is in class-index order. `encoder_model` is optional and names the
/// encoder whose embeddings the classifier was fitted on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    encoder_model: Option<String>,
}

impl LabelEncoder {
    pub fn new(classes: Vec<String>) -> Result<Self, ClassifierError> {
        let encoder = Self {
            classes,
            encoder_model: None,
        };
        encoder.validate()?;
        Ok(encoder)
    }

    pub fn with_encoder_model(mut self, model_id: impl Into<String>) -> Self {
        self.encoder_model = Some(model_id.into());
        self
    }

    pub fn load(path: &Path) -> Result<Self, ClassifierError> {
        if !path.exists() {
            return Err(ClassifierError::ArtifactNotFound {
                path: path.to_path_buf(),
            });
        }

        let content =
            std::fs::read_to_string(path).map_err(|e| ClassifierError::ArtifactLoadFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let encoder: Self =
            serde_json::from_str(&content).map_err(|e| ClassifierError::ArtifactLoadFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        encoder.validate()?;
        Ok(encoder)
    }

    pub fn save(&self, path: &Path) -> Result<(), ClassifierError> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            ClassifierError::ArtifactLoadFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;
        std::fs::write(path, content).map_err(|e| ClassifierError::ArtifactLoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    fn validate(&self) -> Result<(), ClassifierError> {
        if self.classes.is_empty() {
            return Err(ClassifierError::InvalidArtifact {
                reason: "label encoder has no classes".to_string(),
            });
        }

        let mut seen = HashSet::with_capacity(self.classes.len());
        for class in &self.classes {
            if class.trim().is_empty() {
                return Err(ClassifierError::InvalidArtifact {
                    reason: "label encoder contains an empty class name".to_string(),
                });
            }
            if !seen.insert(class.as_str()) {
                return Err(ClassifierError::InvalidArtifact {
                    reason: format!("label encoder lists '{}' more than once", class),
                });
            }
        }

        Ok(())
    }

    /// Inverse transform: class index to label.
    pub fn decode(&self, index: usize) -> Result<&str, ClassifierError> {
        self.classes
            .get(index)
            .map(String::as_str)
            .ok_or(ClassifierError::LabelOutOfRange {
                index,
                len: self.classes.len(),
            })
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn encoder_model(&self) -> Option<&str> {
        self.encoder_model.as_deref()
    }
}
