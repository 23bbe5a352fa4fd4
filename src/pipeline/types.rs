use serde::{Deserialize, Serialize};

use crate::constants::{FALLBACK_DEPARTMENT, FALLBACK_PRIORITY};

/// Outcome of one prediction request, as returned to callers.
///
/// When `success` is `false` the labels are always the fallback pair and
/// `error` carries a diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub department: String,
    pub priority: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PredictionResult {
    /// The fallback categorization (`General Inquiry` / `Medium`).
    pub fn fallback(error: impl Into<String>) -> Self {
        Self {
            department: FALLBACK_DEPARTMENT.to_string(),
            priority: FALLBACK_PRIORITY.to_string(),
            success: false,
            error: Some(error.into()),
        }
    }

    pub fn is_fallback(&self) -> bool {
        !self.success
    }
}

/// A successful classification, before the fallback policy is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prediction {
    pub department: String,
    pub priority: String,
}

impl From<Prediction> for PredictionResult {
    fn from(prediction: Prediction) -> Self {
        Self {
            department: prediction.department,
            priority: prediction.priority,
            success: true,
            error: None,
        }
    }
}

/// The label spaces of both classifiers, in class-index order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Categories {
    pub departments: Vec<String>,
    pub priorities: Vec<String>,
}
