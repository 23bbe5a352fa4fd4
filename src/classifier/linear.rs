use candle_core::{DType, Device, Tensor};
use std::collections::HashMap;
use std::path::Path;

use super::error::ClassifierError;

/// Decision function of a fitted linear classifier (logistic regression).
///
/// Stored as a safetensors file with two f32 tensors: `coef` shaped
/// `[rows, dim]` and `intercept` shaped `[rows]`. A multiclass model has one
/// row per class; a binary model has a single row scoring class 1.
pub struct LinearModel {
    coef: Tensor,
    intercept: Tensor,
    rows: usize,
    dim: usize,
}

impl std::fmt::Debug for LinearModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinearModel")
            .field("rows", &self.rows)
            .field("dim", &self.dim)
            .finish()
    }
}

impl LinearModel {
    pub const COEF_TENSOR: &'static str = "coef";
    pub const INTERCEPT_TENSOR: &'static str = "intercept";

    /// Builds a model from row-major coefficients and per-row intercepts.
    pub fn new(coef: Vec<Vec<f32>>, intercept: Vec<f32>) -> Result<Self, ClassifierError> {
        let rows = coef.len();
        let dim = coef.first().map(Vec::len).unwrap_or(0);
        if coef.iter().any(|row| row.len() != dim) {
            return Err(ClassifierError::InvalidArtifact {
                reason: "coefficient rows have different lengths".to_string(),
            });
        }

        let flat: Vec<f32> = coef.into_iter().flatten().collect();
        let coef = Tensor::from_vec(flat, (rows, dim), &Device::Cpu)?;
        let intercept_len = intercept.len();
        let intercept = Tensor::from_vec(intercept, intercept_len, &Device::Cpu)?;

        Self::from_tensors(coef, intercept)
    }

    /// Loads `coef` and `intercept` from a safetensors file.
    pub fn load(path: &Path) -> Result<Self, ClassifierError> {
        if !path.exists() {
            return Err(ClassifierError::ArtifactNotFound {
                path: path.to_path_buf(),
            });
        }

        let load_failed = |reason: String| ClassifierError::ArtifactLoadFailed {
            path: path.to_path_buf(),
            reason,
        };

        let mut tensors = candle_core::safetensors::load(path, &Device::Cpu)
            .map_err(|e| load_failed(e.to_string()))?;

        let coef = tensors
            .remove(Self::COEF_TENSOR)
            .ok_or_else(|| load_failed(format!("missing '{}' tensor", Self::COEF_TENSOR)))?;
        let intercept = tensors
            .remove(Self::INTERCEPT_TENSOR)
            .ok_or_else(|| load_failed(format!("missing '{}' tensor", Self::INTERCEPT_TENSOR)))?;

        let coef = coef
            .to_dtype(DType::F32)
            .map_err(|e| load_failed(e.to_string()))?;
        let intercept = intercept
            .to_dtype(DType::F32)
            .map_err(|e| load_failed(e.to_string()))?;

        Self::from_tensors(coef, intercept)
    }

    pub fn save(&self, path: &Path) -> Result<(), ClassifierError> {
        let tensors: HashMap<&str, Tensor> = HashMap::from([
            (Self::COEF_TENSOR, self.coef.clone()),
            (Self::INTERCEPT_TENSOR, self.intercept.clone()),
        ]);
        candle_core::safetensors::save(&tensors, path).map_err(|e| {
            ClassifierError::ArtifactLoadFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })
    }

    fn from_tensors(coef: Tensor, intercept: Tensor) -> Result<Self, ClassifierError> {
        let (rows, dim) = coef
            .dims2()
            .map_err(|e| ClassifierError::InvalidArtifact {
                reason: format!("'coef' must be 2-dimensional: {}", e),
            })?;
        let intercept_len = intercept
            .dims1()
            .map_err(|e| ClassifierError::InvalidArtifact {
                reason: format!("'intercept' must be 1-dimensional: {}", e),
            })?;

        if rows == 0 || dim == 0 {
            return Err(ClassifierError::InvalidArtifact {
                reason: format!("'coef' has empty shape [{}, {}]", rows, dim),
            });
        }
        if intercept_len != rows {
            return Err(ClassifierError::InvalidArtifact {
                reason: format!(
                    "'intercept' has {} entries but 'coef' has {} rows",
                    intercept_len, rows
                ),
            });
        }

        let weights_finite = coef
            .flatten_all()?
            .to_vec1::<f32>()?
            .into_iter()
            .chain(intercept.to_vec1::<f32>()?)
            .all(f32::is_finite);
        if !weights_finite {
            return Err(ClassifierError::InvalidArtifact {
                reason: "weights contain NaN or infinity".to_string(),
            });
        }

        Ok(Self {
            coef,
            intercept,
            rows,
            dim,
        })
    }

    /// Computes `coef · x + intercept`, one score per row.
    pub fn decision_function(&self, x: &[f32]) -> Result<Vec<f32>, ClassifierError> {
        if x.len() != self.dim {
            return Err(ClassifierError::DimensionMismatch {
                expected: self.dim,
                actual: x.len(),
            });
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(ClassifierError::NonFiniteScores);
        }

        let x = Tensor::from_slice(x, (self.dim, 1), &Device::Cpu)?;
        let scores = self
            .coef
            .matmul(&x)?
            .squeeze(1)?
            .add(&self.intercept)?
            .to_vec1::<f32>()?;

        Ok(scores)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn input_dim(&self) -> usize {
        self.dim
    }
}
