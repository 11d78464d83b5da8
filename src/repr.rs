//! Canonical model representation shared by the generator and the validator.
//!
//! `EstimatorRepr` is a closed set of variants. Both consumers match on it
//! exhaustively, so adding a model kind forces both the emitted code and the
//! equivalence check to learn it at the same time.

use std::fmt;

use serde::Serialize;

use crate::classify::Kind;
use crate::error::{ConvertError, ConvertResult};
use crate::normalize::{Coef, LinearParams};

/// Per-feature centering and scaling: `(x - mean) / scale`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScalingParams {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl ScalingParams {
    /// Build scaling parameters, rejecting zero or non-finite scales.
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> ConvertResult<Self> {
        if mean.len() != scale.len() {
            return Err(ConvertError::pipeline(format!(
                "scaler mean has {} entries but scale has {}",
                mean.len(),
                scale.len()
            )));
        }
        if let Some(i) = scale.iter().position(|s| *s == 0.0 || !s.is_finite()) {
            return Err(ConvertError::pipeline(format!(
                "scaler scale[{}] = {} cannot be divided by",
                i, scale[i]
            )));
        }
        if let Some(i) = mean.iter().position(|m| !m.is_finite()) {
            return Err(ConvertError::pipeline(format!(
                "scaler mean[{}] = {} is not finite",
                i, mean[i]
            )));
        }
        Ok(Self { mean, scale })
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Apply the scaling step exactly as the generated artifact does.
    pub fn apply(&self, x: &[f64]) -> Vec<f64> {
        x.iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(xi, (m, s))| (xi - m) / s)
            .collect()
    }
}

/// The normalized estimator, one variant per supported formulation.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EstimatorRepr {
    Regression { weights: Vec<f64>, bias: f64 },
    BinaryClassifier { weights: Vec<f64>, bias: f64 },
    MulticlassClassifier { weights: Vec<Vec<f64>>, biases: Vec<f64> },
}

impl EstimatorRepr {
    /// Build the canonical form for an already classified estimator.
    ///
    /// Fails with `InvalidCoefficient` on NaN/infinite entries or entries
    /// that would overflow a 32-bit float in the generated code.
    pub fn from_params(params: &LinearParams, kind: Kind) -> ConvertResult<Self> {
        let repr = match (kind, &params.coef) {
            (Kind::Regression | Kind::BinaryClassification, Coef::Vector(w)) => {
                let weights = w.clone();
                let bias = single_intercept(params)?;
                if kind == Kind::Regression {
                    EstimatorRepr::Regression { weights, bias }
                } else {
                    EstimatorRepr::BinaryClassifier { weights, bias }
                }
            }
            (Kind::Regression | Kind::BinaryClassification, Coef::Matrix(rows))
                if rows.len() == 1 =>
            {
                let weights = rows[0].clone();
                let bias = single_intercept(params)?;
                if kind == Kind::Regression {
                    EstimatorRepr::Regression { weights, bias }
                } else {
                    EstimatorRepr::BinaryClassifier { weights, bias }
                }
            }
            (Kind::MulticlassClassification, Coef::Matrix(rows)) if rows.len() >= 3 => {
                if params.intercept.len() != rows.len() {
                    return Err(ConvertError::not_linear(format!(
                        "{} classes but {} intercepts",
                        rows.len(),
                        params.intercept.len()
                    )));
                }
                EstimatorRepr::MulticlassClassifier {
                    weights: rows.clone(),
                    biases: params.intercept.clone(),
                }
            }
            (kind, coef) => {
                return Err(ConvertError::unsupported_kind(format!(
                    "{} cannot be built from {} weights",
                    kind,
                    coef.shape_label()
                )))
            }
        };
        repr.check_finite()?;
        Ok(repr)
    }

    pub fn kind(&self) -> Kind {
        match self {
            EstimatorRepr::Regression { .. } => Kind::Regression,
            EstimatorRepr::BinaryClassifier { .. } => Kind::BinaryClassification,
            EstimatorRepr::MulticlassClassifier { .. } => Kind::MulticlassClassification,
        }
    }

    pub fn n_features(&self) -> usize {
        match self {
            EstimatorRepr::Regression { weights, .. }
            | EstimatorRepr::BinaryClassifier { weights, .. } => weights.len(),
            EstimatorRepr::MulticlassClassifier { weights, .. } => {
                weights.first().map_or(0, Vec::len)
            }
        }
    }

    /// Number of output classes (1 for regression, 2 for binary).
    pub fn n_classes(&self) -> usize {
        match self {
            EstimatorRepr::Regression { .. } => 1,
            EstimatorRepr::BinaryClassifier { .. } => 2,
            EstimatorRepr::MulticlassClassifier { biases, .. } => biases.len(),
        }
    }

    /// Reject NaN/Inf and values a 32-bit float cannot hold.
    pub fn check_finite(&self) -> ConvertResult<()> {
        match self {
            EstimatorRepr::Regression { weights, bias }
            | EstimatorRepr::BinaryClassifier { weights, bias } => {
                check_values("weights", weights)?;
                check_values("bias", std::slice::from_ref(bias))
            }
            EstimatorRepr::MulticlassClassifier { weights, biases } => {
                let width = self.n_features();
                for (c, row) in weights.iter().enumerate() {
                    if row.len() != width {
                        return Err(ConvertError::not_linear(format!(
                            "weight row {} has {} features, expected {}",
                            c,
                            row.len(),
                            width
                        )));
                    }
                    check_values(&format!("weights[{}]", c), row)?;
                }
                check_values("biases", biases)
            }
        }
    }
}

fn single_intercept(params: &LinearParams) -> ConvertResult<f64> {
    match params.intercept.as_slice() {
        [b] => Ok(*b),
        other => Err(ConvertError::not_linear(format!(
            "expected a single intercept, found {}",
            other.len()
        ))),
    }
}

fn check_values(what: &str, values: &[f64]) -> ConvertResult<()> {
    for (i, v) in values.iter().enumerate() {
        if !v.is_finite() {
            return Err(ConvertError::invalid_coefficient(format!(
                "{}[{}] is {}",
                what, i, v
            )));
        }
        if v.abs() > f32::MAX as f64 {
            return Err(ConvertError::invalid_coefficient(format!(
                "{}[{}] = {:e} overflows a 32-bit float",
                what, i, v
            )));
        }
    }
    Ok(())
}

impl fmt::Display for EstimatorRepr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} features, {} outputs)",
            self.kind(),
            self.n_features(),
            self.n_classes()
        )
    }
}
