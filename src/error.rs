//! Error taxonomy for model conversion.
//!
//! Every stage fails fast with one of these variants. The driver wraps stage
//! failures in `ConversionFailed` so the CLI can tell which model failed and
//! whether the failure came from validation or from conversion itself.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

pub type ConvertResult<T> = Result<T, ConvertError>;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("cannot load model '{}': {source}", .path.display())]
    ModelLoad {
        path: PathBuf,
        #[source]
        source: LoadError,
    },
    #[error("unsupported pipeline: {0}")]
    UnsupportedPipeline(String),
    #[error("model mapping has no 'model' key")]
    MissingModelKey,
    #[error("not a linear model: {0}")]
    NotALinearModel(String),
    #[error("unsupported model kind: {0}")]
    UnsupportedModelKind(String),
    #[error("invalid coefficient: {0}")]
    InvalidCoefficient(String),
    #[error("scaler transform failed: {0}")]
    ScalerTransform(String),
    #[error("{0}")]
    Validation(ValidationFailure),
    #[error("unsupported target '{0}' (expected one of: c, rust)")]
    UnsupportedTarget(String),
    #[error("invalid function name '{0}'")]
    InvalidFunctionName(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("cannot write '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("conversion of '{}' failed: {source}", .model.display())]
    ConversionFailed {
        model: PathBuf,
        #[source]
        source: Box<ConvertError>,
    },
}

impl ConvertError {
    pub fn pipeline(message: impl Into<String>) -> Self {
        ConvertError::UnsupportedPipeline(message.into())
    }

    pub fn not_linear(message: impl Into<String>) -> Self {
        ConvertError::NotALinearModel(message.into())
    }

    pub fn unsupported_kind(message: impl Into<String>) -> Self {
        ConvertError::UnsupportedModelKind(message.into())
    }

    pub fn invalid_coefficient(message: impl Into<String>) -> Self {
        ConvertError::InvalidCoefficient(message.into())
    }

    pub fn scaler(message: impl Into<String>) -> Self {
        ConvertError::ScalerTransform(message.into())
    }

    /// Wrap a stage failure with the model it came from.
    pub fn failed(model: impl Into<PathBuf>, source: ConvertError) -> Self {
        ConvertError::ConversionFailed {
            model: model.into(),
            source: Box::new(source),
        }
    }

    /// The innermost error, looking through `ConversionFailed` wrappers.
    pub fn root(&self) -> &ConvertError {
        match self {
            ConvertError::ConversionFailed { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether the conversion itself succeeded but the equivalence check did not.
    pub fn is_validation_failure(&self) -> bool {
        matches!(self.root(), ConvertError::Validation(_))
    }
}

/// Failure to read or parse a model export.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON at line {}, column {}: {error}", .error.line(), .error.column())]
    Syntax {
        error: serde_json::Error,
        /// The model file text, kept so the CLI can point at the offending byte.
        text: String,
    },
    #[error("not a model export: {0}")]
    Shape(String),
}

// ─── Validation Failures ───────────────────────────────────────────

/// What kind of disagreement the equivalence check found.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchKind {
    /// Regression outputs differ by more than the tolerance.
    ValueMismatch,
    /// Class probabilities differ by more than the tolerance.
    ProbabilityMismatch,
    /// Predicted class labels disagree on at least one sample.
    LabelMismatch,
    /// The original estimator cannot produce the output needed for comparison.
    MissingCapability,
}

impl fmt::Display for MismatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MismatchKind::ValueMismatch => write!(f, "value mismatch"),
            MismatchKind::ProbabilityMismatch => write!(f, "probability mismatch"),
            MismatchKind::LabelMismatch => write!(f, "label mismatch"),
            MismatchKind::MissingCapability => write!(f, "missing capability"),
        }
    }
}

/// A failed equivalence check, with enough numbers to diagnose it.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidationFailure {
    pub mismatch: MismatchKind,
    pub max_abs_diff: f64,
    pub mismatched_count: usize,
    pub sample_count: usize,
    pub detail: String,
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mismatch {
            MismatchKind::MissingCapability => {
                write!(f, "validation failed ({}): {}", self.mismatch, self.detail)
            }
            MismatchKind::LabelMismatch => write!(
                f,
                "validation failed ({}): {}/{} samples disagree",
                self.mismatch, self.mismatched_count, self.sample_count
            ),
            _ => write!(
                f,
                "validation failed ({}): max diff {:.6e}, {}/{} samples over tolerance",
                self.mismatch, self.max_abs_diff, self.mismatched_count, self.sample_count
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_looks_through_wrappers() {
        let inner = ConvertError::pipeline("two estimators");
        let err = ConvertError::failed("model.json", inner);
        assert!(matches!(err.root(), ConvertError::UnsupportedPipeline(_)));
        assert!(!err.is_validation_failure());
    }

    #[test]
    fn test_validation_failure_is_distinct() {
        let failure = ValidationFailure {
            mismatch: MismatchKind::LabelMismatch,
            max_abs_diff: 0.0,
            mismatched_count: 3,
            sample_count: 32,
            detail: String::new(),
        };
        let err = ConvertError::failed("m.json", ConvertError::Validation(failure));
        assert!(err.is_validation_failure());
        assert!(err.to_string().contains("3/32 samples disagree"));
    }

    #[test]
    fn test_display_embeds_magnitude() {
        let failure = ValidationFailure {
            mismatch: MismatchKind::ValueMismatch,
            max_abs_diff: 0.25,
            mismatched_count: 1,
            sample_count: 32,
            detail: String::new(),
        };
        let msg = ConvertError::Validation(failure).to_string();
        assert!(msg.contains("value mismatch"), "got: {}", msg);
        assert!(msg.contains("2.500000e-1"), "got: {}", msg);
    }
}
