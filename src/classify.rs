//! Model classifier: decides which formulation a linear estimator uses.

use std::fmt;

use serde::Serialize;

use crate::error::{ConvertError, ConvertResult};
use crate::normalize::{Coef, Family, LinearParams};

/// The three supported formulations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    /// Affine score returned as-is.
    Regression,
    /// Affine score through the logistic function.
    BinaryClassification,
    /// One affine score per class, argmax.
    MulticlassClassification,
}

impl Kind {
    /// Short name used in file names and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Regression => "regression",
            Kind::BinaryClassification => "binary",
            Kind::MulticlassClassification => "multiclass",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Regression => write!(f, "regression"),
            Kind::BinaryClassification => write!(f, "binary classification"),
            Kind::MulticlassClassification => write!(f, "multiclass classification"),
        }
    }
}

/// Classify an estimator by weight shape and declared family.
///
/// First match wins:
/// 1. more than two weight rows → multiclass
/// 2. one row (or a vector) and a classifier family → binary
/// 3. one row (or a vector) and a regressor or untagged family → regression
///
/// A vector estimator with no family tag is treated as a regressor.
pub fn classify(params: &LinearParams) -> ConvertResult<Kind> {
    let kind = match (&params.coef, params.family) {
        (Coef::Matrix(rows), Family::Regressor) if rows.len() > 1 => {
            return Err(ConvertError::unsupported_kind(format!(
                "{} has {} outputs; multi-output regression is not supported",
                params.class_name,
                rows.len()
            )))
        }
        (Coef::Matrix(rows), _) if rows.len() > 2 => Kind::MulticlassClassification,
        (Coef::Matrix(rows), Family::Classifier) if rows.len() == 1 => {
            Kind::BinaryClassification
        }
        (Coef::Vector(_), Family::Classifier) => Kind::BinaryClassification,
        (Coef::Vector(_), Family::Regressor | Family::Untagged) => Kind::Regression,
        (Coef::Matrix(rows), Family::Regressor) if rows.len() == 1 => Kind::Regression,
        (coef, family) => {
            return Err(ConvertError::unsupported_kind(format!(
                "{} with {} weights and {:?} family",
                params.class_name,
                coef.shape_label(),
                family
            )))
        }
    };

    if let Some(n) = params.n_classes {
        let expected = match kind {
            Kind::Regression => None,
            Kind::BinaryClassification => Some(2),
            Kind::MulticlassClassification => Some(params.coef.rows()),
        };
        if let Some(expected) = expected {
            if n != expected {
                return Err(ConvertError::unsupported_kind(format!(
                    "{} lists {} classes but its weights describe {}",
                    params.class_name, n, expected
                )));
            }
        }
    }
    Ok(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(coef: Coef, family: Family, n_classes: Option<usize>) -> LinearParams {
        let rows = coef.rows();
        LinearParams {
            class_name: "Test".to_string(),
            coef,
            intercept: vec![0.0; rows],
            family,
            has_proba: family == Family::Classifier,
            n_classes,
        }
    }

    #[test]
    fn test_three_rows_is_multiclass() {
        let p = params(Coef::Matrix(vec![vec![0.0]; 3]), Family::Classifier, Some(3));
        assert_eq!(classify(&p).unwrap(), Kind::MulticlassClassification);
    }

    #[test]
    fn test_three_rows_untagged_is_multiclass() {
        let p = params(Coef::Matrix(vec![vec![0.0]; 4]), Family::Untagged, None);
        assert_eq!(classify(&p).unwrap(), Kind::MulticlassClassification);
    }

    #[test]
    fn test_single_row_classifier_is_binary() {
        let p = params(Coef::Matrix(vec![vec![1.0, 2.0]]), Family::Classifier, Some(2));
        assert_eq!(classify(&p).unwrap(), Kind::BinaryClassification);
    }

    #[test]
    fn test_vector_classifier_is_binary() {
        let p = params(Coef::Vector(vec![1.0]), Family::Classifier, None);
        assert_eq!(classify(&p).unwrap(), Kind::BinaryClassification);
    }

    #[test]
    fn test_vector_regressor_is_regression() {
        let p = params(Coef::Vector(vec![1.0, 2.0]), Family::Regressor, None);
        assert_eq!(classify(&p).unwrap(), Kind::Regression);
    }

    #[test]
    fn test_untagged_vector_defaults_to_regression() {
        let p = params(Coef::Vector(vec![1.0]), Family::Untagged, None);
        assert_eq!(classify(&p).unwrap(), Kind::Regression);
    }

    #[test]
    fn test_single_row_regressor_is_regression() {
        let p = params(Coef::Matrix(vec![vec![3.0]]), Family::Regressor, None);
        assert_eq!(classify(&p).unwrap(), Kind::Regression);
    }

    #[test]
    fn test_two_rows_is_unsupported() {
        let p = params(Coef::Matrix(vec![vec![0.0]; 2]), Family::Classifier, Some(2));
        let err = classify(&p).unwrap_err();
        assert!(matches!(err, ConvertError::UnsupportedModelKind(_)));
    }

    #[test]
    fn test_untagged_single_row_is_unsupported() {
        let p = params(Coef::Matrix(vec![vec![0.0]]), Family::Untagged, None);
        assert!(classify(&p).is_err());
    }

    #[test]
    fn test_multi_output_regressor_is_unsupported() {
        let p = params(Coef::Matrix(vec![vec![0.0]; 3]), Family::Regressor, None);
        let err = classify(&p).unwrap_err();
        assert!(err.to_string().contains("multi-output"), "got: {}", err);
    }

    #[test]
    fn test_class_count_disagreement() {
        let p = params(Coef::Matrix(vec![vec![0.0]]), Family::Classifier, Some(3));
        let err = classify(&p).unwrap_err();
        assert!(matches!(err, ConvertError::UnsupportedModelKind(_)));
    }
}
