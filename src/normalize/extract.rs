//! Attribute extraction from exported library objects.

use serde_json::Value;

use super::{Coef, Family, LinearParams, ScalerStage};
use crate::error::{ConvertError, ConvertResult};
use crate::model::RawObject;

const REGRESSORS: &[&str] = &[
    "LinearRegression",
    "Ridge",
    "RidgeCV",
    "Lasso",
    "LassoCV",
    "ElasticNet",
    "ElasticNetCV",
    "Lars",
    "LarsCV",
    "LassoLars",
    "LassoLarsCV",
    "LassoLarsIC",
    "OrthogonalMatchingPursuit",
    "BayesianRidge",
    "ARDRegression",
    "SGDRegressor",
    "HuberRegressor",
    "QuantileRegressor",
    "TheilSenRegressor",
    "PassiveAggressiveRegressor",
    "LinearSVR",
];

const CLASSIFIERS: &[&str] = &[
    "LogisticRegression",
    "LogisticRegressionCV",
    "SGDClassifier",
    "RidgeClassifier",
    "RidgeClassifierCV",
    "Perceptron",
    "PassiveAggressiveClassifier",
    "LinearSVC",
];

/// Parse a JSON number. Exporters that cannot write non-finite floats as
/// JSON numbers emit them as strings, so those are accepted too.
pub(crate) fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => match s.as_str() {
            "NaN" | "nan" => Some(f64::NAN),
            "Infinity" | "inf" => Some(f64::INFINITY),
            "-Infinity" | "-inf" => Some(f64::NEG_INFINITY),
            _ => None,
        },
        _ => None,
    }
}

/// Parse a flat array of numbers.
pub(crate) fn number_vector(value: &Value) -> Option<Vec<f64>> {
    value.as_array()?.iter().map(parse_number).collect()
}

fn parse_coef(value: &Value) -> ConvertResult<Coef> {
    let items = value
        .as_array()
        .ok_or_else(|| ConvertError::not_linear("'coef_' is not an array"))?;
    if items.iter().all(|v| v.is_array()) && !items.is_empty() {
        let mut rows = Vec::with_capacity(items.len());
        for (i, row) in items.iter().enumerate() {
            let row = number_vector(row).ok_or_else(|| {
                ConvertError::not_linear(format!("'coef_' row {} is not numeric", i))
            })?;
            rows.push(row);
        }
        let width = rows[0].len();
        if let Some(i) = rows.iter().position(|r| r.len() != width) {
            return Err(ConvertError::not_linear(format!(
                "'coef_' is ragged: row {} has {} entries, row 0 has {}",
                i,
                rows[i].len(),
                width
            )));
        }
        if width == 0 {
            return Err(ConvertError::not_linear("'coef_' has no features"));
        }
        return Ok(Coef::Matrix(rows));
    }
    let w = number_vector(value)
        .ok_or_else(|| ConvertError::not_linear("'coef_' is not a numeric array"))?;
    if w.is_empty() {
        return Err(ConvertError::not_linear("'coef_' has no features"));
    }
    Ok(Coef::Vector(w))
}

fn parse_intercept(obj: &RawObject, rows: usize) -> ConvertResult<Vec<f64>> {
    let value = match obj.attr("intercept_") {
        Some(v) => v,
        None if obj.bool_attr("fit_intercept") == Some(false) => return Ok(vec![0.0; rows]),
        None => {
            return Err(ConvertError::not_linear(format!(
                "{} has no 'intercept_'",
                obj.class
            )))
        }
    };
    let intercept = match value {
        Value::Array(_) => number_vector(value),
        other => parse_number(other).map(|b| vec![b]),
    }
    .ok_or_else(|| ConvertError::not_linear("'intercept_' is not numeric"))?;
    if intercept.len() != rows {
        return Err(ConvertError::not_linear(format!(
            "'intercept_' has {} entries for {} weight rows",
            intercept.len(),
            rows
        )));
    }
    Ok(intercept)
}

/// The declared family: `_estimator_type` first, then known class names.
pub(crate) fn family_of(obj: &RawObject) -> Family {
    match obj.str_attr("_estimator_type") {
        Some("classifier") => return Family::Classifier,
        Some("regressor") => return Family::Regressor,
        _ => {}
    }
    let class = obj.class.as_str();
    if CLASSIFIERS.contains(&class) {
        Family::Classifier
    } else if REGRESSORS.contains(&class) {
        Family::Regressor
    } else {
        Family::Untagged
    }
}

/// Whether the estimator exposes class probabilities.
pub(crate) fn has_proba(obj: &RawObject) -> bool {
    if let Some(flag) = obj.bool_attr("has_predict_proba") {
        return flag;
    }
    match obj.class.as_str() {
        "LogisticRegression" | "LogisticRegressionCV" => true,
        "SGDClassifier" => matches!(obj.str_attr("loss"), Some("log_loss") | Some("log")),
        _ => false,
    }
}

/// Extract weights, intercepts, and capabilities from an estimator object.
pub(crate) fn linear_params(obj: &RawObject) -> ConvertResult<LinearParams> {
    let coef = obj
        .attr("coef_")
        .ok_or_else(|| ConvertError::not_linear(format!("{} has no 'coef_'", obj.class)))?;
    let coef = parse_coef(coef)?;
    let intercept = parse_intercept(obj, coef.rows())?;
    let n_classes = obj
        .attr("classes_")
        .and_then(Value::as_array)
        .map(Vec::len);
    Ok(LinearParams {
        class_name: obj.class.clone(),
        coef,
        intercept,
        family: family_of(obj),
        has_proba: has_proba(obj),
        n_classes,
    })
}

fn vector_attr(obj: &RawObject, key: &str) -> ConvertResult<Option<Vec<f64>>> {
    match obj.attr(key) {
        None => Ok(None),
        Some(v) => number_vector(v).map(Some).ok_or_else(|| {
            ConvertError::pipeline(format!("{} '{}' is not a numeric array", obj.class, key))
        }),
    }
}

fn required_vector(obj: &RawObject, key: &str) -> ConvertResult<Vec<f64>> {
    vector_attr(obj, key)?.ok_or_else(|| {
        ConvertError::pipeline(format!("{} has no '{}' parameters", obj.class, key))
    })
}

/// Recognize a supported scaler class and read its fitted parameters.
pub(crate) fn scaler_stage(obj: &RawObject) -> ConvertResult<Option<ScalerStage>> {
    let stage = match obj.class.as_str() {
        "StandardScaler" => ScalerStage::Standard {
            mean: vector_attr(obj, "mean_")?,
            scale: vector_attr(obj, "scale_")?,
            with_mean: obj.bool_attr("with_mean").unwrap_or(true),
            with_std: obj.bool_attr("with_std").unwrap_or(true),
        },
        "MinMaxScaler" => ScalerStage::MinMax {
            min: required_vector(obj, "min_")?,
            scale: required_vector(obj, "scale_")?,
        },
        "RobustScaler" => ScalerStage::Robust {
            center: vector_attr(obj, "center_")?,
            scale: vector_attr(obj, "scale_")?,
            with_centering: obj.bool_attr("with_centering").unwrap_or(true),
            with_scaling: obj.bool_attr("with_scaling").unwrap_or(true),
        },
        "MaxAbsScaler" => ScalerStage::MaxAbs {
            scale: required_vector(obj, "scale_")?,
        },
        _ => return Ok(None),
    };
    Ok(Some(stage))
}
