//! Model normalizer: unwraps a raw export into {estimator, scaler}.
//!
//! Pipelines are walked as a sequence of tagged stages. Scaler stages
//! contribute `ScalingParams`, exactly one other stage must be the estimator,
//! and anything ambiguous is a hard error rather than a guess.

mod extract;

use serde_json::Value;

use crate::error::{ConvertError, ConvertResult};
use crate::model::{parse_step, RawModel, RawObject, RawStep};
use crate::repr::ScalingParams;

// ─── Normalized Types ──────────────────────────────────────────────

/// Estimator weights as exported: one vector, or one row per output.
#[derive(Clone, Debug, PartialEq)]
pub enum Coef {
    Vector(Vec<f64>),
    Matrix(Vec<Vec<f64>>),
}

impl Coef {
    pub fn rank(&self) -> usize {
        match self {
            Coef::Vector(_) => 1,
            Coef::Matrix(_) => 2,
        }
    }

    /// Row count (1 for a vector).
    pub fn rows(&self) -> usize {
        match self {
            Coef::Vector(_) => 1,
            Coef::Matrix(rows) => rows.len(),
        }
    }

    pub fn n_features(&self) -> usize {
        match self {
            Coef::Vector(w) => w.len(),
            Coef::Matrix(rows) => rows.first().map_or(0, Vec::len),
        }
    }

    pub fn shape_label(&self) -> String {
        match self {
            Coef::Vector(w) => format!("({},)", w.len()),
            Coef::Matrix(rows) => format!("({}, {})", rows.len(), self.n_features()),
        }
    }
}

/// Declared model family, used to tell a regressor from a classifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Family {
    Regressor,
    Classifier,
    Untagged,
}

/// Everything the classifier needs to know about an estimator.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearParams {
    pub class_name: String,
    pub coef: Coef,
    pub intercept: Vec<f64>,
    pub family: Family,
    /// Whether the original estimator can produce class probabilities.
    pub has_proba: bool,
    /// Length of `classes_`, when exported.
    pub n_classes: Option<usize>,
}

/// A recognized scaler, with its fitted parameters in library form.
#[derive(Clone, Debug, PartialEq)]
pub enum ScalerStage {
    /// `(x - mean) / scale`, each step switchable.
    Standard {
        mean: Option<Vec<f64>>,
        scale: Option<Vec<f64>>,
        with_mean: bool,
        with_std: bool,
    },
    /// `x * scale + min`.
    MinMax { min: Vec<f64>, scale: Vec<f64> },
    /// `(x - center) / scale`, each step switchable.
    Robust {
        center: Option<Vec<f64>>,
        scale: Option<Vec<f64>>,
        with_centering: bool,
        with_scaling: bool,
    },
    /// `x / scale`.
    MaxAbs { scale: Vec<f64> },
}

/// A pipeline stage after recognition.
#[derive(Clone, Debug, PartialEq)]
pub enum Stage {
    Scaler(ScalerStage),
    Estimator(RawObject),
    Unknown(RawObject),
    Passthrough,
}

/// The original components of a model, unwrapped but not yet interpreted.
#[derive(Clone, Debug, PartialEq)]
pub struct Components {
    pub estimator: RawObject,
    pub scaler: Option<ScalerStage>,
}

/// Output of the normalizer.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedModel {
    pub estimator: LinearParams,
    pub scaler: Option<ScalingParams>,
    /// The unwrapped library objects, kept for the reference runtime.
    pub original: Components,
}

// ─── Entry Points ──────────────────────────────────────────────────

/// Normalize a raw model into linear parameters plus optional scaling.
pub fn normalize(raw: &RawModel) -> ConvertResult<NormalizedModel> {
    let original = unwrap_model(raw)?;
    let estimator = extract::linear_params(&original.estimator)?;
    let scaler = match &original.scaler {
        Some(stage) => {
            let params = stage.to_params(estimator.coef.n_features())?;
            if params.n_features() != estimator.coef.n_features() {
                return Err(ConvertError::pipeline(format!(
                    "scaler has {} features but the estimator expects {}",
                    params.n_features(),
                    estimator.coef.n_features()
                )));
            }
            Some(params)
        }
        None => None,
    };
    Ok(NormalizedModel {
        estimator,
        scaler,
        original,
    })
}

/// Split a raw model into its estimator object and optional scaler.
pub fn unwrap_model(raw: &RawModel) -> ConvertResult<Components> {
    match raw {
        RawModel::Estimator(obj) => Ok(Components {
            estimator: obj.clone(),
            scaler: None,
        }),
        RawModel::Pipeline(steps) => unwrap_pipeline(steps),
        RawModel::Mapping(map) => {
            let model = map.get("model").ok_or(ConvertError::MissingModelKey)?;
            let estimator = match parse_step(model.clone()) {
                Some(RawStep::Object(obj)) => obj,
                _ => {
                    return Err(ConvertError::not_linear(
                        "'model' entry is not an exported estimator object",
                    ))
                }
            };
            let scaler = match map.get("scaler") {
                None | Some(Value::Null) => None,
                Some(value) => match parse_step(value.clone()) {
                    Some(RawStep::Passthrough) => None,
                    Some(RawStep::Object(obj)) => match recognize(&obj)? {
                        Stage::Scaler(stage) => Some(stage),
                        _ => {
                            return Err(ConvertError::pipeline(format!(
                                "'scaler' entry {} is not a supported scaler",
                                obj.class
                            )))
                        }
                    },
                    None => {
                        return Err(ConvertError::pipeline(
                            "'scaler' entry is not an exported object",
                        ))
                    }
                },
            };
            Ok(Components { estimator, scaler })
        }
    }
}

fn unwrap_pipeline(steps: &[(String, RawStep)]) -> ConvertResult<Components> {
    let mut scaler: Option<(String, ScalerStage)> = None;
    let mut estimator: Option<(String, Stage)> = None;

    for (name, step) in steps {
        let stage = match step {
            RawStep::Passthrough => Stage::Passthrough,
            RawStep::Object(obj) => recognize(obj)?,
        };
        match stage {
            Stage::Passthrough => {}
            Stage::Scaler(s) => {
                if let Some((prev, _)) = &scaler {
                    return Err(ConvertError::pipeline(format!(
                        "more than one scaler stage ('{}' and '{}')",
                        prev, name
                    )));
                }
                if let Some((est, _)) = &estimator {
                    return Err(ConvertError::pipeline(format!(
                        "scaler '{}' comes after estimator '{}'",
                        name, est
                    )));
                }
                scaler = Some((name.clone(), s));
            }
            other => {
                if let Some((prev, _)) = &estimator {
                    return Err(ConvertError::pipeline(format!(
                        "ambiguous pipeline: stages '{}' and '{}' are both non-scaler stages",
                        prev, name
                    )));
                }
                estimator = Some((name.clone(), other));
            }
        }
    }

    let estimator = match estimator {
        Some((_, Stage::Estimator(obj))) => obj,
        Some((name, Stage::Unknown(obj))) => {
            return Err(ConvertError::pipeline(format!(
                "no estimator stage: '{}' ({}) is not a linear estimator",
                name, obj.class
            )))
        }
        _ => return Err(ConvertError::pipeline("pipeline has no estimator stage")),
    };
    Ok(Components {
        estimator,
        scaler: scaler.map(|(_, s)| s),
    })
}

/// Tag a library object as scaler, estimator, or unknown stage.
pub fn recognize(obj: &RawObject) -> ConvertResult<Stage> {
    if let Some(stage) = extract::scaler_stage(obj)? {
        return Ok(Stage::Scaler(stage));
    }
    if obj.attr("coef_").is_some() || extract::family_of(obj) != Family::Untagged {
        return Ok(Stage::Estimator(obj.clone()));
    }
    Ok(Stage::Unknown(obj.clone()))
}

impl ScalerStage {
    /// Convert the library parameters to `(x - mean) / scale` form.
    ///
    /// `n_features` fills in identity parameters for steps that are
    /// switched off and were not exported.
    pub fn to_params(&self, n_features: usize) -> ConvertResult<ScalingParams> {
        match self {
            ScalerStage::Standard {
                mean,
                scale,
                with_mean,
                with_std,
            } => {
                let mean = switchable(mean, *with_mean, 0.0, n_features, "mean_")?;
                let scale = switchable(scale, *with_std, 1.0, n_features, "scale_")?;
                ScalingParams::new(mean, scale)
            }
            ScalerStage::Robust {
                center,
                scale,
                with_centering,
                with_scaling,
            } => {
                let center = switchable(center, *with_centering, 0.0, n_features, "center_")?;
                let scale = switchable(scale, *with_scaling, 1.0, n_features, "scale_")?;
                ScalingParams::new(center, scale)
            }
            ScalerStage::MinMax { min, scale } => {
                if min.len() != scale.len() {
                    return Err(ConvertError::pipeline(
                        "MinMaxScaler min_ and scale_ lengths differ",
                    ));
                }
                if let Some(i) = scale.iter().position(|s| *s == 0.0) {
                    return Err(ConvertError::pipeline(format!(
                        "MinMaxScaler scale_[{}] is zero",
                        i
                    )));
                }
                // x * s + m == (x - (-m / s)) / (1 / s)
                let mean = min.iter().zip(scale).map(|(m, s)| -m / s).collect();
                let scale = scale.iter().map(|s| 1.0 / s).collect();
                ScalingParams::new(mean, scale)
            }
            ScalerStage::MaxAbs { scale } => ScalingParams::new(vec![0.0; scale.len()], scale.clone()),
        }
    }

    pub fn class_name(&self) -> &'static str {
        match self {
            ScalerStage::Standard { .. } => "StandardScaler",
            ScalerStage::MinMax { .. } => "MinMaxScaler",
            ScalerStage::Robust { .. } => "RobustScaler",
            ScalerStage::MaxAbs { .. } => "MaxAbsScaler",
        }
    }
}

fn switchable(
    values: &Option<Vec<f64>>,
    enabled: bool,
    identity: f64,
    n_features: usize,
    name: &str,
) -> ConvertResult<Vec<f64>> {
    match (enabled, values) {
        (false, Some(v)) => Ok(vec![identity; v.len()]),
        (false, None) => Ok(vec![identity; n_features]),
        (true, Some(v)) => Ok(v.clone()),
        (true, None) => Err(ConvertError::pipeline(format!(
            "scaler is enabled but has no '{}' parameters",
            name
        ))),
    }
}
