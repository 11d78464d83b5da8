//! Reference runtime for exported models.
//!
//! Reproduces the training library's own `predict`, `predict_proba`, and
//! scaler `transform` from the raw exported attributes. This is the
//! "original model" side of the equivalence check, so it follows library
//! semantics even where they differ from the generated code: binary labels
//! come from `decision > 0`, and one-vs-rest models normalize per-class
//! sigmoids instead of taking a softmax.

use super::{Prediction, Predictor, Transformer};
use crate::error::{ConvertError, ConvertResult};
use crate::model::RawObject;
use crate::normalize::{Coef, Components, Family, LinearParams, ScalerStage};

/// How the library turns decision values into probabilities.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ProbaRule {
    None,
    Multinomial,
    OneVsRest,
}

/// A fitted linear estimator evaluated the way its library evaluates it.
#[derive(Clone, Debug)]
pub struct ReferenceEstimator {
    rows: Vec<Vec<f64>>,
    intercept: Vec<f64>,
    classifier: bool,
    proba: ProbaRule,
}

impl ReferenceEstimator {
    /// Build from an exported estimator object and its extracted parameters.
    pub fn new(obj: &RawObject, params: &LinearParams) -> Self {
        let rows = match &params.coef {
            Coef::Vector(w) => vec![w.clone()],
            Coef::Matrix(rows) => rows.clone(),
        };
        let classifier = params.family == Family::Classifier || rows.len() > 1;
        let proba = if !params.has_proba {
            ProbaRule::None
        } else if ovr_probabilities(obj) {
            ProbaRule::OneVsRest
        } else {
            ProbaRule::Multinomial
        };
        Self {
            rows,
            intercept: params.intercept.clone(),
            classifier,
            proba,
        }
    }

    /// The library's `decision_function`: `X @ coef.T + intercept`.
    fn decision(&self, x: &[f64]) -> Vec<f64> {
        self.rows
            .iter()
            .zip(&self.intercept)
            .map(|(w, b)| w.iter().zip(x).map(|(wi, xi)| wi * xi).sum::<f64>() + b)
            .collect()
    }

    fn check_width(&self, rows: &[Vec<f64>]) -> ConvertResult<()> {
        let width = self.rows.first().map_or(0, Vec::len);
        match rows.iter().find(|r| r.len() != width) {
            Some(r) => Err(ConvertError::not_linear(format!(
                "estimator expects {} features, got {}",
                width,
                r.len()
            ))),
            None => Ok(()),
        }
    }
}

/// SGD classifiers and `multi_class="ovr"` logistic models use one-vs-rest.
fn ovr_probabilities(obj: &RawObject) -> bool {
    obj.class == "SGDClassifier" || obj.str_attr("multi_class") == Some("ovr")
}

impl Predictor for ReferenceEstimator {
    fn supports_proba(&self) -> bool {
        self.proba != ProbaRule::None
    }

    fn predict(&self, rows: &[Vec<f64>]) -> ConvertResult<Vec<Prediction>> {
        self.check_width(rows)?;
        Ok(rows
            .iter()
            .map(|x| {
                let d = self.decision(x);
                if !self.classifier {
                    Prediction::Value(d[0])
                } else if d.len() == 1 {
                    Prediction::Label(usize::from(d[0] > 0.0))
                } else {
                    // numpy argmax: first maximum
                    let mut best = 0;
                    for (c, v) in d.iter().enumerate() {
                        if *v > d[best] {
                            best = c;
                        }
                    }
                    Prediction::Label(best)
                }
            })
            .collect())
    }

    fn predict_proba(&self, rows: &[Vec<f64>]) -> ConvertResult<Vec<Vec<f64>>> {
        if self.proba == ProbaRule::None {
            return Err(ConvertError::not_linear(
                "estimator does not expose predict_proba",
            ));
        }
        self.check_width(rows)?;
        Ok(rows
            .iter()
            .map(|x| {
                let d = self.decision(x);
                if d.len() == 1 {
                    let p = 1.0 / (1.0 + (-d[0]).exp());
                    return vec![1.0 - p, p];
                }
                match self.proba {
                    ProbaRule::OneVsRest => {
                        let p: Vec<f64> = d.iter().map(|v| 1.0 / (1.0 + (-v).exp())).collect();
                        let sum: f64 = p.iter().sum();
                        p.into_iter().map(|v| v / sum).collect()
                    }
                    _ => {
                        let max = d.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                        let e: Vec<f64> = d.iter().map(|v| (v - max).exp()).collect();
                        let sum: f64 = e.iter().sum();
                        e.into_iter().map(|v| v / sum).collect()
                    }
                }
            })
            .collect())
    }
}

impl Transformer for ScalerStage {
    fn transform(&self, rows: &[Vec<f64>]) -> ConvertResult<Vec<Vec<f64>>> {
        rows.iter().map(|x| self.transform_row(x)).collect()
    }
}

impl ScalerStage {
    fn transform_row(&self, x: &[f64]) -> ConvertResult<Vec<f64>> {
        let out: Vec<f64> = match self {
            ScalerStage::Standard {
                mean,
                scale,
                with_mean,
                with_std,
            } => {
                let centered = shift(x, mean.as_deref().filter(|_| *with_mean), self)?;
                divide(&centered, scale.as_deref().filter(|_| *with_std), self)?
            }
            ScalerStage::Robust {
                center,
                scale,
                with_centering,
                with_scaling,
            } => {
                let centered = shift(x, center.as_deref().filter(|_| *with_centering), self)?;
                divide(&centered, scale.as_deref().filter(|_| *with_scaling), self)?
            }
            ScalerStage::MinMax { min, scale } => {
                expect_width(x, min.len().min(scale.len()), self)?;
                x.iter()
                    .zip(scale.iter().zip(min))
                    .map(|(xi, (s, m))| xi * s + m)
                    .collect()
            }
            ScalerStage::MaxAbs { scale } => divide(x, Some(scale), self)?,
        };
        if let Some(i) = out.iter().position(|v| !v.is_finite()) {
            return Err(ConvertError::scaler(format!(
                "{} produced a non-finite value for feature {}",
                self.class_name(),
                i
            )));
        }
        Ok(out)
    }
}

fn expect_width(x: &[f64], width: usize, stage: &ScalerStage) -> ConvertResult<()> {
    if x.len() != width {
        return Err(ConvertError::scaler(format!(
            "{} was fitted on {} features, got {}",
            stage.class_name(),
            width,
            x.len()
        )));
    }
    Ok(())
}

fn shift(x: &[f64], by: Option<&[f64]>, stage: &ScalerStage) -> ConvertResult<Vec<f64>> {
    match by {
        Some(m) => {
            expect_width(x, m.len(), stage)?;
            Ok(x.iter().zip(m).map(|(xi, mi)| xi - mi).collect())
        }
        None => Ok(x.to_vec()),
    }
}

fn divide(x: &[f64], by: Option<&[f64]>, stage: &ScalerStage) -> ConvertResult<Vec<f64>> {
    match by {
        Some(s) => {
            expect_width(x, s.len(), stage)?;
            Ok(x.iter().zip(s).map(|(xi, si)| xi / si).collect())
        }
        None => Ok(x.to_vec()),
    }
}

/// Reference runtime for a normalized model's original components.
pub fn reference_for(
    original: &Components,
    params: &LinearParams,
) -> (ReferenceEstimator, Option<ScalerStage>) {
    (
        ReferenceEstimator::new(&original.estimator, params),
        original.scaler.clone(),
    )
}
