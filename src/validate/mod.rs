//! Equivalence validator: checks a converted estimator against its original.
//!
//! Both sides see the same seeded standard-normal samples. The original side
//! scales them with the original scaler and asks the original estimator; the
//! converted side scales them with the extracted `ScalingParams` and
//! evaluates the artifact's formulas. Any disagreement beyond the tolerance,
//! and any label disagreement at all, fails the check.

mod formula;
mod reference;
#[cfg(test)]
mod tests;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::Serialize;

use crate::classify::Kind;
use crate::error::{ConvertError, ConvertResult, MismatchKind, ValidationFailure};
use crate::repr::{EstimatorRepr, ScalingParams};

pub use formula::{affine, argmax, sigmoid, softmax, Output};
pub use reference::{reference_for, ReferenceEstimator};

// ─── Options ───────────────────────────────────────────────────────

/// Validation parameters.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ValidationOptions {
    /// Maximum absolute difference for values and probabilities.
    pub tolerance: f64,
    /// Number of random feature vectors drawn.
    pub sample_count: usize,
    /// Seed for the sample generator.
    pub seed: u64,
}

impl ValidationOptions {
    /// Reject options under which the check would compare nothing.
    pub fn check(&self) -> ConvertResult<()> {
        if !(self.tolerance >= 0.0) {
            return Err(ConvertError::InvalidConfig(format!(
                "tolerance must be non-negative, got {}",
                self.tolerance
            )));
        }
        if self.sample_count == 0 {
            return Err(ConvertError::InvalidConfig(
                "sample_count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            sample_count: 32,
            seed: 0,
        }
    }
}

// ─── Original Model Interface ──────────────────────────────────────

/// One prediction from the original estimator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Prediction {
    Value(f64),
    Label(usize),
}

impl Prediction {
    fn as_value(&self) -> f64 {
        match self {
            Prediction::Value(v) => *v,
            Prediction::Label(l) => *l as f64,
        }
    }

    fn as_label(&self) -> Option<usize> {
        match self {
            Prediction::Label(l) => Some(*l),
            Prediction::Value(_) => None,
        }
    }
}

/// The original estimator's prediction functions.
pub trait Predictor {
    /// Whether `predict_proba` is available.
    fn supports_proba(&self) -> bool;

    fn predict(&self, rows: &[Vec<f64>]) -> ConvertResult<Vec<Prediction>>;

    /// Per-class probabilities, one row per input.
    fn predict_proba(&self, rows: &[Vec<f64>]) -> ConvertResult<Vec<Vec<f64>>>;
}

/// The original scaler's transform.
pub trait Transformer {
    fn transform(&self, rows: &[Vec<f64>]) -> ConvertResult<Vec<Vec<f64>>>;
}

// ─── Report ────────────────────────────────────────────────────────

/// Outcome of an equivalence check.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ValidationReport {
    pub kind: Kind,
    pub sample_count: usize,
    pub tolerance: f64,
    /// Largest absolute difference seen on values or probabilities.
    pub max_abs_diff: f64,
    /// Samples that exceeded the tolerance or disagreed on the label.
    pub mismatched_count: usize,
    pub mismatch: Option<MismatchKind>,
    pub passed: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub detail: String,
}

impl ValidationReport {
    /// Turn a failing report into `ConvertError::Validation`.
    pub fn into_result(self) -> ConvertResult<Self> {
        match self.mismatch {
            None => Ok(self),
            Some(mismatch) => Err(ConvertError::Validation(ValidationFailure {
                mismatch,
                max_abs_diff: self.max_abs_diff,
                mismatched_count: self.mismatched_count,
                sample_count: self.sample_count,
                detail: self.detail,
            })),
        }
    }

    /// Human-readable summary.
    pub fn format_report(&self) -> String {
        let mut out = String::new();
        let status = match self.mismatch {
            None => "PASS".to_string(),
            Some(m) => format!("FAIL ({})", m),
        };
        out.push_str(&format!("Equivalence check ({}): {}\n", self.kind, status));
        out.push_str(&format!(
            "  samples:    {} (tolerance {:e})\n",
            self.sample_count, self.tolerance
        ));
        out.push_str(&format!("  max diff:   {:.3e}\n", self.max_abs_diff));
        out.push_str(&format!(
            "  mismatched: {}/{}\n",
            self.mismatched_count, self.sample_count
        ));
        if !self.detail.is_empty() {
            out.push_str(&format!("  detail:     {}\n", self.detail));
        }
        out
    }
}

// ─── Sampling ──────────────────────────────────────────────────────

/// Draw `count` standard-normal feature vectors from a seeded generator.
pub fn sample_inputs(n_features: usize, count: usize, seed: u64) -> Vec<Vec<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            (0..n_features)
                .map(|_| rng.sample::<f64, _>(StandardNormal))
                .collect()
        })
        .collect()
}

// ─── Validation ────────────────────────────────────────────────────

/// Check `estimator` (with `scaling`) against the original model, failing
/// with `ConvertError::Validation` on any disagreement.
pub fn validate(
    estimator: &EstimatorRepr,
    scaling: Option<&ScalingParams>,
    original: &dyn Predictor,
    original_scaler: Option<&dyn Transformer>,
    options: &ValidationOptions,
) -> ConvertResult<ValidationReport> {
    compare(estimator, scaling, original, original_scaler, options)?.into_result()
}

/// Run the equivalence check and report the result without failing on a
/// mismatch. Errors are reserved for unusable options and for a scaler or
/// estimator that cannot run.
///
/// The converted side uses the constants as the artifact prints them, so
/// precision lost in formatting shows up as a mismatch.
pub fn compare(
    estimator: &EstimatorRepr,
    scaling: Option<&ScalingParams>,
    original: &dyn Predictor,
    original_scaler: Option<&dyn Transformer>,
    options: &ValidationOptions,
) -> ConvertResult<ValidationReport> {
    options.check()?;
    let estimator = &estimator.as_emitted();
    let scaling = scaling.map(ScalingParams::as_emitted);
    let scaling = scaling.as_ref();
    let kind = estimator.kind();
    let samples = sample_inputs(estimator.n_features(), options.sample_count, options.seed);
    let scaled = match original_scaler {
        Some(t) => t.transform(&samples)?,
        None => samples.clone(),
    };

    let mut report = ValidationReport {
        kind,
        sample_count: samples.len(),
        tolerance: options.tolerance,
        max_abs_diff: 0.0,
        mismatched_count: 0,
        mismatch: None,
        passed: false,
        detail: String::new(),
    };

    let outputs: Vec<Output> = samples
        .iter()
        .map(|x| estimator.evaluate(scaling, x))
        .collect();

    if kind != Kind::Regression && !original.supports_proba() {
        report.mismatch = Some(MismatchKind::MissingCapability);
        report.detail = format!(
            "original {} estimator has no predict_proba to compare against",
            kind
        );
        return Ok(report);
    }

    let expected = original.predict(&scaled)?;
    match kind {
        Kind::Regression => {
            for (out, want) in outputs.iter().zip(&expected) {
                let got = match out {
                    Output::Value(v) => *v,
                    _ => continue,
                };
                let diff = (got - want.as_value()).abs();
                report.max_abs_diff = report.max_abs_diff.max(diff);
                if !(diff <= options.tolerance) {
                    report.mismatched_count += 1;
                }
            }
            if report.mismatched_count > 0 {
                report.mismatch = Some(MismatchKind::ValueMismatch);
            }
        }
        Kind::BinaryClassification | Kind::MulticlassClassification => {
            let proba = original.predict_proba(&scaled)?;
            let mut labels_disagree = 0;
            let mut probs_disagree = false;
            for (i, out) in outputs.iter().enumerate() {
                let mine = match out {
                    Output::Probability(p) => vec![1.0 - p, *p],
                    Output::Class(_) => softmax(&estimator.scores(&scaled_for(scaling, &samples[i]))),
                    Output::Value(v) => vec![*v],
                };
                let theirs = &proba[i];
                if theirs.len() != mine.len() {
                    return Err(ConvertError::not_linear(format!(
                        "original estimator returned {} probabilities, expected {}",
                        theirs.len(),
                        mine.len()
                    )));
                }
                let diff = mine
                    .iter()
                    .zip(theirs)
                    .map(|(a, b)| (a - b).abs())
                    .fold(0.0, f64::max);
                report.max_abs_diff = report.max_abs_diff.max(diff);
                let over = !(diff <= options.tolerance);
                let label_differs = out.label() != expected[i].as_label();
                if over {
                    probs_disagree = true;
                }
                if label_differs {
                    labels_disagree += 1;
                }
                if over || label_differs {
                    report.mismatched_count += 1;
                }
            }
            if labels_disagree > 0 {
                report.mismatch = Some(MismatchKind::LabelMismatch);
                report.detail = format!("{} predicted labels differ", labels_disagree);
            } else if probs_disagree {
                report.mismatch = Some(MismatchKind::ProbabilityMismatch);
            }
        }
    }
    report.passed = report.mismatch.is_none();
    Ok(report)
}

fn scaled_for(scaling: Option<&ScalingParams>, x: &[f64]) -> Vec<f64> {
    match scaling {
        Some(s) => s.apply(x),
        None => x.to_vec(),
    }
}
