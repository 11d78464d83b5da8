//! The inference formulas, evaluated in `f64`.
//!
//! These mirror the generated code statement for statement: scale, start
//! from the bias, accumulate `w[i] * x[i]` in feature order, then apply the
//! kind's output step.

use crate::codegen::emitted_value;
use crate::repr::{EstimatorRepr, ScalingParams};

/// What the generated function returns for one input.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Output {
    /// Regression score.
    Value(f64),
    /// Probability of class 1.
    Probability(f64),
    /// Winning class index.
    Class(usize),
}

impl Output {
    /// Label for classifier outputs, thresholding probabilities at 0.5.
    pub fn label(&self) -> Option<usize> {
        match self {
            Output::Value(_) => None,
            Output::Probability(p) => Some(usize::from(*p >= 0.5)),
            Output::Class(c) => Some(*c),
        }
    }
}

/// `bias + sum(w[i] * x[i])`, accumulated in feature order.
pub fn affine(weights: &[f64], bias: f64, x: &[f64]) -> f64 {
    let mut s = bias;
    for (w, xi) in weights.iter().zip(x) {
        s += w * xi;
    }
    s
}

pub fn sigmoid(s: f64) -> f64 {
    1.0 / (1.0 + (-s).exp())
}

/// Softmax with the row maximum subtracted before exponentiating.
pub fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Index of the largest score; on ties the lowest index wins.
pub fn argmax(scores: &[f64]) -> usize {
    let mut best = 0;
    for c in 1..scores.len() {
        if scores[c] > scores[best] {
            best = c;
        }
    }
    best
}

fn emitted_all(values: &[f64]) -> Vec<f64> {
    values.iter().map(|v| emitted_value(*v)).collect()
}

impl ScalingParams {
    /// The scaling constants as the artifact writes them.
    pub fn as_emitted(&self) -> ScalingParams {
        ScalingParams {
            mean: emitted_all(&self.mean),
            scale: emitted_all(&self.scale),
        }
    }
}

impl EstimatorRepr {
    /// The coefficients as the artifact writes them.
    pub fn as_emitted(&self) -> EstimatorRepr {
        match self {
            EstimatorRepr::Regression { weights, bias } => EstimatorRepr::Regression {
                weights: emitted_all(weights),
                bias: emitted_value(*bias),
            },
            EstimatorRepr::BinaryClassifier { weights, bias } => EstimatorRepr::BinaryClassifier {
                weights: emitted_all(weights),
                bias: emitted_value(*bias),
            },
            EstimatorRepr::MulticlassClassifier { weights, biases } => {
                EstimatorRepr::MulticlassClassifier {
                    weights: weights.iter().map(|row| emitted_all(row)).collect(),
                    biases: emitted_all(biases),
                }
            }
        }
    }

    /// Affine scores, one per weight row.
    pub fn scores(&self, x: &[f64]) -> Vec<f64> {
        match self {
            EstimatorRepr::Regression { weights, bias }
            | EstimatorRepr::BinaryClassifier { weights, bias } => {
                vec![affine(weights, *bias, x)]
            }
            EstimatorRepr::MulticlassClassifier { weights, biases } => weights
                .iter()
                .zip(biases)
                .map(|(w, b)| affine(w, *b, x))
                .collect(),
        }
    }

    /// Evaluate the generated function's formula on one raw input.
    pub fn evaluate(&self, scaling: Option<&ScalingParams>, x: &[f64]) -> Output {
        let scaled;
        let x = match scaling {
            Some(s) => {
                scaled = s.apply(x);
                scaled.as_slice()
            }
            None => x,
        };
        match self {
            EstimatorRepr::Regression { weights, bias } => Output::Value(affine(weights, *bias, x)),
            EstimatorRepr::BinaryClassifier { weights, bias } => {
                Output::Probability(sigmoid(affine(weights, *bias, x)))
            }
            EstimatorRepr::MulticlassClassifier { .. } => Output::Class(argmax(&self.scores(x))),
        }
    }
}
