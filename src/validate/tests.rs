use super::*;
use crate::classify::classify;
use crate::model::parse_model;
use crate::normalize::{normalize, ScalerStage};

struct Prepared {
    repr: EstimatorRepr,
    scaling: Option<ScalingParams>,
    reference: ReferenceEstimator,
    scaler: Option<ScalerStage>,
}

fn prepare(text: &str) -> Prepared {
    let normalized = normalize(&parse_model(text).unwrap()).unwrap();
    let kind = classify(&normalized.estimator).unwrap();
    let repr = EstimatorRepr::from_params(&normalized.estimator, kind).unwrap();
    let (reference, scaler) = reference_for(&normalized.original, &normalized.estimator);
    Prepared {
        repr,
        scaling: normalized.scaler,
        reference,
        scaler,
    }
}

fn run(p: &Prepared) -> ConvertResult<ValidationReport> {
    validate(
        &p.repr,
        p.scaling.as_ref(),
        &p.reference,
        p.scaler.as_ref().map(|s| s as &dyn Transformer),
        &ValidationOptions::default(),
    )
}

const STANDARD: &str = r#"{"class": "StandardScaler", "mean_": [1.5, -2.0, 0.25],
    "scale_": [2.0, 0.5, 4.0]}"#;

// --- Sampling ---

#[test]
fn test_samples_are_seeded() {
    let a = sample_inputs(4, 32, 0);
    let b = sample_inputs(4, 32, 0);
    assert_eq!(a, b);
    assert_eq!(a.len(), 32);
    assert!(a.iter().all(|row| row.len() == 4));
    assert_ne!(a, sample_inputs(4, 32, 1));
}

#[test]
fn test_samples_look_standard_normal() {
    let rows = sample_inputs(1, 2000, 0);
    let mean: f64 = rows.iter().map(|r| r[0]).sum::<f64>() / rows.len() as f64;
    assert!(mean.abs() < 0.1, "mean {}", mean);
}

// --- Round-trip fidelity ---

#[test]
fn test_regression_round_trip() {
    let p = prepare(r#"{"class": "Ridge", "coef_": [2.0, -1.0, 0.75], "intercept_": 0.5}"#);
    let report = run(&p).unwrap();
    assert!(report.passed);
    assert_eq!(report.kind, Kind::Regression);
    assert_eq!(report.sample_count, 32);
    assert_eq!(report.mismatched_count, 0);
    assert!(report.max_abs_diff <= 1e-6);
}

#[test]
fn test_regression_with_standard_scaler() {
    let p = prepare(&format!(
        r#"{{"class": "Pipeline", "steps": [["scale", {}],
            ["reg", {{"class": "LinearRegression", "coef_": [0.3, -1.1, 2.0],
                     "intercept_": -0.4}}]]}}"#,
        STANDARD
    ));
    assert!(p.scaling.is_some());
    assert!(run(&p).unwrap().passed);
}

#[test]
fn test_binary_round_trip() {
    let p = prepare(
        r#"{"class": "LogisticRegression", "coef_": [[0.8, -1.2, 0.3]],
            "intercept_": [0.1], "classes_": [0, 1]}"#,
    );
    let report = run(&p).unwrap();
    assert_eq!(report.kind, Kind::BinaryClassification);
    assert_eq!(report.mismatched_count, 0);
}

#[test]
fn test_binary_with_min_max_scaler() {
    let p = prepare(
        r#"{"model": {"class": "LogisticRegression", "coef_": [[1.5, -0.5]],
                      "intercept_": [-0.2], "classes_": [0, 1]},
            "scaler": {"class": "MinMaxScaler", "min_": [0.5, -1.0], "scale_": [0.25, 2.0]}}"#,
    );
    assert!(run(&p).unwrap().passed);
}

#[test]
fn test_multiclass_round_trip() {
    let p = prepare(&format!(
        r#"{{"class": "Pipeline", "steps": [["scale", {}],
            ["clf", {{"class": "LogisticRegression",
                     "coef_": [[1.0, 0.0, -0.5], [0.0, 1.0, 0.5], [-1.0, -1.0, 0.0]],
                     "intercept_": [0.2, -0.1, 0.0], "classes_": [0, 1, 2]}}]]}}"#,
        STANDARD
    ));
    let report = run(&p).unwrap();
    assert_eq!(report.kind, Kind::MulticlassClassification);
    assert!(report.passed);
}

#[test]
fn test_bias_dominated_multiclass() {
    let p = prepare(
        r#"{"class": "LogisticRegression", "coef_": [[0, 0], [0, 0], [0, 0]],
            "intercept_": [0, 5, -5], "classes_": [0, 1, 2]}"#,
    );
    assert!(run(&p).unwrap().passed);
}

// --- Failures ---

#[test]
fn test_unscaled_formula_diverges_from_scaled_original() {
    let p = prepare(&format!(
        r#"{{"class": "Pipeline", "steps": [["scale", {}],
            ["reg", {{"class": "Ridge", "coef_": [1.0, 1.0, 1.0], "intercept_": 0.0}}]]}}"#,
        STANDARD
    ));
    let err = validate(
        &p.repr,
        None,
        &p.reference,
        p.scaler.as_ref().map(|s| s as &dyn Transformer),
        &ValidationOptions::default(),
    )
    .unwrap_err();
    match err {
        ConvertError::Validation(f) => {
            assert_eq!(f.mismatch, MismatchKind::ValueMismatch);
            assert_eq!(f.mismatched_count, 32);
            assert!(f.max_abs_diff > 1e-6);
        }
        other => panic!("expected validation failure, got {}", other),
    }
}

#[test]
fn test_classifier_without_proba_is_missing_capability() {
    let p = prepare(
        r#"{"class": "RidgeClassifier", "coef_": [[0.5, -0.5]], "intercept_": [0.0],
            "classes_": [0, 1]}"#,
    );
    assert!(!p.reference.supports_proba());
    let report = compare(
        &p.repr,
        None,
        &p.reference,
        None,
        &ValidationOptions::default(),
    )
    .unwrap();
    assert_eq!(report.mismatch, Some(MismatchKind::MissingCapability));
    assert!(matches!(
        report.into_result(),
        Err(ConvertError::Validation(ValidationFailure {
            mismatch: MismatchKind::MissingCapability,
            ..
        }))
    ));
}

#[test]
fn test_one_vs_rest_probabilities_do_not_match_softmax() {
    let p = prepare(
        r#"{"class": "LogisticRegression", "multi_class": "ovr",
            "coef_": [[1.0, 0.0], [0.0, 1.0], [-1.0, -1.0]],
            "intercept_": [0.0, 0.0, 0.0], "classes_": [0, 1, 2]}"#,
    );
    let report = compare(
        &p.repr,
        None,
        &p.reference,
        None,
        &ValidationOptions::default(),
    )
    .unwrap();
    // argmax agrees, only the probabilities differ
    assert_eq!(report.mismatch, Some(MismatchKind::ProbabilityMismatch));
    assert!(report.max_abs_diff > 1e-3);
}

struct FlippedLabels(ReferenceEstimator);

impl Predictor for FlippedLabels {
    fn supports_proba(&self) -> bool {
        self.0.supports_proba()
    }

    fn predict(&self, rows: &[Vec<f64>]) -> ConvertResult<Vec<Prediction>> {
        Ok(self
            .0
            .predict(rows)?
            .into_iter()
            .map(|p| match p {
                Prediction::Label(l) => Prediction::Label(1 - l),
                other => other,
            })
            .collect())
    }

    fn predict_proba(&self, rows: &[Vec<f64>]) -> ConvertResult<Vec<Vec<f64>>> {
        self.0.predict_proba(rows)
    }
}

#[test]
fn test_label_disagreement_is_hard_failure() {
    let p = prepare(
        r#"{"class": "LogisticRegression", "coef_": [[1.0, 1.0]], "intercept_": [0.0],
            "classes_": [0, 1]}"#,
    );
    let flipped = FlippedLabels(p.reference.clone());
    let err = validate(&p.repr, None, &flipped, None, &ValidationOptions::default()).unwrap_err();
    assert!(err.is_validation_failure());
    match err {
        ConvertError::Validation(f) => {
            assert_eq!(f.mismatch, MismatchKind::LabelMismatch);
            assert_eq!(f.mismatched_count, 32);
            assert!(f.max_abs_diff <= 1e-6, "probabilities still agree");
        }
        other => panic!("unexpected {}", other),
    }
}

#[test]
fn test_scaler_width_error_is_transform_failure() {
    let repr = EstimatorRepr::Regression {
        weights: vec![1.0, 1.0],
        bias: 0.0,
    };
    let reference = prepare(r#"{"class": "Ridge", "coef_": [1.0, 1.0], "intercept_": 0.0}"#)
        .reference;
    let scaler = ScalerStage::MaxAbs { scale: vec![2.0] };
    let err = validate(
        &repr,
        None,
        &reference,
        Some(&scaler),
        &ValidationOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, ConvertError::ScalerTransform(_)));
}

#[test]
fn test_loose_tolerance_accepts_float_noise() {
    let p = prepare(r#"{"class": "Ridge", "coef_": [1e3, -1e3], "intercept_": 1e3}"#);
    let options = ValidationOptions {
        tolerance: 1e-3,
        sample_count: 8,
        seed: 7,
    };
    let report = validate(&p.repr, None, &p.reference, None, &options).unwrap();
    assert_eq!(report.sample_count, 8);
}

#[test]
fn test_tiny_scale_precision_loss_is_value_mismatch() {
    let p = prepare(
        r#"{"class": "Pipeline", "steps": [
            ["scale", {"class": "StandardScaler", "mean_": [0.0, 0.0],
                       "scale_": [1.23456e-6, 1.0]}],
            ["reg", {"class": "Ridge", "coef_": [1.0, 1.0], "intercept_": 0.0}]]}"#,
    );
    let report = compare(
        &p.repr,
        p.scaling.as_ref(),
        &p.reference,
        p.scaler.as_ref().map(|s| s as &dyn Transformer),
        &ValidationOptions::default(),
    )
    .unwrap();
    assert_eq!(report.mismatch, Some(MismatchKind::ValueMismatch));
    assert!(report.max_abs_diff > 1.0);
}

#[test]
fn test_zero_samples_are_rejected() {
    let p = prepare(r#"{"class": "Ridge", "coef_": [1.0], "intercept_": 0.0}"#);
    let options = ValidationOptions {
        sample_count: 0,
        ..ValidationOptions::default()
    };
    let err = compare(&p.repr, None, &p.reference, None, &options).unwrap_err();
    assert!(matches!(err, ConvertError::InvalidConfig(_)));
    assert!(!err.is_validation_failure());
}

#[test]
fn test_negative_or_nan_tolerance_is_rejected() {
    let p = prepare(r#"{"class": "Ridge", "coef_": [1.0], "intercept_": 0.0}"#);
    for tolerance in [-1e-6, f64::NAN] {
        let options = ValidationOptions {
            tolerance,
            ..ValidationOptions::default()
        };
        assert!(matches!(
            validate(&p.repr, None, &p.reference, None, &options),
            Err(ConvertError::InvalidConfig(_))
        ));
    }
}

// --- Reference runtime ---

#[test]
fn test_reference_binary_label_uses_decision_sign() {
    let p = prepare(
        r#"{"class": "LogisticRegression", "coef_": [[1.0]], "intercept_": [0.0],
            "classes_": [0, 1]}"#,
    );
    let labels = p.reference.predict(&[vec![-0.1], vec![0.1]]).unwrap();
    assert_eq!(labels, vec![Prediction::Label(0), Prediction::Label(1)]);
    let proba = p.reference.predict_proba(&[vec![0.0]]).unwrap();
    assert_eq!(proba, vec![vec![0.5, 0.5]]);
}

#[test]
fn test_standard_scaler_respects_switches() {
    let scaler = ScalerStage::Standard {
        mean: Some(vec![10.0]),
        scale: Some(vec![2.0]),
        with_mean: false,
        with_std: true,
    };
    assert_eq!(scaler.transform(&[vec![4.0]]).unwrap(), vec![vec![2.0]]);
}

// --- Report ---

#[test]
fn test_format_report() {
    let report = ValidationReport {
        kind: Kind::BinaryClassification,
        sample_count: 32,
        tolerance: 1e-6,
        max_abs_diff: 0.0,
        mismatched_count: 0,
        mismatch: None,
        passed: true,
        detail: String::new(),
    };
    let text = report.format_report();
    assert!(text.starts_with("Equivalence check (binary classification): PASS"));
    assert!(text.contains("mismatched: 0/32"));
    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("\"kind\":\"binary_classification\""), "{}", json);
}
