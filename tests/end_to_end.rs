use std::path::{Path, PathBuf};

use model2c::{convert_model, validate_model, ConvertError, ConvertOptions, Kind, ValidationOptions};

fn write_model(dir: &Path, name: &str, json: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, json).expect("write model");
    path
}

fn options(out: &Path) -> ConvertOptions {
    ConvertOptions {
        out_dir: out.to_path_buf(),
        ..ConvertOptions::default()
    }
}

fn artifacts(dir: &Path) -> Vec<PathBuf> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
        Err(_) => Vec::new(),
    }
}

const SCALED_LOGISTIC: &str = r#"{
  "class": "Pipeline",
  "steps": [
    ["scaler", {"class": "StandardScaler", "mean_": [5.8, 3.0, 3.7, 1.2],
                "scale_": [0.82, 0.43, 1.76, 0.76]}],
    ["clf", {"class": "LogisticRegression",
             "coef_": [[-1.0, 1.1, -1.7, -1.6], [0.5, -0.3, -0.2, -0.8], [0.5, -0.8, 1.9, 2.4]],
             "intercept_": [-0.2, 1.9, -1.7],
             "classes_": [0, 1, 2]}]
  ]
}"#;

#[test]
fn test_regression_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let model = write_model(
        dir.path(),
        "linear.json",
        r#"{"class": "LinearRegression", "coef_": [2.0, -1.0], "intercept_": 0.5}"#,
    );
    let outcome = convert_model(&model, &options(&dir.path().join("out"))).unwrap();
    assert_eq!(outcome.kind, Kind::Regression);
    let text = std::fs::read_to_string(&outcome.output_path).unwrap();
    assert!(text.contains("{ 2.0000000000f, -1.0000000000f }"));
    assert!(text.contains("PREDICT_MODEL_BIAS = 0.5000000000f;"));
    assert!(outcome.report.unwrap().passed);
}

#[test]
fn test_scaled_multiclass_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let model = write_model(dir.path(), "iris.json", SCALED_LOGISTIC);
    let outcome = convert_model(&model, &options(&dir.path().join("out"))).unwrap();
    assert_eq!(outcome.kind, Kind::MulticlassClassification);
    let text = outcome.artifact.text();
    assert!(text.contains("#define PREDICT_MODEL_N_FEATURES 4"));
    assert!(text.contains("#define PREDICT_MODEL_N_CLASSES 3"));
    assert!(text.contains("PREDICT_MODEL_MEAN"));
    let report = outcome.report.unwrap();
    assert_eq!(report.mismatched_count, 0);
    assert_eq!(report.sample_count, 32);
}

#[test]
fn test_binary_mapping_to_rust() {
    let dir = tempfile::tempdir().unwrap();
    let model = write_model(
        dir.path(),
        "binary.json",
        r#"{"model": {"class": "LogisticRegression", "coef_": [[0.4, -0.9]],
                      "intercept_": [0.25], "classes_": [0, 1]},
            "scaler": {"class": "RobustScaler", "center_": [1.0, 2.0], "scale_": [3.0, 0.5]}}"#,
    );
    let opts = ConvertOptions {
        target: "rust".to_string(),
        func_name: "churn_probability".to_string(),
        ..options(&dir.path().join("out"))
    };
    let outcome = convert_model(&model, &opts).unwrap();
    assert_eq!(outcome.kind, Kind::BinaryClassification);
    assert_eq!(outcome.output_path.extension().unwrap(), "rs");
    assert!(outcome
        .artifact
        .text()
        .contains("pub fn churn_probability(x: &[f32; N_FEATURES]) -> f32"));
}

#[test]
fn test_two_estimators_write_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let model = write_model(
        dir.path(),
        "stacked.json",
        r#"{"class": "Pipeline", "steps": [
            ["first", {"class": "Ridge", "coef_": [1.0], "intercept_": 0.0}],
            ["second", {"class": "Lasso", "coef_": [2.0], "intercept_": 0.0}]]}"#,
    );
    let out = dir.path().join("out");
    let err = convert_model(&model, &options(&out)).unwrap_err();
    assert!(matches!(err.root(), ConvertError::UnsupportedPipeline(_)));
    assert!(!err.is_validation_failure());
    assert!(artifacts(&out).is_empty());
}

#[test]
fn test_validation_failure_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let model = write_model(
        dir.path(),
        "ovr.json",
        r#"{"class": "SGDClassifier", "loss": "log_loss",
            "coef_": [[2.0, 0.0], [0.0, 2.0], [-2.0, -2.0]],
            "intercept_": [0.0, 0.0, 0.0], "classes_": [0, 1, 2]}"#,
    );
    let out = dir.path().join("out");
    let err = convert_model(&model, &options(&out)).unwrap_err();
    assert!(err.is_validation_failure(), "got {}", err);
    assert!(artifacts(&out).is_empty());

    // the same model converts when the check is skipped
    let opts = ConvertOptions {
        validate: false,
        ..options(&out)
    };
    let outcome = convert_model(&model, &opts).unwrap();
    assert!(outcome.report.is_none());
    assert_eq!(artifacts(&out).len(), 1);
}

#[test]
fn test_validate_only() {
    let dir = tempfile::tempdir().unwrap();
    let model = write_model(dir.path(), "iris.json", SCALED_LOGISTIC);
    let report = validate_model(&model, &ValidationOptions::default()).unwrap();
    assert!(report.passed);
    assert!(report.format_report().contains("PASS"));
    assert!(artifacts(dir.path()).iter().all(|p| p == &model));
}

#[test]
fn test_identical_inputs_identical_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let model = write_model(dir.path(), "iris.json", SCALED_LOGISTIC);
    let a = convert_model(&model, &options(&dir.path().join("a"))).unwrap();
    let b = convert_model(&model, &options(&dir.path().join("b"))).unwrap();
    assert_eq!(a.artifact.text(), b.artifact.text());
}
