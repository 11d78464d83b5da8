//! Conversion driver: load → normalize → classify → generate → validate → write.
//!
//! This is the only layer with side effects. It reads model files, logs
//! progress, and writes artifacts. Everything below it is pure.


use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::classify::{classify, Kind};
use crate::codegen::{generate, ConversionArtifact, DEFAULT_FUNC_NAME};
use crate::error::{ConvertError, ConvertResult};
use crate::model::{load_model_bytes, RawModel};
use crate::normalize::{normalize, NormalizedModel};
use crate::repr::EstimatorRepr;
use crate::validate::{self, reference_for, Transformer, ValidationOptions, ValidationReport};

/// Options controlling one conversion.
#[derive(Clone, Debug)]
pub struct ConvertOptions {
    /// Name of the generated inference function.
    pub func_name: String,
    /// Output language ("c" or "rust").
    pub target: String,
    /// Directory for generated artifacts.
    pub out_dir: PathBuf,
    /// Explicit artifact path; overrides `out_dir` and the generated name.
    pub output: Option<PathBuf>,
    /// Run the equivalence check before writing.
    pub validate: bool,
    pub validation: ValidationOptions,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            func_name: DEFAULT_FUNC_NAME.to_string(),
            target: "c".to_string(),
            out_dir: PathBuf::from("./generated"),
            output: None,
            validate: true,
            validation: ValidationOptions::default(),
        }
    }
}

/// A model that has been normalized and classified, ready for generation.
#[derive(Clone, Debug)]
pub struct PreparedModel {
    pub normalized: NormalizedModel,
    pub kind: Kind,
    pub repr: EstimatorRepr,
}

impl PreparedModel {
    /// Class name of the estimator inside the model.
    pub fn class_name(&self) -> &str {
        &self.normalized.estimator.class_name
    }

    /// Check the converted estimator against the original components.
    ///
    /// Returns the report even when it records a mismatch.
    pub fn compare(&self, options: &ValidationOptions) -> ConvertResult<ValidationReport> {
        let (reference, scaler) = reference_for(&self.normalized.original, &self.normalized.estimator);
        validate::compare(
            &self.repr,
            self.normalized.scaler.as_ref(),
            &reference,
            scaler.as_ref().map(|s| s as &dyn Transformer),
            options,
        )
    }
}

/// Normalize and classify a raw model.
pub fn prepare(raw: &RawModel) -> ConvertResult<PreparedModel> {
    let normalized = normalize(raw)?;
    let kind = classify(&normalized.estimator)?;
    let repr = EstimatorRepr::from_params(&normalized.estimator, kind)?;
    Ok(PreparedModel {
        normalized,
        kind,
        repr,
    })
}

/// Convert an in-memory model without touching the filesystem.
///
/// Validation, when enabled, runs after generation and a failure discards
/// the artifact.
pub fn convert_raw(
    raw: &RawModel,
    options: &ConvertOptions,
) -> ConvertResult<(ConversionArtifact, Option<ValidationReport>)> {
    let prepared = prepare(raw)?;
    let artifact = generate(
        &prepared.repr,
        prepared.normalized.scaler.as_ref(),
        &options.func_name,
        &options.target,
    )?;
    let report = if options.validate {
        Some(prepared.compare(&options.validation)?.into_result()?)
    } else {
        None
    };
    Ok((artifact, report))
}

// ─── File Conversion ───────────────────────────────────────────────

/// Result of converting one model file.
#[derive(Clone, Debug)]
pub struct ConversionOutcome {
    pub model: PathBuf,
    pub output_path: PathBuf,
    pub kind: Kind,
    pub artifact: ConversionArtifact,
    pub report: Option<ValidationReport>,
}

/// Convert a model file and write the artifact.
///
/// Any failure is wrapped in `ConvertError::ConversionFailed` naming the
/// model. Nothing is written unless every stage, including validation,
/// succeeded.
pub fn convert_model(path: &Path, options: &ConvertOptions) -> ConvertResult<ConversionOutcome> {
    log::info!("converting {}", path.display());
    match convert_model_inner(path, options) {
        Ok(outcome) => {
            log::info!("wrote {}", outcome.output_path.display());
            Ok(outcome)
        }
        Err(e) => {
            log::error!("{}: {}", path.display(), e);
            Err(ConvertError::failed(path, e))
        }
    }
}

fn convert_model_inner(path: &Path, options: &ConvertOptions) -> ConvertResult<ConversionOutcome> {
    let (bytes, raw) = load_model_bytes(path)?;
    let prepared = prepare(&raw)?;
    log::info!(
        "{}: {} with {} features ({})",
        path.display(),
        prepared.class_name(),
        prepared.repr.n_features(),
        prepared.kind
    );

    let artifact = generate(
        &prepared.repr,
        prepared.normalized.scaler.as_ref(),
        &options.func_name,
        &options.target,
    )?;

    let report = if options.validate {
        let report = prepared.compare(&options.validation)?;
        log::info!(
            "{}: validation max diff {:.3e} over {} samples",
            path.display(),
            report.max_abs_diff,
            report.sample_count
        );
        Some(report.into_result()?)
    } else {
        log::info!("{}: validation skipped", path.display());
        None
    };

    let output_path = match &options.output {
        Some(p) => p.clone(),
        None => options.out_dir.join(artifact_file_name(
            prepared.class_name(),
            prepared.kind,
            &bytes,
            &Local::now(),
            artifact.file_extension(),
        )),
    };
    write_artifact(&output_path, artifact.text())?;

    Ok(ConversionOutcome {
        model: path.to_path_buf(),
        output_path,
        kind: prepared.kind,
        artifact,
        report,
    })
}

/// Validate a model file without generating anything.
///
/// Returns the report whether or not it passed; load and conversion
/// failures are still errors.
pub fn validate_model(path: &Path, options: &ValidationOptions) -> ConvertResult<ValidationReport> {
    let (_, raw) = load_model_bytes(path)?;
    prepare(&raw)?.compare(options)
}

/// `<Class>_<kind>_<YYYYmmdd_HHMMSS>_<hash6>.<ext>`, hashing the model bytes.
pub fn artifact_file_name(
    class_name: &str,
    kind: Kind,
    model_bytes: &[u8],
    timestamp: &DateTime<Local>,
    extension: &str,
) -> String {
    let hash = blake3::hash(model_bytes).to_hex();
    format!(
        "{}_{}_{}_{}.{}",
        class_name,
        kind.as_str(),
        timestamp.format("%Y%m%d_%H%M%S"),
        &hash.as_str()[..6],
        extension
    )
}

/// Write an artifact, creating parent directories.
pub fn write_artifact(path: &Path, text: &str) -> ConvertResult<()> {
    let io_err = |source| ConvertError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, text).map_err(io_err)
}

// ─── Inspection ────────────────────────────────────────────────────

/// What `inspect` reports about a model.
#[derive(Clone, Debug, Serialize)]
pub struct ModelSummary {
    pub structure: String,
    pub class_name: String,
    pub kind: Kind,
    pub n_features: usize,
    pub n_classes: usize,
    pub has_proba: bool,
    pub scaler: Option<String>,
}

impl ModelSummary {
    pub fn format_summary(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("model:     {}\n", self.structure));
        out.push_str(&format!("estimator: {}\n", self.class_name));
        out.push_str(&format!("kind:      {}\n", self.kind));
        out.push_str(&format!("features:  {}\n", self.n_features));
        if self.kind != Kind::Regression {
            out.push_str(&format!("classes:   {}\n", self.n_classes));
            out.push_str(&format!(
                "proba:     {}\n",
                if self.has_proba { "yes" } else { "no" }
            ));
        }
        out.push_str(&format!(
            "scaler:    {}\n",
            self.scaler.as_deref().unwrap_or("none")
        ));
        out
    }
}

/// Summarize a raw model.
pub fn inspect(raw: &RawModel) -> ConvertResult<ModelSummary> {
    let prepared = prepare(raw)?;
    Ok(ModelSummary {
        structure: raw.describe(),
        class_name: prepared.class_name().to_string(),
        kind: prepared.kind,
        n_features: prepared.repr.n_features(),
        n_classes: prepared.repr.n_classes(),
        has_proba: prepared.normalized.estimator.has_proba,
        scaler: prepared
            .normalized
            .original
            .scaler
            .as_ref()
            .map(|s| s.class_name().to_string()),
    })
}
