//! Code generator: turns a normalized estimator into inference source text.
//!
//! Each output language implements `ArtifactBackend`. Backends only format
//! text; every check that can reject a model runs here first, so no backend
//! ever starts emitting for a model it cannot represent.
//!
//! Output is deterministic: the same estimator, scaling, and function name
//! always produce byte-identical text.

mod c;
mod rust;

use crate::classify::Kind;
use crate::error::{ConvertError, ConvertResult};
use crate::repr::{EstimatorRepr, ScalingParams};

pub use c::CBackend;
pub use rust::RustBackend;

/// Fractional digits written for every float constant.
pub const FLOAT_DIGITS: usize = 10;

/// Function name used when the caller does not choose one.
pub const DEFAULT_FUNC_NAME: &str = "predict_model";

/// What a backend needs to emit one artifact.
pub struct EmitRequest<'a> {
    pub estimator: &'a EstimatorRepr,
    pub scaling: Option<&'a ScalingParams>,
    pub func_name: &'a str,
}

/// Emits inference source for one target language.
pub trait ArtifactBackend {
    /// The target name (e.g. "c", "rust").
    fn target_name(&self) -> &str;

    /// File extension for artifacts of this target, without the dot.
    fn file_extension(&self) -> &str;

    /// Whether `name` is reserved in the target language.
    fn is_keyword(&self, name: &str) -> bool;

    /// Render the artifact. Inputs are already validated.
    fn emit(&self, request: &EmitRequest<'_>) -> String;
}

/// Create a backend for the given target name.
pub fn create_backend(target: &str) -> Option<Box<dyn ArtifactBackend>> {
    match target {
        "c" | "h" | "c99" => Some(Box::new(CBackend::new())),
        "rust" | "rs" => Some(Box::new(RustBackend::new())),
        _ => None,
    }
}

/// Generated inference source. Immutable once produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConversionArtifact {
    text: String,
    func_name: String,
    kind: Kind,
    target: String,
    extension: String,
}

impl ConversionArtifact {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn func_name(&self) -> &str {
        &self.func_name
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn file_extension(&self) -> &str {
        &self.extension
    }
}

/// Generate an inference artifact for `estimator`.
///
/// Fails before emitting anything if a coefficient is not representable,
/// the scaling width disagrees with the estimator, the target is unknown,
/// or `func_name` is not a usable identifier.
pub fn generate(
    estimator: &EstimatorRepr,
    scaling: Option<&ScalingParams>,
    func_name: &str,
    target: &str,
) -> ConvertResult<ConversionArtifact> {
    let backend =
        create_backend(target).ok_or_else(|| ConvertError::UnsupportedTarget(target.to_string()))?;

    estimator.check_finite()?;
    if estimator.n_features() == 0 {
        return Err(ConvertError::not_linear("estimator has no features"));
    }
    if let Some(s) = scaling {
        if s.n_features() != estimator.n_features() {
            return Err(ConvertError::pipeline(format!(
                "scaler has {} features but the estimator expects {}",
                s.n_features(),
                estimator.n_features()
            )));
        }
        if let Some(i) = s.scale.iter().position(|v| emitted_value(*v) == 0.0) {
            return Err(ConvertError::pipeline(format!(
                "scaler scale[{}] = {:e} is zero at {} fractional digits",
                i, s.scale[i], FLOAT_DIGITS
            )));
        }
        for (what, values) in [("scaler mean", &s.mean), ("scaler scale", &s.scale)] {
            if let Some(v) = values
                .iter()
                .find(|v| !v.is_finite() || v.abs() > f32::MAX as f64)
            {
                return Err(ConvertError::invalid_coefficient(format!(
                    "{} value {:e} is not representable as a 32-bit float",
                    what, v
                )));
            }
        }
    }
    if !is_identifier(func_name) || backend.is_keyword(func_name) {
        return Err(ConvertError::InvalidFunctionName(func_name.to_string()));
    }

    let text = backend.emit(&EmitRequest {
        estimator,
        scaling,
        func_name,
    });
    Ok(ConversionArtifact {
        text,
        func_name: func_name.to_string(),
        kind: estimator.kind(),
        target: backend.target_name().to_string(),
        extension: backend.file_extension().to_string(),
    })
}

// ─── Formatting Helpers ────────────────────────────────────────────

/// Format a constant with a fixed number of fractional digits.
pub fn format_float(value: f64) -> String {
    format!("{:.*}", FLOAT_DIGITS, value)
}

/// The value a constant holds once written with `format_float`.
pub fn emitted_value(value: f64) -> f64 {
    format_float(value).parse().unwrap_or(value)
}

/// Join constants with `, ` applying a per-value suffix.
pub(crate) fn format_list(values: &[f64], suffix: &str) -> String {
    values
        .iter()
        .map(|v| format!("{}{}", format_float(*v), suffix))
        .collect::<Vec<_>>()
        .join(", ")
}

/// ASCII identifier: a letter or `_`, then letters, digits, `_`.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// One-line summary placed at the top of every artifact.
pub(crate) fn describe_kind(kind: Kind) -> (&'static str, &'static str) {
    match kind {
        Kind::Regression => (
            "linear regression",
            "Returns the affine score w.x + b.",
        ),
        Kind::BinaryClassification => (
            "binary logistic classification",
            "Returns P(class 1) = 1 / (1 + exp(-(w.x + b))); label is 1 when p >= 0.5.",
        ),
        Kind::MulticlassClassification => (
            "multiclass logistic classification",
            "Returns the index of the highest class score; ties go to the lowest index.",
        ),
    }
}
