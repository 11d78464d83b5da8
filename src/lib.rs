//! Compile fitted linear models into standalone inference source.
//!
//! A model export goes through four stages: the normalizer unwraps pipelines
//! into an estimator and an optional scaler, the classifier picks the
//! formulation, the code generator renders C or Rust source, and the
//! validator checks the rendered formulas against the original model on
//! seeded random inputs. `api` drives the stages for model files.

pub mod api;
pub mod classify;
pub mod codegen;
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod model;
pub mod normalize;
pub mod repr;
pub mod validate;

pub use api::{
    convert_model, convert_raw, inspect, prepare, validate_model, ConversionOutcome,
    ConvertOptions, ModelSummary, PreparedModel,
};
pub use classify::{classify, Kind};
pub use codegen::{create_backend, generate, ArtifactBackend, ConversionArtifact};
pub use config::Settings;
pub use error::{ConvertError, ConvertResult, LoadError, MismatchKind, ValidationFailure};
pub use model::{load_model, parse_model, RawModel, RawObject};
pub use normalize::{normalize, LinearParams, NormalizedModel};
pub use repr::{EstimatorRepr, ScalingParams};
pub use validate::{validate, Predictor, Transformer, ValidationOptions, ValidationReport};
