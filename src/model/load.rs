//! Reading model exports from disk.

use std::path::Path;

use super::RawModel;
use crate::error::{ConvertError, ConvertResult, LoadError};

/// Parse model export text into a `RawModel`.
pub fn parse_model(text: &str) -> Result<RawModel, LoadError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|error| LoadError::Syntax {
            error,
            text: text.to_string(),
        })?;
    RawModel::from_value(value).ok_or_else(|| {
        LoadError::Shape(
            "expected an object with 'class', 'steps', or a 'model' mapping".to_string(),
        )
    })
}

/// Load a model export, returning the file bytes alongside the parsed model.
///
/// The bytes feed the content hash in the output file name.
pub fn load_model_bytes(path: &Path) -> ConvertResult<(Vec<u8>, RawModel)> {
    let wrap = |source: LoadError| ConvertError::ModelLoad {
        path: path.to_path_buf(),
        source,
    };
    let bytes = std::fs::read(path).map_err(|e| wrap(LoadError::Io(e)))?;
    let text = String::from_utf8_lossy(&bytes);
    let model = parse_model(&text).map_err(wrap)?;
    Ok((bytes, model))
}

/// Load a model export from a JSON file.
pub fn load_model(path: &Path) -> ConvertResult<RawModel> {
    load_model_bytes(path).map(|(_, model)| model)
}
