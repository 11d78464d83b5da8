pub mod convert;
pub mod inspect;
pub mod validate;

use std::path::Path;
use std::process;

use model2c::diagnostic::Diagnostic;
use model2c::{ConvertError, Settings};

/// Exit status for a conversion or load failure.
pub const EXIT_FAILURE: i32 = 1;
/// Exit status when conversion succeeded but the equivalence check did not.
pub const EXIT_VALIDATION: i32 = 2;

/// Load layered settings, exiting on a bad config.
pub fn load_settings(config: Option<&Path>) -> Settings {
    match Settings::load(config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(EXIT_FAILURE);
        }
    }
}

/// Print an error, with a source snippet for JSON syntax errors.
pub fn report_error(model: &Path, err: &ConvertError) {
    if let Some((diag, source)) = Diagnostic::from_error(err) {
        if diag.render(&model.display().to_string(), source).is_ok() {
            return;
        }
    }
    if err.is_validation_failure() {
        eprintln!("error: {} (no artifact written)", err);
    } else {
        eprintln!("error: {}", err);
    }
}

/// Exit status for an error.
pub fn exit_code(err: &ConvertError) -> i32 {
    if err.is_validation_failure() {
        EXIT_VALIDATION
    } else {
        EXIT_FAILURE
    }
}
