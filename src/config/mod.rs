//! Layered settings: built-in defaults, then `model2c.toml`, then
//! `MODEL2C_*` environment variables. CLI flags are applied last by the
//! caller.


use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::api::ConvertOptions;
use crate::error::{ConvertError, ConvertResult};
use crate::validate::ValidationOptions;

const DEFAULT_CONFIG: &str = include_str!("default.toml");

/// Settings file looked up in the working directory when none is given.
pub const CONFIG_FILE_NAME: &str = "model2c.toml";

/// Prefix for environment overrides, e.g. `MODEL2C_TARGET=rust`.
pub const ENV_PREFIX: &str = "MODEL2C_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub func_name: String,
    pub target: String,
    pub out_dir: PathBuf,
    pub validate: bool,
    pub tolerance: f64,
    pub sample_count: usize,
    pub seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        let options = ConvertOptions::default();
        Self {
            func_name: options.func_name,
            target: options.target,
            out_dir: options.out_dir,
            validate: options.validate,
            tolerance: options.validation.tolerance,
            sample_count: options.validation.sample_count,
            seed: options.validation.seed,
        }
    }
}

impl Settings {
    /// Load settings. An explicit `config_path` must exist; otherwise
    /// `model2c.toml` in the working directory is used when present.
    pub fn load(config_path: Option<&Path>) -> ConvertResult<Self> {
        let mut figment = Figment::from(Toml::string(DEFAULT_CONFIG));
        match config_path {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConvertError::InvalidConfig(format!(
                        "config file '{}' not found",
                        path.display()
                    )));
                }
                figment = figment.merge(Toml::file(path));
            }
            None => figment = figment.merge(Toml::file(CONFIG_FILE_NAME)),
        }
        let settings: Settings = figment
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .map_err(|e| ConvertError::InvalidConfig(e.to_string()))?;
        settings.check()?;
        Ok(settings)
    }

    fn check(&self) -> ConvertResult<()> {
        self.validation_options().check()
    }

    pub fn validation_options(&self) -> ValidationOptions {
        ValidationOptions {
            tolerance: self.tolerance,
            sample_count: self.sample_count,
            seed: self.seed,
        }
    }

    pub fn convert_options(&self) -> ConvertOptions {
        ConvertOptions {
            func_name: self.func_name.clone(),
            target: self.target.clone(),
            out_dir: self.out_dir.clone(),
            output: None,
            validate: self.validate,
            validation: self.validation_options(),
        }
    }
}
