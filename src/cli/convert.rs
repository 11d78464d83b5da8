use std::path::PathBuf;
use std::process;

use clap::Args;
use rayon::prelude::*;

use super::{exit_code, load_settings, report_error, EXIT_FAILURE, EXIT_VALIDATION};

#[derive(Args)]
pub struct ConvertArgs {
    /// Model export files (.json)
    #[arg(required = true, value_name = "MODEL")]
    pub models: Vec<PathBuf>,
    /// Directory for generated artifacts
    #[arg(short = 'o', long = "out", value_name = "DIR")]
    pub out_dir: Option<PathBuf>,
    /// Write the artifact to this file (single model only)
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,
    /// Skip the equivalence check
    #[arg(long)]
    pub no_validate: bool,
    /// Name of the generated function
    #[arg(long, value_name = "NAME")]
    pub func_name: Option<String>,
    /// Output language: c or rust
    #[arg(long)]
    pub target: Option<String>,
    /// Maximum absolute difference accepted by the equivalence check
    #[arg(long)]
    pub tolerance: Option<f64>,
    /// Number of random samples drawn by the equivalence check
    #[arg(long, value_name = "N")]
    pub samples: Option<usize>,
    /// Settings file (default: ./model2c.toml when present)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

pub fn cmd_convert(args: ConvertArgs) {
    let settings = load_settings(args.config.as_deref());
    let mut options = settings.convert_options();
    if let Some(dir) = args.out_dir {
        options.out_dir = dir;
    }
    if let Some(name) = args.func_name {
        options.func_name = name;
    }
    if let Some(target) = args.target {
        options.target = target;
    }
    if let Some(t) = args.tolerance {
        options.validation.tolerance = t;
    }
    if let Some(n) = args.samples {
        options.validation.sample_count = n;
    }
    if args.no_validate {
        options.validate = false;
    }
    if args.output.is_some() && args.models.len() > 1 {
        eprintln!("error: --output needs exactly one model");
        process::exit(EXIT_FAILURE);
    }
    options.output = args.output;

    let results: Vec<_> = args
        .models
        .par_iter()
        .map(|model| (model, model2c::convert_model(model, &options)))
        .collect();

    let mut failed = false;
    let mut invalid = false;
    for (model, result) in results {
        match result {
            Ok(outcome) => {
                eprintln!(
                    "Converted {} -> {}",
                    model.display(),
                    outcome.output_path.display()
                );
                if let Some(report) = &outcome.report {
                    eprintln!(
                        "  {}, max diff {:.3e} over {} samples",
                        outcome.kind, report.max_abs_diff, report.sample_count
                    );
                }
            }
            Err(e) => {
                report_error(model, &e);
                if exit_code(&e) == EXIT_VALIDATION {
                    invalid = true;
                } else {
                    failed = true;
                }
            }
        }
    }
    // a conversion failure outranks a validation failure
    if failed {
        process::exit(EXIT_FAILURE);
    }
    if invalid {
        process::exit(EXIT_VALIDATION);
    }
}
