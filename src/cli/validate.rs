use std::path::PathBuf;
use std::process;

use clap::Args;

use super::{load_settings, report_error, EXIT_FAILURE, EXIT_VALIDATION};

#[derive(Args)]
pub struct ValidateArgs {
    /// Model export file (.json)
    pub model: PathBuf,
    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
    /// Maximum absolute difference accepted
    #[arg(long)]
    pub tolerance: Option<f64>,
    /// Number of random samples
    #[arg(long, value_name = "N")]
    pub samples: Option<usize>,
    /// Seed for the sample generator
    #[arg(long)]
    pub seed: Option<u64>,
    /// Settings file (default: ./model2c.toml when present)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

pub fn cmd_validate(args: ValidateArgs) {
    let mut options = load_settings(args.config.as_deref()).validation_options();
    if let Some(t) = args.tolerance {
        options.tolerance = t;
    }
    if let Some(n) = args.samples {
        options.sample_count = n;
    }
    if let Some(seed) = args.seed {
        options.seed = seed;
    }

    let report = match model2c::validate_model(&args.model, &options) {
        Ok(r) => r,
        Err(e) => {
            report_error(&args.model, &e);
            process::exit(EXIT_FAILURE);
        }
    };

    if args.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("error: {}", e);
                process::exit(EXIT_FAILURE);
            }
        }
    } else {
        print!("{}", report.format_report());
    }
    if !report.passed {
        process::exit(EXIT_VALIDATION);
    }
}
