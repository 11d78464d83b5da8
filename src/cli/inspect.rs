use std::path::PathBuf;
use std::process;

use clap::Args;

use super::{report_error, EXIT_FAILURE};

#[derive(Args)]
pub struct InspectArgs {
    /// Model export file (.json)
    pub model: PathBuf,
    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn cmd_inspect(args: InspectArgs) {
    let summary = model2c::load_model(&args.model).and_then(|raw| model2c::inspect(&raw));
    let summary = match summary {
        Ok(s) => s,
        Err(e) => {
            report_error(&args.model, &e);
            process::exit(EXIT_FAILURE);
        }
    };
    if args.json {
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("error: {}", e);
                process::exit(EXIT_FAILURE);
            }
        }
    } else {
        print!("{}", summary.format_summary());
    }
}
