mod cli;

use clap::{Parser, Subcommand};
use env_logger::{Builder, Env};

use cli::convert::{cmd_convert, ConvertArgs};
use cli::inspect::{cmd_inspect, InspectArgs};
use cli::validate::{cmd_validate, ValidateArgs};

#[derive(Parser)]
#[command(
    name = "model2c",
    version,
    about = "Compile fitted linear models into standalone C or Rust inference code"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert model exports and write inference artifacts
    Convert(ConvertArgs),
    /// Show what a model export contains
    Inspect(InspectArgs),
    /// Run only the equivalence check and print its report
    Validate(ValidateArgs),
}

fn main() {
    Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Convert(args) => cmd_convert(args),
        Command::Inspect(args) => cmd_inspect(args),
        Command::Validate(args) => cmd_validate(args),
    }
}
