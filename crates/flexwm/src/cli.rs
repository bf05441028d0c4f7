use clap::{Parser, Subcommand};

use crate::error::Result;
use crate::inspect::{CheckConfigArgs, OutlineArgs, run_check_config, run_outline};
use crate::logging;
use crate::serve::{ServeArgs, run_serve};

#[derive(Debug, Parser)]
#[command(
    name = "flexwm",
    about = "Keeps the focused window of a tiled window manager at the golden ratio",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Read window notifications and write resize commands to stdout.
    Serve(ServeArgs),

    /// Print the split containers and windows of a tree snapshot.
    Outline(OutlineArgs),

    /// Load and validate a configuration file.
    #[command(name = "check-config")]
    CheckConfig(CheckConfigArgs),
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    run(cli)
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Serve(args) => run_serve(args),
        Commands::Outline(args) => {
            logging::init("warn");
            run_outline(args)
        }
        Commands::CheckConfig(args) => {
            logging::init("warn");
            run_check_config(args)
        }
    }
}
