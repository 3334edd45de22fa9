//! Unit Conversion Tool
//!
//! Convert values between units of a dataset unit system.

use clap::{Parser, Subcommand};
use std::process;
use tracing::error;

use codeunits_tools::commands::{self, SystemArgs};

#[derive(Parser, Debug)]
#[command(name = "codeunits")]
#[command(about = "Convert values between physical, code and comoving units")]
struct Cli {
    #[command(flatten)]
    system: SystemArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert VALUE from one unit to another.
    Convert {
        #[arg(allow_hyphen_values = true)]
        value: f64,
        /// Source unit string, e.g. "Mpccm/h"
        from: String,
        /// Target unit string
        to: String,
    },

    /// Express VALUE in plain CGS units.
    Cgs {
        #[arg(allow_hyphen_values = true)]
        value: f64,
        unit: String,
    },

    /// List the code units of the system.
    Show,
}

fn main() {
    codeunits_tools::init_logging();

    let cli = Cli::parse();

    let result = cli.system.load().and_then(|system| match &cli.command {
        Commands::Convert { value, from, to } => commands::convert(&system, *value, from, to),
        Commands::Cgs { value, unit } => commands::cgs(&system, *value, unit),
        Commands::Show => commands::show(&system),
    });

    match result {
        Ok(output) => print!("{}", with_newline(output)),
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn with_newline(mut output: String) -> String {
    if !output.ends_with('\n') {
        output.push('\n');
    }
    output
}
