pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use anihan_core::flow::definition::Audience;
use anihan_core::lang::Dialect;

#[derive(Debug, Parser)]
#[command(
    name = "anihan",
    about = "Anihan flow authoring and simulation CLI",
    long_about = "Validate guided-conversation flow documents, simulate conversations \
                  offline, and inspect loan suggestions for saved state.",
    after_help = "Examples:\n  anihan validate flows\n  anihan simulate --flow flows/farmer/farm-intake.json\n  anihan suggest --state state.json --deployment pilot"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Validate flow documents in strict authoring mode (dangling refs fail)")]
    Validate {
        #[arg(help = "A flow JSON file or a flows directory")]
        path: PathBuf,
    },
    #[command(about = "Run guided turns offline against stdin lines (no language backend)")]
    Simulate {
        #[arg(long, help = "Path to the flow JSON document to run")]
        flow: PathBuf,
        #[arg(long, default_value = "en", help = "Dialect for prompts and fallbacks (en|fil)")]
        dialect: String,
    },
    #[command(about = "Compute the artifact bundle and loan suggestion for saved slot state")]
    Suggest {
        #[arg(long, help = "Path to a JSON file with a `slots` object")]
        state: PathBuf,
        #[arg(long, default_value = "development", help = "Deployment policy to apply")]
        deployment: String,
        #[arg(long, default_value = "farmer", help = "Audience for question phrasing")]
        audience: String,
    },
}

pub async fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Validate { path } => commands::validate::run(&path),
        Command::Simulate { flow, dialect } => {
            let dialect = Dialect::parse(&dialect).unwrap_or_default();
            commands::simulate::run(&flow, dialect).await
        }
        Command::Suggest { state, deployment, audience } => {
            let audience = Audience::parse(&audience).unwrap_or(Audience::Farmer);
            commands::suggest::run(&state, &deployment, audience)
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
