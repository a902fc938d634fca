use std::process::ExitCode;

use clap::{Parser, Subcommand};

use tagrelease::commands::{self, doctor::DoctorArgs, next::NextArgs, run::RunArgs};
use tagrelease::{error, telemetry};

#[derive(Debug, Parser)]
#[command(
    name = "tagrelease",
    version,
    about = "Chat bot that cuts release tags for services on GitLab"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the bot: long-poll the chat and answer commands
    Run(RunArgs),
    /// Compute the tag that follows a current tag under a pattern
    Next(NextArgs),
    /// Validate config and check API access
    Doctor(DoctorArgs),
    /// Print the JSON Schema for tagrelease.toml
    Schema,
}

impl Commands {
    const fn name(&self) -> &'static str {
        match self {
            Self::Run(_) => "run",
            Self::Next(_) => "next",
            Self::Doctor(_) => "doctor",
            Self::Schema => "schema",
        }
    }
}

fn main() -> ExitCode {
    telemetry::init();

    let cli = Cli::parse();

    let _span = tracing::info_span!("command", name = cli.command.name()).entered();

    let result = match cli.command {
        Commands::Run(args) => args.execute(),
        Commands::Next(args) => args.execute(),
        Commands::Doctor(args) => args.execute(),
        Commands::Schema => commands::schema::run_schema(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(exit_err) = e.downcast_ref::<error::ExitError>() {
                eprintln!("error: {exit_err}");
                exit_err.exit_code()
            } else {
                eprintln!("error: {e:#}");
                ExitCode::FAILURE
            }
        }
    }
}
