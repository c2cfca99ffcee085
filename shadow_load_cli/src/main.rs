use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;

use crate::{inspect::InspectArgs, simulate::SimulateArgs};

mod file_utils;
mod inspect;
mod parsers;
mod simulate;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a dataset and print what it contains
    Inspect {
        #[command(flatten)]
        args: InspectArgs,
    },
    /// Apply random moves to datasets and verify the demand aggregates
    #[command(visible_alias = "sim")]
    Simulate {
        #[command(flatten)]
        args: SimulateArgs,
    },
}

fn main() -> Result<(), anyhow::Error> {
    // Loaded before parsing so that env-backed defaults see it
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(if cli.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    match cli.command {
        Commands::Inspect { args } => inspect::run(args)?,
        Commands::Simulate { args } => simulate::run(args)?,
    }

    Ok(())
}
