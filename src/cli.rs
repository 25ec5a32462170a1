use crate::batch::{run_enrich, run_inspect, EnrichArgs, InspectArgs};
use clap::{Parser, Subcommand};
use immo_enrich::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "immo-batch",
    about = "Clean, enrich and export scraped Tunisian real-estate listings",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the pipeline over a listings file and write the enriched dataset
    Enrich(EnrichArgs),
    /// Run the pipeline and print the run report as JSON without writing anything
    Inspect(InspectArgs),
}

pub(crate) fn run() -> Result<(), AppError> {
    match Cli::parse().command {
        Command::Enrich(args) => run_enrich(args),
        Command::Inspect(args) => run_inspect(args),
    }
}
