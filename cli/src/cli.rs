use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "minmax",
    about = "Min/max uncertainty bounds for equations of measured quantities",
    version
)]
pub struct Cli {
    /// Log derivation details to stderr
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Derive and print the min/max equations of a job
    Derive {
        /// Path to the job file (JSON)
        job: PathBuf,

        /// Override the test-value seed from the job config
        #[arg(long)]
        seed: Option<u64>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Derive the equations and evaluate them over the job data
    Evaluate {
        /// Path to the job file (JSON)
        job: PathBuf,

        /// Override the test-value seed from the job config
        #[arg(long)]
        seed: Option<u64>,

        /// Decimal places for the evaluated rows
        #[arg(long)]
        places: Option<u32>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
