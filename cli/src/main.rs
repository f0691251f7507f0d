//! Minmax CLI: the `minmax` command.

mod cli;
mod job;
mod table;

use clap::Parser;
use cli::{Cli, Commands};
use job::{Job, JobError, JobReport};
use std::path::Path;
use std::process::ExitCode;
use tracing::{debug, Level};

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .init();
    debug!("minmax-core {}", minmax_core::version());

    let result = match cli.command {
        Commands::Derive { job, seed, json } => {
            load(&job, seed).and_then(|job| job.derive()).map(|report| (report, json))
        }
        Commands::Evaluate {
            job,
            seed,
            places,
            json,
        } => load(&job, seed)
            .and_then(|job| job.evaluate(places))
            .map(|report| (report, json)),
    };

    match result.and_then(|(report, json)| print_report(&report, json)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load(path: &Path, seed: Option<u64>) -> Result<Job, JobError> {
    let mut job = Job::load(path)?;
    if let Some(seed) = seed {
        job.config.seed = seed;
    }
    Ok(job)
}

fn print_report(report: &JobReport, json: bool) -> Result<(), JobError> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    print!("{}", table::render_equations(report));
    if let Some(rows) = &report.rows {
        println!();
        print!("{}", table::render_rows(rows));
    }
    Ok(())
}
