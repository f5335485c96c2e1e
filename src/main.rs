//! b3stream CLI - BLAKE3 digests of files and standard input

use clap::Parser;
use b3stream::config::{CliArgs, HashConfig, OutputFormat};
use b3stream::error::{B3Error, Result};
use b3stream::hash::{hash_input, HashResult};
use std::io::Write;
use tracing_subscriber::EnvFilter;

fn main() {
    let args = CliArgs::parse();

    init_logging(&args);

    match run(&args) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("b3stream: {}", e);
            std::process::exit(1);
        }
    }
}

fn init_logging(args: &CliArgs) {
    let default_level = match args.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Hash every input; returns whether all of them succeeded
fn run(args: &CliArgs) -> Result<bool> {
    let config = HashConfig::from_cli(args)?;

    if config.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .build_global()
            .map_err(|e| B3Error::config(format!("Failed to build thread pool: {}", e)))?;
    }

    let mut results = Vec::with_capacity(config.inputs.len());
    let mut all_ok = true;

    for input in &config.inputs {
        match hash_input(input, &config) {
            Ok(result) => results.push(result),
            Err(e) => {
                tracing::debug!(input = %input.display_name(), "hashing failed");
                eprintln!("b3stream: {}", e);
                all_ok = false;
            }
        }
    }

    if !args.quiet {
        print_results(&results, config.format)?;
    }

    Ok(all_ok)
}

fn print_results(results: &[HashResult], format: OutputFormat) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match format {
        OutputFormat::Bsd => {
            for result in results {
                writeln!(out, "{}", result.bsd_line())?;
            }
        }
        OutputFormat::Hex => {
            for result in results {
                writeln!(out, "{}", result.hash)?;
            }
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, results)?;
            writeln!(out)?;
        }
    }

    out.flush()?;
    Ok(())
}
