//! Arbor CLI Binary
//!
//! Command-line interface for administering an arbor store.

use anyhow::Context;
use arbor::logging::init_logging;
use arbor::tooling::cli::{Cli, CliContext};
use clap::Parser;
use std::process;

fn run(cli: Cli) -> anyhow::Result<String> {
    let mut context = CliContext::new(cli.store.clone(), cli.config.clone())
        .context("Failed to load configuration")?;

    let logging = &mut context.config_mut().logging;
    if cli.verbose {
        logging.level = "debug".to_string();
        logging.output = "stderr".to_string();
    }
    if let Some(level) = cli.log_level {
        logging.level = level;
    }
    if let Some(format) = cli.log_format {
        logging.format = format;
    }
    if let Some(output) = cli.log_output {
        logging.output = output;
    }
    if let Some(file) = cli.log_file {
        logging.file = Some(file);
    }
    init_logging(Some(&context.config().logging)).context("Failed to initialise logging")?;

    Ok(context.execute(&cli.command)?)
}

fn main() {
    let cli = Cli::parse();
    match run(cli) {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}
