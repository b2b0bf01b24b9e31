use anyhow::{Context, Result};
use colored::Colorize;
use log::debug;
use std::sync::Arc;

use tailglow::cli::{self, Invocation};
use tailglow::highlight::Highlighter;
use tailglow::render::ConsoleRenderer;
use tailglow::resolve::MonitorTarget;
use tailglow::signal;
use tailglow::tail::TailReader;

fn main() {
    env_logger::init();

    if let Err(err) = run() {
        eprintln!("{}", format!("Error: {err:#}").red());
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = match cli::parse(std::env::args_os())? {
        Invocation::Help(text) => {
            print!("{text}");
            return Ok(());
        }
        Invocation::Run(options) => options,
    };

    let target = MonitorTarget::new(options.path, options.lines)?;
    let resolved = target.resolve()?;
    debug!("resolved target: {}", resolved.display());

    let shutdown = signal::shutdown_flag().context("Failed to install signal handlers")?;

    println!(
        "Monitoring: {} (showing last {} lines)",
        resolved.display(),
        target.backfill_line_count
    );
    println!("Press Ctrl+C to stop...");
    println!();

    let highlighter = Highlighter::new();
    let mut renderer = ConsoleRenderer::new(std::io::stdout());
    let reader = TailReader::open(&resolved, target.backfill_line_count, Arc::clone(&shutdown))?;
    reader.run(&highlighter, &mut renderer)?;

    println!();
    println!("Stopping tailglow...");
    Ok(())
}
