//! Command-line surface.
//!
//! clap owns flag parsing and help rendering; exit-code policy stays with
//! the caller: help exits 0, any parse or validation failure becomes
//! `TailError::InvalidArgument` and exits 1 from `main`. The historical
//! `-<count>` shorthand (e.g. `-50`) is rewritten to `-n <count>` before
//! clap sees the argument list.

use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::error::{Result, TailError};

/// Directory monitored when no path argument is given.
pub const DEFAULT_LOG_DIR: &str = "/var/log";

/// Backfill line count when `-n` is not given.
pub const DEFAULT_LINE_COUNT: usize = 30;

#[derive(Parser, Debug)]
#[command(name = "tailglow")]
#[command(about = "Real-time log monitoring with token highlighting", long_about = None)]
#[command(after_help = "Examples:
  tailglow                       Monitor the default log directory
  tailglow app.log               Monitor a specific file
  tailglow -n 50 app.log         Show the last 50 lines, then follow
  tailglow -200 /var/log/        Monitor the newest file in a directory")]
struct Args {
    /// Log file to follow, or a directory to resolve to its newest file
    #[arg(value_name = "FILE|DIR")]
    path: Option<PathBuf>,

    /// Show the last <COUNT> lines before streaming (shorthand: -<COUNT>)
    #[arg(
        short = 'n',
        value_name = "COUNT",
        allow_hyphen_values = true,
        value_parser = parse_line_count
    )]
    lines: Option<usize>,
}

/// Validated monitoring request, ready for path resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorOptions {
    pub path: PathBuf,
    pub lines: usize,
}

/// Outcome of argument parsing.
#[derive(Debug)]
pub enum Invocation {
    /// Start monitoring with these options.
    Run(MonitorOptions),
    /// Print this text and exit 0 (`-h` / `--help`).
    Help(String),
}

/// Parse an argument vector (including the program name).
pub fn parse<I>(argv: I) -> Result<Invocation>
where
    I: IntoIterator,
    I::Item: Into<OsString>,
{
    let argv = normalize_args(argv.into_iter().map(Into::into));
    match Args::try_parse_from(argv) {
        Ok(args) => Ok(Invocation::Run(MonitorOptions {
            path: args.path.unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR)),
            lines: args.lines.unwrap_or(DEFAULT_LINE_COUNT),
        })),
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp => Ok(Invocation::Help(err.to_string())),
            _ => {
                let rendered = err.to_string();
                let first = rendered.lines().next().unwrap_or("bad arguments");
                Err(TailError::invalid_argument(
                    first.trim_start_matches("error: ").to_string(),
                ))
            }
        },
    }
}

/// Rewrite standalone `-<digits>` tokens to `-n <digits>`. A token that
/// directly follows `-n` is its value and is left alone, so `-n -5`
/// still reaches the validator (and fails there).
fn normalize_args(argv: impl Iterator<Item = OsString>) -> Vec<OsString> {
    let mut out: Vec<OsString> = Vec::new();
    let mut after_n_flag = false;
    for (i, arg) in argv.enumerate() {
        let shorthand: Option<OsString> = if i == 0 || after_n_flag {
            None
        } else {
            arg.to_str().and_then(count_shorthand).map(OsString::from)
        };
        after_n_flag = arg == "-n";
        match shorthand {
            Some(count) => {
                out.push(OsString::from("-n"));
                out.push(count);
            }
            None => out.push(arg),
        }
    }
    out
}

fn count_shorthand(arg: &str) -> Option<&str> {
    let digits = arg.strip_prefix('-')?;
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        Some(digits)
    } else {
        None
    }
}

fn parse_line_count(value: &str) -> std::result::Result<usize, String> {
    let count: i64 = value
        .parse()
        .map_err(|_| format!("line count must be a number, got '{value}'"))?;
    if count <= 0 {
        return Err(format!("line count must be positive, got {count}"));
    }
    Ok(count as usize)
}
