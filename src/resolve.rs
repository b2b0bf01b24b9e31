//! Target resolution: a direct file, or the newest file in a directory.
//!
//! Directory resolution prefers a timestamp embedded in the filename over
//! the filesystem mtime, so `app-2024-01-15.log` style rotation schemes
//! pick the right file even when mtimes are unreliable (copied archives,
//! restored backups).

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use log::debug;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, TailError};

/// A monitoring request as it arrives from the CLI. Created once from the
/// validated input, immutable thereafter.
#[derive(Debug, Clone)]
pub struct MonitorTarget {
    pub path: PathBuf,
    pub is_directory: bool,
    pub backfill_line_count: usize,
}

impl MonitorTarget {
    /// Classify the path and confirm it exists. Fails with `NotFound`
    /// before any file is opened for monitoring.
    pub fn new(path: PathBuf, backfill_line_count: usize) -> Result<Self> {
        let is_directory = path.is_dir();
        if !is_directory && !path.is_file() {
            return Err(TailError::not_found(format!(
                "path not found: {}",
                path.display()
            )));
        }
        Ok(Self {
            path,
            is_directory,
            backfill_line_count,
        })
    }

    /// Resolve to the concrete file the tail reader will open. A file
    /// path passes through unchanged; a directory resolves to the entry
    /// with the greatest comparison time.
    pub fn resolve(&self) -> Result<PathBuf> {
        if !self.is_directory {
            return Ok(self.path.clone());
        }
        latest_file_in(&self.path)
    }
}

/// Pick the file with the greatest comparison time (filename timestamp if
/// present, mtime otherwise). Ties keep the first file in listing order;
/// listing order itself is filesystem-defined.
fn latest_file_in(dir: &Path) -> Result<PathBuf> {
    let entries = fs::read_dir(dir)
        .map_err(|e| TailError::io(format!("cannot list directory '{}'", dir.display()), e))?;

    let mut latest: Option<(PathBuf, NaiveDateTime)> = None;
    let mut saw_file = false;
    for entry in entries {
        let entry =
            entry.map_err(|e| TailError::io(format!("cannot list directory '{}'", dir.display()), e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        saw_file = true;

        let from_name = entry
            .file_name()
            .to_str()
            .and_then(timestamp_from_filename);
        let Some(compare_time) = from_name.or_else(|| modified_time(&path)) else {
            continue;
        };
        debug!("candidate {}: {compare_time}", path.display());

        match &latest {
            Some((_, best)) if compare_time <= *best => {}
            _ => latest = Some((path, compare_time)),
        }
    }

    match latest {
        Some((path, _)) => Ok(path),
        None if saw_file => Err(TailError::not_found(format!(
            "could not determine the latest file in: {}",
            dir.display()
        ))),
        None => Err(TailError::not_found(format!(
            "no files found in directory: {}",
            dir.display()
        ))),
    }
}

/// Filename timestamp shapes, most specific first.
const FILENAME_TIMESTAMP_PATTERNS: &[&str] = &[
    r"\d{4}[-_]\d{2}[-_]\d{2}[-_]\d{2}[-_]\d{2}[-_]\d{2}",
    r"\d{4}[-_]\d{2}[-_]\d{2}",
    r"\d{8}[-_]\d{6}",
    r"\d{8}",
];

/// Extract a timestamp embedded in a log filename.
///
/// The first structurally matching pattern decides: a match that fails
/// strict parsing yields `None` rather than falling through to a looser
/// pattern.
pub fn timestamp_from_filename(name: &str) -> Option<NaiveDateTime> {
    for pattern in FILENAME_TIMESTAMP_PATTERNS {
        let re = Regex::new(pattern).expect("filename timestamp pattern is malformed");
        if let Some(found) = re.find(name) {
            let digits: String = found
                .as_str()
                .chars()
                .filter(|c| c.is_ascii_digit())
                .collect();
            return parse_compact_timestamp(&digits);
        }
    }
    None
}

fn parse_compact_timestamp(digits: &str) -> Option<NaiveDateTime> {
    match digits.len() {
        14 => NaiveDateTime::parse_from_str(digits, "%Y%m%d%H%M%S").ok(),
        8 => NaiveDate::parse_from_str(digits, "%Y%m%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0)),
        _ => None,
    }
}

fn modified_time(path: &Path) -> Option<NaiveDateTime> {
    let modified = fs::metadata(path).and_then(|meta| meta.modified()).ok()?;
    Some(DateTime::<Local>::from(modified).naive_local())
}
