//! Stdout rendering of highlighted lines.
//!
//! The highlighter returns plain segment data; every terminal concern
//! (ANSI colors, the render-time clock prefix) lives here so the core
//! stays testable without a terminal.

use chrono::Local;
use colored::{Color, Colorize};
use std::io::{self, Write};

use crate::highlight::{Category, Segment};

/// Receives each highlighted line. The tail reader drives one of these
/// for both backfill and streaming output.
pub trait SegmentSink {
    fn emit(&mut self, segments: &[Segment]) -> io::Result<()>;
}

/// Terminal color for each token category.
pub fn category_color(category: Category) -> Color {
    match category {
        Category::Timestamp | Category::Offset => Color::BrightCyan,
        Category::LevelError => Color::BrightRed,
        Category::LevelWarn => Color::BrightYellow,
        Category::LevelInfo => Color::BrightGreen,
        Category::LevelDebug => Color::Cyan,
        Category::Number => Color::BrightMagenta,
        Category::QuotedString => Color::Yellow,
        Category::UrlOrPath => Color::BrightBlue,
        Category::ModelName => Color::Blue,
        Category::Currency => Color::Green,
        Category::HttpStatus => Color::Magenta,
        Category::Duration => Color::Red,
    }
}

/// Writes rendered lines with a wall-clock `[HH:MM:SS]` prefix (the time
/// of rendering, not any timestamp inside the line) and per-category
/// colors.
pub struct ConsoleRenderer<W: Write> {
    out: W,
}

impl<W: Write> ConsoleRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> SegmentSink for ConsoleRenderer<W> {
    fn emit(&mut self, segments: &[Segment]) -> io::Result<()> {
        write!(self.out, "[{}] ", Local::now().format("%H:%M:%S"))?;
        for segment in segments {
            match segment.category {
                Some(category) => write!(
                    self.out,
                    "{}",
                    segment.text.as_str().color(category_color(category))
                )?,
                None => write!(self.out, "{}", segment.text)?,
            }
        }
        writeln!(self.out)?;
        self.out.flush()
    }
}
