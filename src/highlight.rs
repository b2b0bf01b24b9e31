//! Token highlighting: classify regions of a log line into categories.
//!
//! Every pattern scans the line independently, the combined matches are
//! stably sorted by start offset, and a single left-to-right sweep keeps
//! the earliest-starting match. Ties go to the pattern declared first;
//! a match overlapping an accepted region is dropped whole, never
//! truncated. The output segments concatenate back to the input line
//! exactly.

use regex::Regex;

/// Semantic token categories recognized in log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Timestamp,
    Offset,
    LevelError,
    LevelWarn,
    LevelInfo,
    LevelDebug,
    Number,
    QuotedString,
    UrlOrPath,
    ModelName,
    Currency,
    HttpStatus,
    Duration,
}

/// One span of a highlighted line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub category: Option<Category>,
}

impl Segment {
    fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            category: None,
        }
    }

    fn categorized(text: &str, category: Category) -> Self {
        Self {
            text: text.to_string(),
            category: Some(category),
        }
    }
}

/// Pattern table in priority order: among matches starting at the same
/// offset, the earlier entry wins. All patterns match case-insensitively.
const PATTERNS: &[(&str, Category)] = &[
    (
        r"(?i)\d{4}-\d{2}-\d{2}\s+\d{2}:\d{2}:\d{2}(?:\.\d{3})?",
        Category::Timestamp,
    ),
    (r"(?i)\+\d{2}:\d{2}", Category::Offset),
    (r"(?i)\[(?:ERROR|ERR|FATAL|FTL)\]", Category::LevelError),
    (r"(?i)\[(?:WARN|WRN)\]", Category::LevelWarn),
    (r"(?i)\[(?:INFO|INF)\]", Category::LevelInfo),
    (r"(?i)\[(?:DEBUG|DBG|TRACE|TRC)\]", Category::LevelDebug),
    (r"(?i)\b\d+(?:\.\d+)?\b", Category::Number),
    (r#"(?i)"[^"]*""#, Category::QuotedString),
    (r"(?i)'[^']*'", Category::QuotedString),
    (r"(?i)https?://[^\s]+", Category::UrlOrPath),
    (r"(?i)/[^\s]*", Category::UrlOrPath),
    (r"(?i)claude-[a-z0-9-]+", Category::ModelName),
    (r"(?i)\$\d+(?:\.\d+)?", Category::Currency),
    (r"(?i)\b[1-5]\d{2}\b", Category::HttpStatus),
    (r"(?i)\d+(?:\.\d+)?(?:ms|s|m|h)\b", Category::Duration),
];

struct TokenMatch {
    start: usize,
    len: usize,
    category: Category,
}

/// Compiled pattern set. Construct once, use for every line.
pub struct Highlighter {
    patterns: Vec<(Regex, Category)>,
}

impl Highlighter {
    pub fn new() -> Self {
        let patterns = PATTERNS
            .iter()
            .map(|(pattern, category)| {
                (
                    Regex::new(pattern).expect("builtin highlight pattern is malformed"),
                    *category,
                )
            })
            .collect();
        Self { patterns }
    }

    /// Decompose one line (no trailing newline) into ordered,
    /// non-overlapping segments covering the whole line.
    pub fn highlight(&self, line: &str) -> Vec<Segment> {
        let mut matches = Vec::new();
        for (regex, category) in &self.patterns {
            for found in regex.find_iter(line) {
                matches.push(TokenMatch {
                    start: found.start(),
                    len: found.len(),
                    category: *category,
                });
            }
        }
        // Stable sort: equal starts keep pattern declaration order.
        matches.sort_by_key(|m| m.start);

        let mut segments = Vec::new();
        let mut cursor = 0;
        for m in matches {
            if m.start < cursor {
                continue;
            }
            if m.start > cursor {
                segments.push(Segment::plain(&line[cursor..m.start]));
            }
            let end = m.start + m.len;
            segments.push(Segment::categorized(&line[m.start..end], m.category));
            cursor = end;
        }
        if cursor < line.len() || segments.is_empty() {
            segments.push(Segment::plain(&line[cursor..]));
        }
        segments
    }
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new()
    }
}
