//! Error types for tailglow.
//!
//! Startup problems (`InvalidArgument`, `NotFound`) are detected before
//! any file is opened for monitoring; `Io` terminates an active session.
//! None of them are retried. The binary wraps these in `anyhow` at the
//! top level for context-preserving display.

use thiserror::Error;

/// Errors surfaced by argument validation, path resolution, and tailing.
#[derive(Error, Debug)]
pub enum TailError {
    /// A command-line value failed validation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The path does not exist, or a directory held no selectable file.
    #[error("{0}")]
    NotFound(String),

    /// Open or read failure during backfill or streaming.
    #[error("{message}: {source}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

impl TailError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }
}

/// Standard result type across tailglow modules.
pub type Result<T> = std::result::Result<T, TailError>;
