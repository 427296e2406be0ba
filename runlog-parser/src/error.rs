use chrono::{DateTime, Utc};
use thiserror::Error;

/// errors surfaced by [`JsonLogParser`](crate::JsonLogParser)
#[derive(Debug, Error)]
pub enum ParseError {
    /// queries require at least one successful `load()` first
    #[error("no records loaded; call load() first")]
    NotLoaded,

    #[error("invalid time range: start {start} is after end {end}")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// one JSON-lines entry failed to parse or lacked a required field
    ///
    /// `load()` skips and counts these rather than aborting; the variant is
    /// public so per-line strict callers can match on it.
    #[error("malformed record on line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
