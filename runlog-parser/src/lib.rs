//! # runlog-parser
//!
//! Reads the JSON-lines file produced by `runlog-logger`'s JSON sink into a
//! normalized, queryable in-memory record set.
//!
//! [`JsonLogParser::load`] parses one JSON object per line into immutable
//! [`LogRecord`]s with sequential ids; malformed lines are skipped and
//! counted rather than aborting the load. Loaded records can be filtered by
//! level, time range, or extra-key presence, aggregated into frequency
//! tables, and flattened into a column-stable [`LogTable`] for external
//! analysis tooling.
//!
//! ```rust,no_run
//! use runlog_parser::{JsonLogParser, Severity};
//!
//! fn main() -> Result<(), runlog_parser::ParseError> {
//!     let mut parser = JsonLogParser::new("data/logs/main/json.json");
//!     parser.load()?;
//!
//!     for record in parser.filter_by_level(Severity::Error)? {
//!         println!("{}: {}", record.timestamp(), record.message());
//!     }
//!     for (message, count) in parser.top_messages(10)? {
//!         println!("{count:>6}  {message}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod parser;
pub mod record;
pub mod table;

// re-export commonly used types
pub use error::ParseError;
pub use parser::JsonLogParser;
pub use record::LogRecord;
pub use table::LogTable;

// the severity model is shared with the emitting side
pub use runlog_logger::Severity;
