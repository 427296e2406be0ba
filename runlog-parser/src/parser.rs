use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use runlog_logger::Severity;

use crate::error::ParseError;
use crate::record::LogRecord;
use crate::table::LogTable;

/// reads a JSON-lines log file into normalized records and answers queries
///
/// Lifecycle: `Unloaded -> Loaded`, re-entrant. Every `load()` fully replaces
/// the prior record set; a failed load leaves the parser empty and unloaded,
/// never with a mix of old and new records. All query methods return
/// [`ParseError::NotLoaded`] until the first successful load, so the required
/// call order is enforceable rather than silently yielding empty results.
///
/// Filters are pure and return record references in insertion order, so they
/// compose without a query-builder layer.
#[derive(Debug)]
pub struct JsonLogParser {
    source_path: PathBuf,
    records: Vec<LogRecord>,
    skipped_lines: usize,
    loaded: bool,
    // frequency caches recorded during load, cleared on every load
    level_counts: HashMap<Severity, usize>,
    module_counts: HashMap<String, usize>,
    func_counts: HashMap<String, usize>,
}

impl JsonLogParser {
    /// no I/O happens until [`load`](JsonLogParser::load)
    pub fn new(source_path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
            records: Vec::new(),
            skipped_lines: 0,
            loaded: false,
            level_counts: HashMap::new(),
            module_counts: HashMap::new(),
            func_counts: HashMap::new(),
        }
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// load (or reload) the file, replacing all previously loaded state
    ///
    /// Blank lines are ignored. Malformed lines are skipped, counted (see
    /// [`skipped_lines`](JsonLogParser::skipped_lines)), and logged, so one
    /// corrupt entry never costs the rest of the file. I/O failures propagate
    /// unchanged.
    pub fn load(&mut self) -> Result<(), ParseError> {
        // clear first so a failed read never leaves a mixed record set
        self.records.clear();
        self.skipped_lines = 0;
        self.loaded = false;
        self.level_counts.clear();
        self.module_counts.clear();
        self.func_counts.clear();

        let file = File::open(&self.source_path)?;
        let reader = BufReader::new(file);

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let id = self.records.len();
            match parse_line(id, index + 1, line) {
                Ok(record) => {
                    self.record_metrics(&record);
                    self.records.push(record);
                }
                Err(err) => {
                    self.skipped_lines += 1;
                    log::warn!("{}: {}", self.source_path.display(), err);
                }
            }
        }

        self.loaded = true;
        log::debug!(
            "loaded {} records ({} skipped) from {}",
            self.records.len(),
            self.skipped_lines,
            self.source_path.display()
        );
        Ok(())
    }

    fn record_metrics(&mut self, record: &LogRecord) {
        *self.level_counts.entry(record.level()).or_insert(0) += 1;
        *self
            .module_counts
            .entry(record.module().to_string())
            .or_insert(0) += 1;
        *self
            .func_counts
            .entry(record.function().to_string())
            .or_insert(0) += 1;
    }

    fn ensure_loaded(&self) -> Result<(), ParseError> {
        if self.loaded {
            Ok(())
        } else {
            Err(ParseError::NotLoaded)
        }
    }

    /// all loaded records in file order
    pub fn records(&self) -> Result<&[LogRecord], ParseError> {
        self.ensure_loaded()?;
        Ok(&self.records)
    }

    /// lines rejected during the last load; 0 before any load
    pub fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }

    /// records whose level matches exactly, in insertion order
    pub fn filter_by_level(&self, level: Severity) -> Result<Vec<&LogRecord>, ParseError> {
        self.ensure_loaded()?;
        Ok(self
            .records
            .iter()
            .filter(|r| r.level() == level)
            .collect())
    }

    /// records with `start <= timestamp <= end`; either bound may be open
    pub fn filter_by_time(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<&LogRecord>, ParseError> {
        self.ensure_loaded()?;
        if let (Some(start), Some(end)) = (start, end)
            && start > end
        {
            return Err(ParseError::InvalidRange { start, end });
        }

        Ok(self
            .records
            .iter()
            .filter(|r| {
                let ts = r.timestamp();
                start.is_none_or(|s| ts >= s) && end.is_none_or(|e| ts <= e)
            })
            .collect())
    }

    /// records carrying `key` in their extra mapping, regardless of value
    pub fn filter_by_extra(&self, key: &str) -> Result<Vec<&LogRecord>, ParseError> {
        self.ensure_loaded()?;
        Ok(self.records.iter().filter(|r| r.has_extra(key)).collect())
    }

    /// records for the given ids, preserving input order
    ///
    /// Unknown ids are skipped silently; ids are an internal convenience, not
    /// a guaranteed-dense external contract.
    pub fn get_records_by_id(&self, ids: &[usize]) -> Result<Vec<&LogRecord>, ParseError> {
        self.ensure_loaded()?;
        // ids are assigned densely in file order, so they double as indices
        Ok(ids.iter().filter_map(|&id| self.records.get(id)).collect())
    }

    /// the `n` most frequent messages with their counts, descending
    ///
    /// Ties keep first-seen file order. `n` larger than the distinct message
    /// count returns everything; `n == 0` returns nothing.
    pub fn top_messages(&self, n: usize) -> Result<Vec<(String, usize)>, ParseError> {
        self.ensure_loaded()?;

        let mut first_seen: Vec<&str> = Vec::new();
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for record in &self.records {
            let message = record.message();
            if !counts.contains_key(message) {
                first_seen.push(message);
            }
            *counts.entry(message).or_insert(0) += 1;
        }

        let mut ranked: Vec<(String, usize)> = first_seen
            .into_iter()
            .map(|message| (message.to_string(), counts[message]))
            .collect();
        // stable sort keeps first-seen order among equal counts
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(n);
        Ok(ranked)
    }

    /// per-level frequency table from the load-time cache
    pub fn level_counts(&self) -> Result<HashMap<Severity, usize>, ParseError> {
        self.ensure_loaded()?;
        Ok(self.level_counts.clone())
    }

    /// per-module frequency table from the load-time cache
    pub fn module_counts(&self) -> Result<HashMap<String, usize>, ParseError> {
        self.ensure_loaded()?;
        Ok(self.module_counts.clone())
    }

    /// per-function frequency table from the load-time cache
    pub fn func_counts(&self) -> Result<HashMap<String, usize>, ParseError> {
        self.ensure_loaded()?;
        Ok(self.func_counts.clone())
    }

    /// flatten all loaded records into a [`LogTable`]
    ///
    /// For a filtered subset, pass filter output to
    /// [`LogTable::from_records`] directly.
    pub fn to_table(&self) -> Result<LogTable, ParseError> {
        self.ensure_loaded()?;
        Ok(LogTable::from_records(&self.records))
    }
}

fn parse_line(id: usize, line_no: usize, line: &str) -> Result<LogRecord, ParseError> {
    let value: Value =
        serde_json::from_str(line).map_err(|e| ParseError::MalformedRecord {
            line: line_no,
            reason: e.to_string(),
        })?;
    LogRecord::from_json(id, &value).map_err(|reason| ParseError::MalformedRecord {
        line: line_no,
        reason,
    })
}
