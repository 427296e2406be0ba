use itertools::Itertools;
use serde_json::Value;
use std::fmt;

use crate::record::LogRecord;

/// standard columns, always first and in this order
const STANDARD_COLUMNS: [&str; 8] = [
    "id",
    "timestamp",
    "level",
    "logger_name",
    "module",
    "function",
    "message",
    "process_id",
];

/// flattened, column-stable view of a record sequence
///
/// This is the export boundary toward external analysis tooling: standard
/// fields come first in a fixed order, then one column per distinct extra key
/// in first-seen order across the given records. A record missing an extra
/// key (or a process id) gets `null` in that cell.
#[derive(Debug, Clone, PartialEq)]
pub struct LogTable {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl LogTable {
    /// build a table from any record sequence, e.g. filter output
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a LogRecord>,
    {
        let records: Vec<&LogRecord> = records.into_iter().collect();

        let extra_keys: Vec<String> = records
            .iter()
            .flat_map(|r| r.extra().keys())
            .unique()
            .cloned()
            .collect();

        let mut columns: Vec<String> =
            STANDARD_COLUMNS.iter().map(|c| c.to_string()).collect();
        columns.extend(extra_keys.iter().cloned());

        let rows = records
            .iter()
            .map(|record| {
                let mut row = vec![
                    Value::from(record.id() as u64),
                    Value::String(record.timestamp().to_rfc3339()),
                    Value::String(record.level().to_string()),
                    Value::String(record.logger_name().to_string()),
                    Value::String(record.module().to_string()),
                    Value::String(record.function().to_string()),
                    Value::String(record.message().to_string()),
                    record
                        .process_id()
                        .map_or(Value::Null, |pid| Value::String(pid.to_string())),
                ];
                for key in &extra_keys {
                    row.push(record.get_extra(key).cloned().unwrap_or(Value::Null));
                }
                row
            })
            .collect();

        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// cell lookup by row index and column name
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let index = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(index)
    }
}

/// render a cell the way a human wants to read it: strings bare, null empty
fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl fmt::Display for LogTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut widths: Vec<usize> = self.columns.iter().map(|c| c.len()).collect();
        let rendered: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();
        for row in &rendered {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.len());
            }
        }

        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, "  ")?;
            }
            write!(f, "{:width$}", column, width = widths[i])?;
        }
        writeln!(f)?;

        for row in &rendered {
            for (i, cell) in row.iter().enumerate() {
                if i > 0 {
                    write!(f, "  ")?;
                }
                write!(f, "{:width$}", cell, width = widths[i])?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
