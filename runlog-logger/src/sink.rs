use chrono::{DateTime, Local};
use serde_json::{Map, Value};
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::severity::Severity;

/// the destinations a logger can write to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SinkKind {
    Console,
    File,
    Json,
}

impl SinkKind {
    pub const ALL: [SinkKind; 3] = [SinkKind::Console, SinkKind::File, SinkKind::Json];

    pub fn as_str(&self) -> &'static str {
        match self {
            SinkKind::Console => "console",
            SinkKind::File => "file",
            SinkKind::Json => "json",
        }
    }
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// one log event as handed to the sinks, before formatting
#[derive(Debug, Clone)]
pub struct Event {
    pub timestamp: DateTime<Local>,
    pub level: Severity,
    pub logger_name: String,
    pub module: String,
    pub function: String,
    pub message: String,
    pub process_id: Option<String>,
    pub extra: Map<String, Value>,
}

/// standard wire keys; extra keys never overwrite these
const STANDARD_KEYS: [&str; 7] = [
    "timestamp",
    "level",
    "logger_name",
    "module",
    "function",
    "message",
    "process_id",
];

enum SinkWriter {
    Stderr,
    File(File),
}

/// a shareable handle to one log destination
///
/// Joined loggers hold the same `Arc<Sink>`; the writer mutex keeps
/// concurrently emitted lines whole.
pub struct Sink {
    kind: SinkKind,
    path: Option<PathBuf>,
    writer: Mutex<SinkWriter>,
}

impl Sink {
    pub(crate) fn console() -> Sink {
        Sink {
            kind: SinkKind::Console,
            path: None,
            writer: Mutex::new(SinkWriter::Stderr),
        }
    }

    /// open (append, create) the backing file for a file-based sink
    pub(crate) fn open(kind: SinkKind, path: &Path) -> io::Result<Sink> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Sink {
            kind,
            path: Some(path.to_path_buf()),
            writer: Mutex::new(SinkWriter::File(file)),
        })
    }

    pub fn kind(&self) -> SinkKind {
        self.kind
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// write one event as a single line, flushing so readers see whole records
    pub fn write_event(&self, event: &Event) -> io::Result<()> {
        let line = match self.kind {
            SinkKind::Json => json_line(event)?,
            SinkKind::Console | SinkKind::File => text_line(event),
        };

        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        match &mut *writer {
            SinkWriter::Stderr => {
                let stderr = io::stderr();
                let mut handle = stderr.lock();
                writeln!(handle, "{}", line)?;
                handle.flush()
            }
            SinkWriter::File(file) => {
                writeln!(file, "{}", line)?;
                file.flush()
            }
        }
    }

    pub fn flush(&self) -> io::Result<()> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        match &mut *writer {
            SinkWriter::Stderr => io::stderr().flush(),
            SinkWriter::File(file) => file.flush(),
        }
    }
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink")
            .field("kind", &self.kind)
            .field("path", &self.path)
            .finish()
    }
}

/// human-readable rendering used by the console and file sinks
fn text_line(event: &Event) -> String {
    format!(
        "{} [{}][{}][{}]: {}",
        event.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
        event.level,
        event.module,
        event.function,
        event.message
    )
}

/// one JSON object per line: standard keys first, then extras flattened
fn json_line(event: &Event) -> io::Result<String> {
    let mut object = Map::new();
    object.insert(
        "timestamp".into(),
        Value::String(event.timestamp.to_rfc3339()),
    );
    object.insert("level".into(), Value::String(event.level.to_string()));
    object.insert(
        "logger_name".into(),
        Value::String(event.logger_name.clone()),
    );
    object.insert("module".into(), Value::String(event.module.clone()));
    object.insert("function".into(), Value::String(event.function.clone()));
    object.insert("message".into(), Value::String(event.message.clone()));
    if let Some(pid) = &event.process_id {
        object.insert("process_id".into(), Value::String(pid.clone()));
    }
    for (key, value) in &event.extra {
        if !STANDARD_KEYS.contains(&key.as_str()) {
            object.insert(key.clone(), value.clone());
        }
    }

    serde_json::to_string(&Value::Object(object)).map_err(io::Error::other)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_event() -> Event {
        let mut extra = Map::new();
        extra.insert("request_id".into(), json!("req-0001"));
        extra.insert("attempt".into(), json!(2));
        Event {
            timestamp: Local::now(),
            level: Severity::Info,
            logger_name: "main".into(),
            module: "auth".into(),
            function: "login".into(),
            message: "user logged in".into(),
            process_id: Some("4242".into()),
            extra,
        }
    }

    #[test]
    fn test_json_line_flattens_extras() {
        let line = json_line(&sample_event()).unwrap();
        let value: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["level"], "INFO");
        assert_eq!(value["logger_name"], "main");
        assert_eq!(value["message"], "user logged in");
        assert_eq!(value["process_id"], "4242");
        assert_eq!(value["request_id"], "req-0001");
        assert_eq!(value["attempt"], 2);
        // no nested container on the wire
        assert!(value.get("extra").is_none());
    }

    #[test]
    fn test_json_line_extras_cannot_shadow_standard_keys() {
        let mut event = sample_event();
        event.extra.insert("message".into(), json!("spoofed"));
        let line = json_line(&event).unwrap();
        let value: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["message"], "user logged in");
    }

    #[test]
    fn test_text_line_layout() {
        let event = sample_event();
        let line = text_line(&event);
        assert!(line.contains("[INFO][auth][login]: user logged in"));
    }

    #[test]
    fn test_file_sink_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file.log");
        let sink = Sink::open(SinkKind::File, &path).unwrap();
        sink.write_event(&sample_event()).unwrap();
        sink.write_event(&sample_event()).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }
}
