use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

use crate::sink::SinkKind;

/// immutable description of the current program run
///
/// All loggers configured against the same registry share one `RunIdentity`,
/// which pins the run name and the directory every sink file lives in.
#[derive(Debug, Clone)]
pub struct RunIdentity {
    name: String,
    started_at: DateTime<Local>,
    base_dir: PathBuf,
}

impl RunIdentity {
    pub fn new(name: impl Into<String>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            started_at: Local::now(),
            base_dir: base_dir.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// directory holding every sink file of this run: `{base_dir}/{name}`
    pub fn run_directory(&self) -> PathBuf {
        self.base_dir.join(&self.name)
    }

    /// resolved path of the JSON-lines sink, stable for the process lifetime
    pub fn json_file_path(&self) -> PathBuf {
        self.run_directory().join("json.json")
    }

    /// deterministic file path for a sink kind; console sinks have none
    pub fn sink_path(&self, kind: SinkKind) -> Option<PathBuf> {
        match kind {
            SinkKind::Console => None,
            SinkKind::File => Some(self.run_directory().join("file.log")),
            SinkKind::Json => Some(self.json_file_path()),
        }
    }
}

/// compose a run name carrying the current date and time, e.g. `2025-01-15_103000_main`
pub fn compose_run_name(prefix: &str) -> String {
    format!("{}_{}", Local::now().format("%Y-%m-%d_%H%M%S"), prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_directory_is_base_plus_name() {
        let identity = RunIdentity::new("trial", "/tmp/logs");
        assert_eq!(identity.run_directory(), PathBuf::from("/tmp/logs/trial"));
    }

    #[test]
    fn test_sink_paths() {
        let identity = RunIdentity::new("trial", "/tmp/logs");
        assert_eq!(
            identity.sink_path(SinkKind::File),
            Some(PathBuf::from("/tmp/logs/trial/file.log"))
        );
        assert_eq!(
            identity.sink_path(SinkKind::Json),
            Some(PathBuf::from("/tmp/logs/trial/json.json"))
        );
        assert_eq!(identity.sink_path(SinkKind::Console), None);
        assert_eq!(identity.json_file_path(), PathBuf::from("/tmp/logs/trial/json.json"));
    }

    #[test]
    fn test_compose_run_name_keeps_prefix() {
        let name = compose_run_name("main");
        assert!(name.ends_with("_main"));
        // date part: YYYY-MM-DD_HHMMSS
        assert_eq!(name.len(), "2025-01-15_103000_main".len());
    }
}
