use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use runlog_logger::Severity;

/// wire keys extracted into dedicated fields; everything else becomes `extra`
const STANDARD_KEYS: [&str; 7] = [
    "timestamp",
    "level",
    "logger_name",
    "module",
    "function",
    "message",
    "process_id",
];

/// one normalized log event, immutable once constructed by the parser
///
/// Ids are assigned sequentially in file order during `load()` and are unique
/// within one loaded parser instance, not across loads.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    id: usize,
    timestamp: DateTime<Utc>,
    level: Severity,
    logger_name: String,
    module: String,
    function: String,
    message: String,
    process_id: Option<String>,
    extra: Map<String, Value>,
}

impl LogRecord {
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn level(&self) -> Severity {
        self.level
    }

    pub fn logger_name(&self) -> &str {
        &self.logger_name
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn process_id(&self) -> Option<&str> {
        self.process_id.as_deref()
    }

    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    pub fn has_extra(&self, key: &str) -> bool {
        self.extra.contains_key(key)
    }

    /// look up a key in `extra`; pure, no failure on a missing key
    pub fn get_extra(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// look up a key in `extra`, falling back to `default` when absent
    pub fn get_extra_or<'a>(&'a self, key: &str, default: &'a Value) -> &'a Value {
        self.extra.get(key).unwrap_or(default)
    }

    /// normalize one parsed JSON-lines object into a record
    ///
    /// Required keys: `timestamp` (RFC 3339), `level`, `logger_name`,
    /// `module`, `function`, `message`. `process_id` is optional. Remaining
    /// keys land in `extra`; a nested `extra` object (older emitters wrote
    /// one) is merged in flat. When `extra` ends up holding a string
    /// `process_id`, that value wins over the top-level field.
    pub(crate) fn from_json(id: usize, value: &Value) -> Result<Self, String> {
        let object = value
            .as_object()
            .ok_or_else(|| "line is not a JSON object".to_string())?;

        let timestamp_raw = required_str(object, "timestamp")?;
        let timestamp = DateTime::parse_from_rfc3339(&timestamp_raw)
            .map_err(|e| format!("bad timestamp `{timestamp_raw}`: {e}"))?
            .with_timezone(&Utc);

        let level = required_str(object, "level")?
            .parse::<Severity>()
            .map_err(|e| e.to_string())?;

        let mut process_id = match object.get("process_id") {
            Some(Value::String(pid)) => Some(pid.clone()),
            Some(_) => return Err("field `process_id` is not a string".to_string()),
            None => None,
        };

        let mut extra = Map::new();
        for (key, val) in object {
            if STANDARD_KEYS.contains(&key.as_str()) {
                continue;
            }
            // merge a nested extra object flat; keep scalar `extra` verbatim
            if key == "extra"
                && let Some(inner) = val.as_object()
            {
                for (inner_key, inner_val) in inner {
                    extra.insert(inner_key.clone(), inner_val.clone());
                }
            } else {
                extra.insert(key.clone(), val.clone());
            }
        }

        // last-writer-wins: a process_id carried inside extra overrides the
        // top-level field; the key stays visible in extra
        if let Some(Value::String(pid)) = extra.get("process_id") {
            process_id = Some(pid.clone());
        }

        Ok(LogRecord {
            id,
            timestamp,
            level,
            logger_name: required_str(object, "logger_name")?,
            module: required_str(object, "module")?,
            function: required_str(object, "function")?,
            message: required_str(object, "message")?,
            process_id,
            extra,
        })
    }
}

fn required_str(object: &Map<String, Value>, key: &str) -> Result<String, String> {
    match object.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(format!("field `{key}` is not a string")),
        None => Err(format!("missing required field `{key}`")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn well_formed() -> Value {
        json!({
            "timestamp": "2025-01-15T10:30:00.123+00:00",
            "level": "INFO",
            "logger_name": "main",
            "module": "auth",
            "function": "login",
            "message": "user logged in",
            "process_id": "4242",
            "request_id": "req-0001",
            "attempt": 2
        })
    }

    #[test]
    fn test_normalizes_standard_fields() {
        let record = LogRecord::from_json(7, &well_formed()).unwrap();
        assert_eq!(record.id(), 7);
        assert_eq!(record.level(), Severity::Info);
        assert_eq!(record.logger_name(), "main");
        assert_eq!(record.module(), "auth");
        assert_eq!(record.function(), "login");
        assert_eq!(record.message(), "user logged in");
        assert_eq!(record.process_id(), Some("4242"));
        assert_eq!(record.timestamp().to_rfc3339(), "2025-01-15T10:30:00.123+00:00");
    }

    #[test]
    fn test_remaining_keys_become_extra() {
        let record = LogRecord::from_json(0, &well_formed()).unwrap();
        assert_eq!(record.get_extra("request_id"), Some(&json!("req-0001")));
        assert_eq!(record.get_extra("attempt"), Some(&json!(2)));
        assert_eq!(record.extra().len(), 2);
    }

    #[test]
    fn test_get_extra_or_falls_back() {
        let record = LogRecord::from_json(0, &well_formed()).unwrap();
        let default = json!("none");
        assert_eq!(record.get_extra_or("missing", &default), &default);
        assert_eq!(record.get_extra_or("attempt", &default), &json!(2));
    }

    #[test]
    fn test_missing_required_field_is_rejected() {
        let mut value = well_formed();
        value.as_object_mut().unwrap().remove("message");
        let err = LogRecord::from_json(0, &value).unwrap_err();
        assert!(err.contains("message"));
    }

    #[test]
    fn test_bad_timestamp_is_rejected() {
        let mut value = well_formed();
        value["timestamp"] = json!("yesterday");
        assert!(LogRecord::from_json(0, &value).is_err());
    }

    #[test]
    fn test_unknown_level_is_rejected() {
        let mut value = well_formed();
        value["level"] = json!("TRACE");
        assert!(LogRecord::from_json(0, &value).is_err());
    }

    #[test]
    fn test_non_object_line_is_rejected() {
        assert!(LogRecord::from_json(0, &json!([1, 2, 3])).is_err());
        assert!(LogRecord::from_json(0, &json!("text")).is_err());
    }

    #[test]
    fn test_nested_extra_object_is_merged_flat() {
        let value = json!({
            "timestamp": "2025-01-15T10:30:00Z",
            "level": "DEBUG",
            "logger_name": "main",
            "module": "m",
            "function": "f",
            "message": "msg",
            "extra": {"warning_code": 1234}
        });
        let record = LogRecord::from_json(0, &value).unwrap();
        assert_eq!(record.get_extra("warning_code"), Some(&json!(1234)));
        assert!(!record.has_extra("extra"));
    }

    #[test]
    fn test_process_id_in_extra_wins_over_top_level() {
        let value = json!({
            "timestamp": "2025-01-15T10:30:00Z",
            "level": "DEBUG",
            "logger_name": "main",
            "module": "m",
            "function": "f",
            "message": "msg",
            "process_id": "1",
            "extra": {"process_id": "2"}
        });
        let record = LogRecord::from_json(0, &value).unwrap();
        assert_eq!(record.process_id(), Some("2"));
        // the reconciled key is still part of the extra mapping
        assert!(record.has_extra("process_id"));
        assert_eq!(record.get_extra("process_id"), Some(&json!("2")));
    }
}
