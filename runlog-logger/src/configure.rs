use chrono::Local;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::error::RegistryError;
use crate::registry::HandlerRegistry;
use crate::severity::Severity;
use crate::sink::{Event, SinkKind};

/// options for [`configure_logger`]
#[derive(Debug, Clone)]
pub struct ConfigureOptions {
    /// also attach the console sink (stderr)
    pub console: bool,
}

impl Default for ConfigureOptions {
    fn default() -> Self {
        Self { console: true }
    }
}

/// configure a named logger against a registry
///
/// Attaches the file and JSON sinks (and the console sink unless disabled)
/// under the registry's run identity and returns an emitting handle. Safe to
/// call repeatedly for the same name; attachment is idempotent.
pub fn configure_logger(
    registry: Arc<HandlerRegistry>,
    logger_name: &str,
    options: ConfigureOptions,
) -> Result<Logger, RegistryError> {
    registry.attach(logger_name, SinkKind::File)?;
    registry.attach(logger_name, SinkKind::Json)?;
    if options.console {
        registry.attach(logger_name, SinkKind::Console)?;
    }
    log::debug!("configured logger `{}`", logger_name);
    Ok(Logger {
        name: logger_name.to_string(),
        registry,
    })
}

/// configure a logger against the process-wide registry with default options
pub fn configure(logger_name: &str) -> Result<Logger, RegistryError> {
    configure_logger(
        HandlerRegistry::global(),
        logger_name,
        ConfigureOptions::default(),
    )
}

/// emitting handle for one logger name
///
/// Cheap to clone; all clones write through the handles registered for the
/// name at emit time.
#[derive(Debug, Clone)]
pub struct Logger {
    name: String,
    registry: Arc<HandlerRegistry>,
}

impl Logger {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// start an event at an arbitrary severity
    pub fn record(&self, level: Severity, message: impl Into<String>) -> EventBuilder<'_> {
        EventBuilder {
            logger: self,
            event: Event {
                timestamp: Local::now(),
                level,
                logger_name: self.name.clone(),
                module: String::new(),
                function: String::new(),
                message: message.into(),
                process_id: Some(std::process::id().to_string()),
                extra: Map::new(),
            },
        }
    }

    pub fn debug(&self, message: impl Into<String>) -> EventBuilder<'_> {
        self.record(Severity::Debug, message)
    }

    pub fn info(&self, message: impl Into<String>) -> EventBuilder<'_> {
        self.record(Severity::Info, message)
    }

    pub fn warning(&self, message: impl Into<String>) -> EventBuilder<'_> {
        self.record(Severity::Warning, message)
    }

    pub fn error(&self, message: impl Into<String>) -> EventBuilder<'_> {
        self.record(Severity::Error, message)
    }

    pub fn critical(&self, message: impl Into<String>) -> EventBuilder<'_> {
        self.record(Severity::Critical, message)
    }

    /// the custom severity for timing and throughput measurements
    pub fn performance(&self, message: impl Into<String>) -> EventBuilder<'_> {
        self.record(Severity::Performance, message)
    }
}

/// builder for a single event; created by the [`Logger`] severity methods
#[must_use = "events are only written on emit()"]
pub struct EventBuilder<'a> {
    logger: &'a Logger,
    event: Event,
}

impl EventBuilder<'_> {
    pub fn module(mut self, module: impl Into<String>) -> Self {
        self.event.module = module.into();
        self
    }

    pub fn function(mut self, function: impl Into<String>) -> Self {
        self.event.function = function.into();
        self
    }

    pub fn process_id(mut self, process_id: impl Into<String>) -> Self {
        self.event.process_id = Some(process_id.into());
        self
    }

    /// attach free-form structured context to the event
    pub fn extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.event.extra.insert(key.into(), value.into());
        self
    }

    /// write the event through every sink attached to the logger
    pub fn emit(mut self) -> Result<(), RegistryError> {
        self.event.timestamp = Local::now();
        for sink in self.logger.registry.sinks_for(&self.logger.name) {
            sink.write_event(&self.event)?;
        }
        Ok(())
    }
}
