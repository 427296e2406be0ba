//! # runlog-logger
//!
//! Coordinated run logging for multi-module programs.
//!
//! ## Overview
//!
//! Every logger in one program invocation should agree on a run identity (a
//! name, a start time, a directory for log files) and write to one shared set
//! of sink files. When several modules each attach handlers to a shared
//! logger naively, the same line ends up written N times; this crate
//! centralizes attachment in a [`HandlerRegistry`] so a sink is constructed
//! exactly once per logger, however many modules request it.
//!
//! ## Core Concepts
//!
//! - **[`RunIdentity`]**: immutable name/start-time/base-dir value, set once
//!   per registry. All sink file paths derive deterministically from it.
//! - **[`HandlerRegistry`]**: maps logger names to attached [`Sink`] handles.
//!   `attach` is idempotent, `join` shares a handle between loggers by
//!   reference, `remove` releases a handle once nobody holds it.
//! - **[`Logger`]**: emitting handle returned by [`configure_logger`], with
//!   one builder method per severity, including the custom
//!   [`performance`](Logger::performance) level.
//!
//! The JSON sink writes one object per line; its path is discoverable via
//! [`HandlerRegistry::json_file_path`] so downstream tools never have to scan
//! the filesystem. The `runlog-parser` crate reads that file back.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use runlog_logger::{configure_logger, ConfigureOptions, HandlerRegistry};
//! use serde_json::json;
//!
//! fn main() -> Result<(), runlog_logger::RegistryError> {
//!     let registry = HandlerRegistry::global();
//!     registry.set_run_identity("2025-01-15_103000_main", "data/logs")?;
//!
//!     let logger = configure_logger(registry, "main", ConfigureOptions::default())?;
//!     logger
//!         .info("pipeline started")
//!         .module("pipeline")
//!         .function("run")
//!         .extra("batch_size", json!(128))
//!         .emit()?;
//!     Ok(())
//! }
//! ```

pub mod configure;
pub mod error;
pub mod registry;
pub mod run_identity;
pub mod severity;
pub mod sink;

// re-export commonly used types
pub use configure::{ConfigureOptions, EventBuilder, Logger, configure, configure_logger};
pub use error::RegistryError;
pub use registry::HandlerRegistry;
pub use run_identity::{RunIdentity, compose_run_name};
pub use severity::{ParseSeverityError, Severity};
pub use sink::{Event, Sink, SinkKind};
