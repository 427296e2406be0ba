use thiserror::Error;

use crate::sink::SinkKind;

/// errors surfaced by the handler registry and the configure entrypoint
#[derive(Debug, Error)]
pub enum RegistryError {
    /// run identity is write-once; a second `set_run_identity` is rejected
    #[error("run identity is already configured")]
    AlreadyConfigured,

    /// attach/path accessors require `set_run_identity` to have happened first
    #[error("run identity has not been configured")]
    NotConfigured,

    #[error("logger `{logger}` has no {kind} handler attached")]
    HandlerNotFound { logger: String, kind: SinkKind },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
