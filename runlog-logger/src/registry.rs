use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::RegistryError;
use crate::run_identity::RunIdentity;
use crate::sink::{Sink, SinkKind};

static GLOBAL: Lazy<Arc<HandlerRegistry>> = Lazy::new(|| Arc::new(HandlerRegistry::new()));

#[derive(Default)]
struct RegistryInner {
    identity: Option<RunIdentity>,
    attachments: HashMap<String, HashMap<SinkKind, Arc<Sink>>>,
}

/// coordinates sink handlers across loggers so one run writes to one set of files
///
/// The registry maps logger names to their attached sink handles. `attach` is
/// idempotent, so several modules can each request the same sink without a
/// single message ever being written twice. A handle can be shared between
/// loggers via [`join`](HandlerRegistry::join); it is released when the last
/// logger referencing it is removed.
///
/// A registry is an explicit context object you can construct per test or per
/// subsystem; [`HandlerRegistry::global`] is the documented process-wide
/// default used by convenience callers.
pub struct HandlerRegistry {
    inner: Mutex<RegistryInner>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RegistryInner::default()),
        }
    }

    /// process-wide default registry
    pub fn global() -> Arc<HandlerRegistry> {
        GLOBAL.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// establish the run identity once; creates the run directory
    pub fn set_run_identity(
        &self,
        name: impl Into<String>,
        base_dir: impl Into<PathBuf>,
    ) -> Result<RunIdentity, RegistryError> {
        let mut inner = self.lock();
        if inner.identity.is_some() {
            return Err(RegistryError::AlreadyConfigured);
        }

        let identity = RunIdentity::new(name, base_dir);
        fs::create_dir_all(identity.run_directory())?;
        log::debug!(
            "run identity set: {} under {}",
            identity.name(),
            identity.base_dir().display()
        );
        inner.identity = Some(identity.clone());
        Ok(identity)
    }

    pub fn run_identity(&self) -> Result<RunIdentity, RegistryError> {
        self.lock()
            .identity
            .clone()
            .ok_or(RegistryError::NotConfigured)
    }

    /// resolved path of the shared JSON sink, for downstream parsing
    pub fn json_file_path(&self) -> Result<PathBuf, RegistryError> {
        Ok(self.run_identity()?.json_file_path())
    }

    /// attach a sink to a logger, constructing it on first request
    ///
    /// Re-requesting an attached sink returns the existing handle, never a
    /// duplicate. File-backed sinks are opened under the run directory.
    pub fn attach(&self, logger_name: &str, kind: SinkKind) -> Result<Arc<Sink>, RegistryError> {
        let mut inner = self.lock();
        if let Some(existing) = inner
            .attachments
            .get(logger_name)
            .and_then(|sinks| sinks.get(&kind))
        {
            return Ok(existing.clone());
        }

        let identity = inner.identity.as_ref().ok_or(RegistryError::NotConfigured)?;
        let sink = match identity.sink_path(kind) {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                Arc::new(Sink::open(kind, &path)?)
            }
            None => Arc::new(Sink::console()),
        };

        log::debug!("attached {} sink for logger `{}`", kind, logger_name);
        inner
            .attachments
            .entry(logger_name.to_string())
            .or_default()
            .insert(kind, sink.clone());
        Ok(sink)
    }

    /// make `logger_name` share the handle `other_logger_name` already owns
    ///
    /// The handle is shared by reference, not copied; both loggers write
    /// through the same underlying file.
    pub fn join(
        &self,
        logger_name: &str,
        other_logger_name: &str,
        kind: SinkKind,
    ) -> Result<Arc<Sink>, RegistryError> {
        let mut inner = self.lock();
        let shared = inner
            .attachments
            .get(other_logger_name)
            .and_then(|sinks| sinks.get(&kind))
            .cloned()
            .ok_or_else(|| RegistryError::HandlerNotFound {
                logger: other_logger_name.to_string(),
                kind,
            })?;

        log::debug!(
            "logger `{}` joined {} sink of `{}`",
            logger_name,
            kind,
            other_logger_name
        );
        inner
            .attachments
            .entry(logger_name.to_string())
            .or_default()
            .insert(kind, shared.clone());
        Ok(shared)
    }

    /// detach a sink from a logger; the handle is flushed and released once no
    /// other logger references it
    pub fn remove(&self, logger_name: &str, kind: SinkKind) -> Result<(), RegistryError> {
        let mut inner = self.lock();
        let removed = inner
            .attachments
            .get_mut(logger_name)
            .and_then(|sinks| sinks.remove(&kind))
            .ok_or_else(|| RegistryError::HandlerNotFound {
                logger: logger_name.to_string(),
                kind,
            })?;
        if inner
            .attachments
            .get(logger_name)
            .is_some_and(|sinks| sinks.is_empty())
        {
            inner.attachments.remove(logger_name);
        }

        let still_shared = inner
            .attachments
            .values()
            .any(|sinks| sinks.get(&kind).is_some_and(|s| Arc::ptr_eq(s, &removed)));
        if !still_shared {
            log::debug!("releasing {} sink last held by `{}`", kind, logger_name);
            removed.flush()?;
        }
        Ok(())
    }

    /// snapshot of the sinks attached to a logger, for emission
    pub fn sinks_for(&self, logger_name: &str) -> Vec<Arc<Sink>> {
        let inner = self.lock();
        let Some(sinks) = inner.attachments.get(logger_name) else {
            return Vec::new();
        };
        let mut snapshot: Vec<Arc<Sink>> = sinks.values().cloned().collect();
        snapshot.sort_by_key(|sink| sink.kind());
        snapshot
    }

    /// sink kinds currently attached to a logger, in ascending kind order
    pub fn handler_names(&self, logger_name: &str) -> Vec<SinkKind> {
        let inner = self.lock();
        let mut kinds: Vec<SinkKind> = inner
            .attachments
            .get(logger_name)
            .map(|sinks| sinks.keys().copied().collect())
            .unwrap_or_default();
        kinds.sort();
        kinds
    }

    pub fn is_attached(&self, logger_name: &str, kind: SinkKind) -> bool {
        self.lock()
            .attachments
            .get(logger_name)
            .is_some_and(|sinks| sinks.contains_key(&kind))
    }

    /// flush and drop every handle and clear the identity; test isolation
    pub fn reset(&self) {
        let mut inner = self.lock();
        for sinks in inner.attachments.values() {
            for sink in sinks.values() {
                if let Err(err) = sink.flush() {
                    log::warn!("flush on reset failed for {} sink: {}", sink.kind(), err);
                }
            }
        }
        inner.attachments.clear();
        inner.identity = None;
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("HandlerRegistry")
            .field("identity", &inner.identity)
            .field("loggers", &inner.attachments.keys())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::tempdir;

    fn configured_registry(dir: &Path) -> HandlerRegistry {
        let registry = HandlerRegistry::new();
        registry.set_run_identity("trial", dir).unwrap();
        registry
    }

    #[test]
    fn test_set_run_identity_twice_is_rejected() {
        let dir = tempdir().unwrap();
        let registry = configured_registry(dir.path());
        let err = registry.set_run_identity("other", dir.path()).unwrap_err();
        assert!(matches!(err, RegistryError::AlreadyConfigured));
    }

    #[test]
    fn test_attach_requires_identity() {
        let registry = HandlerRegistry::new();
        let err = registry.attach("a", SinkKind::File).unwrap_err();
        assert!(matches!(err, RegistryError::NotConfigured));
    }

    #[test]
    fn test_attach_is_idempotent() {
        let dir = tempdir().unwrap();
        let registry = configured_registry(dir.path());
        let first = registry.attach("a", SinkKind::File).unwrap();
        let second = registry.attach("a", SinkKind::File).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.handler_names("a"), vec![SinkKind::File]);
    }

    #[test]
    fn test_attach_creates_backing_file() {
        let dir = tempdir().unwrap();
        let registry = configured_registry(dir.path());
        let sink = registry.attach("a", SinkKind::Json).unwrap();
        assert_eq!(sink.path(), Some(dir.path().join("trial/json.json").as_path()));
        assert!(dir.path().join("trial/json.json").exists());
    }

    #[test]
    fn test_json_file_path_matches_identity() {
        let dir = tempdir().unwrap();
        let registry = configured_registry(dir.path());
        assert_eq!(
            registry.json_file_path().unwrap(),
            dir.path().join("trial/json.json")
        );
    }

    #[test]
    fn test_json_file_path_before_identity() {
        let registry = HandlerRegistry::new();
        assert!(matches!(
            registry.json_file_path(),
            Err(RegistryError::NotConfigured)
        ));
    }

    #[test]
    fn test_join_shares_the_same_handle() {
        let dir = tempdir().unwrap();
        let registry = configured_registry(dir.path());
        let owned = registry.attach("a", SinkKind::File).unwrap();
        let shared = registry.join("b", "a", SinkKind::File).unwrap();
        assert!(Arc::ptr_eq(&owned, &shared));
        assert!(registry.is_attached("b", SinkKind::File));
    }

    #[test]
    fn test_join_without_source_handle_fails() {
        let dir = tempdir().unwrap();
        let registry = configured_registry(dir.path());
        let err = registry.join("b", "a", SinkKind::File).unwrap_err();
        match err {
            RegistryError::HandlerNotFound { logger, kind } => {
                assert_eq!(logger, "a");
                assert_eq!(kind, SinkKind::File);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_remove_detaches_only_the_named_logger() {
        let dir = tempdir().unwrap();
        let registry = configured_registry(dir.path());
        registry.attach("a", SinkKind::File).unwrap();
        registry.join("b", "a", SinkKind::File).unwrap();

        registry.remove("a", SinkKind::File).unwrap();
        assert!(!registry.is_attached("a", SinkKind::File));
        // b still holds the shared handle until explicitly un-joined
        assert!(registry.is_attached("b", SinkKind::File));
    }

    #[test]
    fn test_remove_unknown_handle_fails() {
        let dir = tempdir().unwrap();
        let registry = configured_registry(dir.path());
        let err = registry.remove("a", SinkKind::Json).unwrap_err();
        assert!(matches!(err, RegistryError::HandlerNotFound { .. }));
    }

    #[test]
    fn test_reset_clears_identity_and_handles() {
        let dir = tempdir().unwrap();
        let registry = configured_registry(dir.path());
        registry.attach("a", SinkKind::Json).unwrap();
        registry.reset();
        assert!(!registry.is_attached("a", SinkKind::Json));
        assert!(matches!(
            registry.run_identity(),
            Err(RegistryError::NotConfigured)
        ));
        // a fresh identity can be established after reset
        registry.set_run_identity("second", dir.path()).unwrap();
    }
}
