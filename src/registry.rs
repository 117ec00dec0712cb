//! Single-slot holder of the currently serving generated module.
//!
//! Readers call [`ActiveModuleRegistry::current_snapshot`] and get an `Arc` to an
//! immutable [`ModuleSnapshot`]; module and version always come from the same install.
//! Writers are serialized by a mutex and publish with a single `ArcSwap::store`, so a
//! reader never blocks on a writer and never observes a half-installed module.

use crate::builder::HandlerModule;
use arc_swap::ArcSwap;
use std::sync::{Arc, Mutex};
use tracing::info;

/// Immutable view of the registry at one instant.
#[derive(Debug, Default)]
pub struct ModuleSnapshot {
    module: Option<Arc<HandlerModule>>,
    version: u64,
}

impl ModuleSnapshot {
    /// The active module, or `None` if nothing was ever installed
    #[must_use]
    pub fn module(&self) -> Option<&Arc<HandlerModule>> {
        self.module.as_ref()
    }

    /// Version of the active module (`0` while empty)
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.module.is_none()
    }
}

/// Process-wide slot for the active generated module.
#[derive(Debug, Default)]
pub struct ActiveModuleRegistry {
    slot: ArcSwap<ModuleSnapshot>,
    write_lock: Mutex<()>,
}

impl ActiveModuleRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `candidate` as the active module and return its version.
    ///
    /// The previous module is released once every snapshot that still references it
    /// has been dropped.
    pub fn replace(&self, candidate: HandlerModule) -> u64 {
        // The guarded data is `()`, so a poisoned lock carries no broken state.
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let version = self.slot.load().version + 1;
        let groups = candidate.group_names();
        self.slot.store(Arc::new(ModuleSnapshot {
            module: Some(Arc::new(candidate)),
            version,
        }));

        info!(version = version, groups = ?groups, "Activated generated module");
        version
    }

    /// Consistent snapshot of the active module and its version.
    #[must_use]
    pub fn current_snapshot(&self) -> Arc<ModuleSnapshot> {
        self.slot.load_full()
    }
}
