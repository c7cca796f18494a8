pub mod config;
pub mod flow;
pub mod models;
pub mod paths;
pub mod pipeline;
pub mod services;
pub mod storage;

pub use models::*;

use anyhow::Result;
use config::Config;
use services::{RunLocks, RunRegistry, StorageOutcomeSink};
use std::sync::Arc;
use storage::Storage;
use tracing::info;

/// Core application state shared by every entry point.
///
/// Owns the typed storage, the run registry, and the per-identity run locks;
/// all three are injected from here rather than reached through globals.
pub struct AppCore {
    pub storage: Arc<Storage>,
    pub registry: RunRegistry,
    pub locks: RunLocks,
    pub config: Config,
}

impl AppCore {
    pub fn new(db_path: &str, config: Config) -> Result<Self> {
        let storage = Arc::new(Storage::new(db_path)?);
        info!("Initializing AuthFlow");

        Ok(Self {
            storage,
            registry: RunRegistry::new(),
            locks: RunLocks::new(),
            config,
        })
    }

    /// The storage-backed outcome sink used by flow runs.
    pub fn outcome_sink(&self) -> StorageOutcomeSink {
        StorageOutcomeSink::new(self.storage.identities.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_app_core_initializes() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let core = AppCore::new(db_path.to_str().unwrap(), Config::default()).unwrap();

        assert!(core.storage.groups.list().unwrap().is_empty());
        assert!(core.registry.list().is_empty());
        assert!(!core.locks.is_held("anything"));
    }
}
