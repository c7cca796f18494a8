//! Terminal outcome persistence for flow runs.
//!
//! The flow engine never touches storage directly; it reads credentials from
//! the loaded identity and reports terminal outcomes through this seam. Every
//! failure path writes exactly one terminal update, and success paths clear
//! any prior failure reason.

use crate::models::{Identity, IdentityStatus};
use crate::storage::IdentityStore;
use anyhow::Result;
use authflow_storage::time_utils;
use tracing::info;

pub trait OutcomeSink: Send + Sync {
    fn load(&self, identity_id: &str) -> Result<Option<Identity>>;

    /// Record a run failure with its reason.
    fn mark_failed(&self, identity_id: &str, reason: &str) -> Result<()>;

    /// Record completion of the one-time activation step.
    fn mark_activated(&self, identity_id: &str) -> Result<()>;

    /// Record full onboarding. Clears any prior failure reason.
    fn mark_joined(&self, identity_id: &str) -> Result<()>;

    /// Stash a captured callback URL in the identity's annotation slot.
    fn store_note(&self, identity_id: &str, note: &str) -> Result<()>;

    /// Operator reset back to the start of the lifecycle.
    fn reset_to_pending(&self, identity_id: &str) -> Result<()>;
}

/// Storage-backed sink used by every real run.
#[derive(Clone)]
pub struct StorageOutcomeSink {
    identities: IdentityStore,
}

impl StorageOutcomeSink {
    pub fn new(identities: IdentityStore) -> Self {
        Self { identities }
    }

    fn update<F>(&self, identity_id: &str, apply: F) -> Result<()>
    where
        F: FnOnce(&mut Identity),
    {
        let mut identity = self
            .identities
            .get(identity_id)?
            .ok_or_else(|| anyhow::anyhow!("Identity {} not found", identity_id))?;
        apply(&mut identity);
        identity.updated_at = time_utils::now_ms();
        self.identities.save(&identity)
    }
}

impl OutcomeSink for StorageOutcomeSink {
    fn load(&self, identity_id: &str) -> Result<Option<Identity>> {
        self.identities.get(identity_id)
    }

    fn mark_failed(&self, identity_id: &str, reason: &str) -> Result<()> {
        info!(identity_id, reason, "marking identity failed");
        self.update(identity_id, |identity| {
            identity.status = IdentityStatus::Failed;
            identity.error = Some(reason.to_string());
        })
    }

    fn mark_activated(&self, identity_id: &str) -> Result<()> {
        info!(identity_id, "marking identity activated");
        self.update(identity_id, |identity| {
            identity.status = IdentityStatus::Activated;
            identity.error = None;
        })
    }

    fn mark_joined(&self, identity_id: &str) -> Result<()> {
        info!(identity_id, "marking identity joined");
        self.update(identity_id, |identity| {
            identity.status = IdentityStatus::Joined;
            identity.error = None;
        })
    }

    fn store_note(&self, identity_id: &str, note: &str) -> Result<()> {
        self.update(identity_id, |identity| {
            identity.note = Some(note.to_string());
        })
    }

    fn reset_to_pending(&self, identity_id: &str) -> Result<()> {
        self.update(identity_id, |identity| {
            identity.status = IdentityStatus::Pending;
            identity.error = None;
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Storage;
    use tempfile::tempdir;

    fn create_test_sink() -> (StorageOutcomeSink, Identity, tempfile::TempDir) {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let storage = Storage::new(db_path.to_str().unwrap()).unwrap();

        let group = crate::models::Group::new("p@x.com".to_string(), "P".to_string(), 5);
        storage.groups.save(&group).unwrap();
        let identity = storage
            .create_identity(&group.id, "a@x.com".to_string(), "pw".to_string(), None)
            .unwrap();

        (
            StorageOutcomeSink::new(storage.identities.clone()),
            identity,
            temp_dir,
        )
    }

    #[test]
    fn test_mark_failed_records_reason() {
        let (sink, identity, _dir) = create_test_sink();
        sink.mark_failed(&identity.id, "OAuth flow did not complete")
            .unwrap();

        let loaded = sink.load(&identity.id).unwrap().unwrap();
        assert_eq!(loaded.status, IdentityStatus::Failed);
        assert_eq!(loaded.error.as_deref(), Some("OAuth flow did not complete"));
        assert!(loaded.updated_at >= identity.updated_at);
    }

    #[test]
    fn test_mark_joined_clears_prior_failure() {
        let (sink, identity, _dir) = create_test_sink();
        sink.mark_failed(&identity.id, "transient").unwrap();
        sink.mark_joined(&identity.id).unwrap();

        let loaded = sink.load(&identity.id).unwrap().unwrap();
        assert_eq!(loaded.status, IdentityStatus::Joined);
        assert!(loaded.error.is_none());
    }

    #[test]
    fn test_store_note_keeps_status() {
        let (sink, identity, _dir) = create_test_sink();
        sink.store_note(&identity.id, "http://localhost:1234/cb?code=Z")
            .unwrap();

        let loaded = sink.load(&identity.id).unwrap().unwrap();
        assert_eq!(loaded.status, IdentityStatus::Pending);
        assert_eq!(
            loaded.note.as_deref(),
            Some("http://localhost:1234/cb?code=Z")
        );
    }

    #[test]
    fn test_reset_to_pending() {
        let (sink, identity, _dir) = create_test_sink();
        sink.mark_failed(&identity.id, "boom").unwrap();
        sink.reset_to_pending(&identity.id).unwrap();

        let loaded = sink.load(&identity.id).unwrap().unwrap();
        assert_eq!(loaded.status, IdentityStatus::Pending);
        assert!(loaded.error.is_none());
    }
}
