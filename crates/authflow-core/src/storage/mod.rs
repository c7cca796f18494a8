//! Typed storage wrappers over the byte-level persistence layer.
//!
//! Cross-record rules live here: group capacity, unique identity email, and
//! the explicit cascade when a group is deleted.

pub mod group;
pub mod identity;

pub use group::GroupStore;
pub use identity::IdentityStore;

use crate::models::{Group, Identity};
use anyhow::Result;

/// Central typed storage, owning one store per record type.
pub struct Storage {
    pub groups: GroupStore,
    pub identities: IdentityStore,
}

impl Storage {
    pub fn new(db_path: &str) -> Result<Self> {
        let inner = authflow_storage::Storage::new(db_path)?;
        Ok(Self {
            groups: GroupStore::new(inner.groups.clone()),
            identities: IdentityStore::new(inner.identities.clone()),
        })
    }

    /// Create an identity under a group, enforcing group capacity and email
    /// uniqueness across all identities.
    pub fn create_identity(
        &self,
        group_id: &str,
        email: String,
        password: String,
        totp_secret: Option<String>,
    ) -> Result<Identity> {
        let group = self
            .groups
            .get(group_id)?
            .ok_or_else(|| anyhow::anyhow!("Group {} not found", group_id))?;

        let members = self.identities.list_for_group(group_id)?;
        if members.len() as u32 >= group.max_identities {
            return Err(anyhow::anyhow!(
                "Group '{}' is full ({} of {} identities)",
                group.nickname,
                members.len(),
                group.max_identities
            ));
        }

        if self.identities.find_by_email(&email)?.is_some() {
            return Err(anyhow::anyhow!("An identity with email {} already exists", email));
        }

        let identity = Identity::new(group_id.to_string(), email, password, totp_secret);
        self.identities.save(&identity)?;
        Ok(identity)
    }

    /// Delete a group and every identity in it. Returns the group and the
    /// number of identities removed.
    pub fn delete_group_cascade(&self, group_id: &str) -> Result<(Group, u32)> {
        let group = self
            .groups
            .get(group_id)?
            .ok_or_else(|| anyhow::anyhow!("Group {} not found", group_id))?;

        let removed = self.identities.delete_for_group(group_id)?;
        self.groups.delete(group_id)?;
        Ok((group, removed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Group;
    use tempfile::tempdir;

    fn create_test_storage() -> (Storage, tempfile::TempDir) {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let storage = Storage::new(db_path.to_str().unwrap()).unwrap();
        (storage, temp_dir)
    }

    fn add_group(storage: &Storage, max: u32) -> Group {
        let group = Group::new("sponsor@x.com".to_string(), "Sponsor".to_string(), max);
        storage.groups.save(&group).unwrap();
        group
    }

    #[test]
    fn test_create_identity_under_group() {
        let (storage, _dir) = create_test_storage();
        let group = add_group(&storage, 5);

        let identity = storage
            .create_identity(&group.id, "a@x.com".to_string(), "pw".to_string(), None)
            .unwrap();

        assert_eq!(identity.group_id, group.id);
        let listed = storage.identities.list_for_group(&group.id).unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[test]
    fn test_capacity_is_enforced() {
        let (storage, _dir) = create_test_storage();
        let group = add_group(&storage, 1);

        storage
            .create_identity(&group.id, "a@x.com".to_string(), "pw".to_string(), None)
            .unwrap();
        let err = storage
            .create_identity(&group.id, "b@x.com".to_string(), "pw".to_string(), None)
            .unwrap_err();
        assert!(err.to_string().contains("full"));
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let (storage, _dir) = create_test_storage();
        let group = add_group(&storage, 5);

        storage
            .create_identity(&group.id, "a@x.com".to_string(), "pw".to_string(), None)
            .unwrap();
        let err = storage
            .create_identity(&group.id, "a@x.com".to_string(), "pw2".to_string(), None)
            .unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_delete_group_cascades_to_identities() {
        let (storage, _dir) = create_test_storage();
        let group = add_group(&storage, 5);

        storage
            .create_identity(&group.id, "a@x.com".to_string(), "pw".to_string(), None)
            .unwrap();
        storage
            .create_identity(&group.id, "b@x.com".to_string(), "pw".to_string(), None)
            .unwrap();

        let (deleted, removed) = storage.delete_group_cascade(&group.id).unwrap();
        assert_eq!(deleted.id, group.id);
        assert_eq!(removed, 2);

        assert!(storage.groups.get(&group.id).unwrap().is_none());
        assert!(storage.identities.list().unwrap().is_empty());
    }

    #[test]
    fn test_missing_group_is_an_error() {
        let (storage, _dir) = create_test_storage();
        let err = storage
            .create_identity("nope", "a@x.com".to_string(), "pw".to_string(), None)
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
