//! Typed identity storage wrapper.

use crate::models::Identity;
use anyhow::Result;

#[derive(Clone)]
pub struct IdentityStore {
    inner: authflow_storage::IdentityStorage,
}

impl IdentityStore {
    pub fn new(inner: authflow_storage::IdentityStorage) -> Self {
        Self { inner }
    }

    pub fn save(&self, identity: &Identity) -> Result<()> {
        let bytes = serde_json::to_vec(identity)?;
        self.inner.put_raw(&identity.id, &identity.group_id, &bytes)
    }

    pub fn get(&self, id: &str) -> Result<Option<Identity>> {
        match self.inner.get_raw(id)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn list(&self) -> Result<Vec<Identity>> {
        let mut identities = Vec::new();
        for (_, bytes) in self.inner.list_raw()? {
            identities.push(serde_json::from_slice(&bytes)?);
        }
        Ok(identities)
    }

    pub fn list_for_group(&self, group_id: &str) -> Result<Vec<Identity>> {
        let mut identities = Vec::new();
        for (_, bytes) in self.inner.list_for_group_raw(group_id)? {
            identities.push(serde_json::from_slice(&bytes)?);
        }
        Ok(identities)
    }

    pub fn find_by_email(&self, email: &str) -> Result<Option<Identity>> {
        Ok(self.list()?.into_iter().find(|i| i.email == email))
    }

    pub fn delete(&self, id: &str) -> Result<bool> {
        match self.get(id)? {
            Some(identity) => self.inner.delete(id, &identity.group_id),
            None => Ok(false),
        }
    }

    /// Remove every identity in a group, returning how many were removed.
    pub fn delete_for_group(&self, group_id: &str) -> Result<u32> {
        self.inner.delete_for_group(group_id)
    }
}
