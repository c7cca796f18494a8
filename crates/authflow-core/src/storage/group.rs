//! Typed group storage wrapper.

use crate::models::Group;
use anyhow::Result;

#[derive(Clone)]
pub struct GroupStore {
    inner: authflow_storage::GroupStorage,
}

impl GroupStore {
    pub fn new(inner: authflow_storage::GroupStorage) -> Self {
        Self { inner }
    }

    pub fn save(&self, group: &Group) -> Result<()> {
        let bytes = serde_json::to_vec(group)?;
        self.inner.put_raw(&group.id, &bytes)
    }

    pub fn get(&self, id: &str) -> Result<Option<Group>> {
        match self.inner.get_raw(id)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn list(&self) -> Result<Vec<Group>> {
        let mut groups = Vec::new();
        for (_, bytes) in self.inner.list_raw()? {
            groups.push(serde_json::from_slice(&bytes)?);
        }
        Ok(groups)
    }

    pub fn find_by_email(&self, email: &str) -> Result<Option<Group>> {
        Ok(self.list()?.into_iter().find(|g| g.email == email))
    }

    /// Remove the group record only. Cascading over its identities is the
    /// caller's responsibility.
    pub fn delete(&self, id: &str) -> Result<bool> {
        self.inner.delete(id)
    }
}
