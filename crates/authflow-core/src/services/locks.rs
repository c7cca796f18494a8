//! Per-identity run locks.
//!
//! Two concurrent runs against one identity would share a Chrome profile
//! directory and corrupt each other. Launching a run acquires the identity's
//! lock up front and fails fast when it is already held.

use anyhow::Result;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct RunLocks {
    held: Arc<Mutex<HashSet<String>>>,
}

impl RunLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for an identity. Errors immediately when a run is
    /// already active for it.
    pub fn acquire(&self, identity_id: &str) -> Result<RunLockGuard> {
        let mut held = self.held.lock();
        if !held.insert(identity_id.to_string()) {
            return Err(anyhow::anyhow!(
                "A run is already active for identity {}",
                identity_id
            ));
        }
        Ok(RunLockGuard {
            held: self.held.clone(),
            identity_id: identity_id.to_string(),
        })
    }

    pub fn is_held(&self, identity_id: &str) -> bool {
        self.held.lock().contains(identity_id)
    }
}

/// Releases the identity's lock when dropped.
pub struct RunLockGuard {
    held: Arc<Mutex<HashSet<String>>>,
    identity_id: String,
}

impl Drop for RunLockGuard {
    fn drop(&mut self) {
        self.held.lock().remove(&self.identity_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_fails_while_held() {
        let locks = RunLocks::new();
        let guard = locks.acquire("id-1").unwrap();

        assert!(locks.acquire("id-1").is_err());
        assert!(locks.is_held("id-1"));

        drop(guard);
        assert!(!locks.is_held("id-1"));
        assert!(locks.acquire("id-1").is_ok());
    }

    #[test]
    fn test_distinct_identities_do_not_contend() {
        let locks = RunLocks::new();
        let _a = locks.acquire("id-1").unwrap();
        let _b = locks.acquire("id-2").unwrap();
        assert!(locks.is_held("id-1"));
        assert!(locks.is_held("id-2"));
    }
}
