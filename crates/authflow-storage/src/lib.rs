//! AuthFlow Storage - Low-level storage abstraction layer
//!
//! This crate provides the persistence layer for AuthFlow, using redb as the
//! embedded database. It exposes byte-level APIs to avoid circular
//! dependencies with the core crate's models.
//!
//! # Tables
//!
//! - `groups` - Sponsor group records
//! - `identities` - Managed identity records
//! - `identity_group_index` - Index for listing identities by group
//!
//! Typed wrappers over these byte-level APIs live in `authflow-core`. The
//! group/identity relationship is maintained explicitly through the index
//! table; deleting a group cascades over the index rather than relying on
//! any relational machinery.

pub mod group;
pub mod identity;
pub mod time_utils;

use anyhow::Result;
use redb::Database;
use std::sync::Arc;

pub use group::GroupStorage;
pub use identity::IdentityStorage;

/// Central storage manager that initializes all storage subsystems
pub struct Storage {
    db: Arc<Database>,
    pub groups: GroupStorage,
    pub identities: IdentityStorage,
}

impl Storage {
    /// Create a new storage instance at the given path.
    ///
    /// This will create the database file if it doesn't exist and initialize
    /// all required tables.
    pub fn new(path: &str) -> Result<Self> {
        let db = Arc::new(Database::create(path)?);

        let groups = GroupStorage::new(db.clone())?;
        let identities = IdentityStorage::new(db.clone())?;

        Ok(Self {
            db,
            groups,
            identities,
        })
    }

    /// Get a reference to the underlying database
    pub fn get_db(&self) -> Arc<Database> {
        self.db.clone()
    }
}
