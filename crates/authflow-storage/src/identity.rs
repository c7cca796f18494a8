//! Identity storage - byte-level API for managed identity persistence.
//!
//! Identities belong to a sponsor group. Membership is tracked through an
//! explicit index table (`group_id:identity_id -> identity_id`) so that
//! listing by group and cascading a group delete are both plain table
//! operations with no relational cascade behind them.

use anyhow::Result;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::sync::Arc;

const IDENTITY_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("identities");
/// Index table: group_id:identity_id -> identity_id (for listing by group)
const IDENTITY_GROUP_INDEX_TABLE: TableDefinition<&str, &str> =
    TableDefinition::new("identity_group_index");

/// Low-level identity storage with byte-level API
#[derive(Clone)]
pub struct IdentityStorage {
    db: Arc<Database>,
}

impl IdentityStorage {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(IDENTITY_TABLE)?;
        write_txn.open_table(IDENTITY_GROUP_INDEX_TABLE)?;
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Store raw identity data and maintain the group index
    pub fn put_raw(&self, id: &str, group_id: &str, data: &[u8]) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(IDENTITY_TABLE)?;
            table.insert(id, data)?;

            let mut index_table = write_txn.open_table(IDENTITY_GROUP_INDEX_TABLE)?;
            let index_key = format!("{}:{}", group_id, id);
            index_table.insert(index_key.as_str(), id)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get raw identity data by ID
    pub fn get_raw(&self, id: &str) -> Result<Option<Vec<u8>>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(IDENTITY_TABLE)?;

        if let Some(value) = table.get(id)? {
            Ok(Some(value.value().to_vec()))
        } else {
            Ok(None)
        }
    }

    /// List all identities as (id, data) pairs
    pub fn list_raw(&self) -> Result<Vec<(String, Vec<u8>)>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(IDENTITY_TABLE)?;

        let mut identities = Vec::new();
        for item in table.iter()? {
            let (key, value) = item?;
            identities.push((key.value().to_string(), value.value().to_vec()));
        }

        Ok(identities)
    }

    /// List all identities belonging to a group
    pub fn list_for_group_raw(&self, group_id: &str) -> Result<Vec<(String, Vec<u8>)>> {
        let read_txn = self.db.begin_read()?;
        let index_table = read_txn.open_table(IDENTITY_GROUP_INDEX_TABLE)?;
        let identity_table = read_txn.open_table(IDENTITY_TABLE)?;

        let prefix = format!("{}:", group_id);
        let mut identities = Vec::new();

        for item in index_table.iter()? {
            let (key, value) = item?;
            let key_str = key.value();

            if key_str.starts_with(&prefix) {
                let identity_id = value.value();
                if let Some(data) = identity_table.get(identity_id)? {
                    identities.push((identity_id.to_string(), data.value().to_vec()));
                }
            }
        }

        Ok(identities)
    }

    /// Delete an identity by ID, returns true if it existed
    pub fn delete(&self, id: &str, group_id: &str) -> Result<bool> {
        let write_txn = self.db.begin_write()?;
        let existed = {
            let mut table = write_txn.open_table(IDENTITY_TABLE)?;
            let existed = table.remove(id)?.is_some();

            let mut index_table = write_txn.open_table(IDENTITY_GROUP_INDEX_TABLE)?;
            let index_key = format!("{}:{}", group_id, id);
            index_table.remove(index_key.as_str())?;

            existed
        };
        write_txn.commit()?;
        Ok(existed)
    }

    /// Delete all identities belonging to a group, returning how many were
    /// removed. This is the explicit cascade behind group deletion.
    pub fn delete_for_group(&self, group_id: &str) -> Result<u32> {
        let identities = self.list_for_group_raw(group_id)?;
        let count = identities.len() as u32;

        if count == 0 {
            return Ok(0);
        }

        let write_txn = self.db.begin_write()?;
        {
            let mut identity_table = write_txn.open_table(IDENTITY_TABLE)?;
            let mut index_table = write_txn.open_table(IDENTITY_GROUP_INDEX_TABLE)?;

            for (identity_id, _) in &identities {
                identity_table.remove(identity_id.as_str())?;
                let index_key = format!("{}:{}", group_id, identity_id);
                index_table.remove(index_key.as_str())?;
            }
        }
        write_txn.commit()?;

        Ok(count)
    }
}
