//! Group storage - byte-level API for sponsor group persistence.

use anyhow::Result;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::sync::Arc;

const GROUP_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("groups");

/// Low-level group storage with byte-level API
#[derive(Clone)]
pub struct GroupStorage {
    db: Arc<Database>,
}

impl GroupStorage {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        let write_txn = db.begin_write()?;
        write_txn.open_table(GROUP_TABLE)?;
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// Store raw group data by ID
    pub fn put_raw(&self, id: &str, data: &[u8]) -> Result<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(GROUP_TABLE)?;
            table.insert(id, data)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Get raw group data by ID
    pub fn get_raw(&self, id: &str) -> Result<Option<Vec<u8>>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(GROUP_TABLE)?;

        if let Some(value) = table.get(id)? {
            Ok(Some(value.value().to_vec()))
        } else {
            Ok(None)
        }
    }

    /// List all groups as (id, data) pairs
    pub fn list_raw(&self) -> Result<Vec<(String, Vec<u8>)>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(GROUP_TABLE)?;

        let mut groups = Vec::new();
        for item in table.iter()? {
            let (key, value) = item?;
            groups.push((key.value().to_string(), value.value().to_vec()));
        }

        Ok(groups)
    }

    /// Delete a group by ID, returns true if it existed.
    ///
    /// Only removes the group record itself; cascading over the group's
    /// identities is the caller's responsibility (see
    /// `IdentityStorage::delete_for_group`).
    pub fn delete(&self, id: &str) -> Result<bool> {
        let write_txn = self.db.begin_write()?;
        let existed = {
            let mut table = write_txn.open_table(GROUP_TABLE)?;
            table.remove(id)?.is_some()
        };
        write_txn.commit()?;
        Ok(existed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn create_test_storage() -> GroupStorage {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db = Arc::new(Database::create(db_path).unwrap());
        GroupStorage::new(db).unwrap()
    }

    #[test]
    fn test_put_and_get_raw() {
        let storage = create_test_storage();

        let data = b"test group data";
        storage.put_raw("group-001", data).unwrap();

        let retrieved = storage.get_raw("group-001").unwrap();
        assert!(retrieved.is_some());
        assert_eq!(retrieved.unwrap(), data);
    }

    #[test]
    fn test_get_nonexistent_group() {
        let storage = create_test_storage();

        let result = storage.get_raw("nonexistent").unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_list_raw() {
        let storage = create_test_storage();

        storage.put_raw("group-001", b"data1").unwrap();
        storage.put_raw("group-002", b"data2").unwrap();

        let groups = storage.list_raw().unwrap();
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn test_delete() {
        let storage = create_test_storage();

        storage.put_raw("group-001", b"data").unwrap();

        let deleted = storage.delete("group-001").unwrap();
        assert!(deleted);

        let retrieved = storage.get_raw("group-001").unwrap();
        assert!(retrieved.is_none());

        // Deleting again should return false
        let deleted_again = storage.delete("group-001").unwrap();
        assert!(!deleted_again);
    }
}
