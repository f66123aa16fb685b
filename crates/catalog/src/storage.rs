//! Seam to the physical storage engine.
//!
//! The catalog never touches data blocks. It asks the engine for a physical
//! identity when a table is created, hands it back on drop, and passes the
//! engine's block/segment statistics through to listings.

use std::fmt;

use ahash::RandomState;
use common::{Config, DbError, DbResult, StorageStats};
use hashbrown::HashSet;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::TableSchema;

/// Opaque physical identity of a table, issued by the storage engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageHandle {
    pub file_id: Uuid,
}

impl StorageHandle {
    pub fn new() -> Self {
        Self {
            file_id: Uuid::new_v4(),
        }
    }
}

impl Default for StorageHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StorageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file_id)
    }
}

/// Operations the catalog needs from the storage engine.
///
/// Failures are fatal to the catalog operation that triggered them and are
/// never retried here.
pub trait StorageEngine: Send + Sync {
    fn allocate_table(
        &self,
        database: &str,
        table: &str,
        schema: &TableSchema,
    ) -> DbResult<StorageHandle>;

    fn deallocate_table(&self, handle: StorageHandle) -> DbResult<()>;

    /// Re-attaches a handle recorded in a catalog snapshot.
    fn attach_table(&self, handle: StorageHandle) -> DbResult<()>;

    fn table_stats(&self, handle: StorageHandle) -> StorageStats;
}

/// Storage engine that only tracks which handles are live.
#[derive(Debug)]
pub struct MemoryStorage {
    block_capacity: u64,
    segment_capacity: u64,
    live: Mutex<HashSet<StorageHandle, RandomState>>,
}

impl MemoryStorage {
    pub fn new(config: &Config) -> Self {
        Self {
            block_capacity: config.block_capacity,
            segment_capacity: config.segment_capacity,
            live: Mutex::new(HashSet::default()),
        }
    }

    pub fn live_tables(&self) -> usize {
        self.live.lock().len()
    }

    pub fn is_live(&self, handle: StorageHandle) -> bool {
        self.live.lock().contains(&handle)
    }
}

impl StorageEngine for MemoryStorage {
    fn allocate_table(
        &self,
        _database: &str,
        _table: &str,
        _schema: &TableSchema,
    ) -> DbResult<StorageHandle> {
        let handle = StorageHandle::new();
        self.live.lock().insert(handle);
        Ok(handle)
    }

    fn deallocate_table(&self, handle: StorageHandle) -> DbResult<()> {
        if self.live.lock().remove(&handle) {
            Ok(())
        } else {
            Err(DbError::Storage(format!("unknown storage handle {handle}")))
        }
    }

    fn attach_table(&self, handle: StorageHandle) -> DbResult<()> {
        if self.live.lock().insert(handle) {
            Ok(())
        } else {
            Err(DbError::Storage(format!(
                "storage handle {handle} is already attached"
            )))
        }
    }

    fn table_stats(&self, _handle: StorageHandle) -> StorageStats {
        StorageStats {
            block_count: 0,
            block_capacity: self.block_capacity,
            segment_count: 0,
            segment_capacity: self.segment_capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Column;
    use types::ColumnType;

    fn schema() -> TableSchema {
        TableSchema::try_new(vec![Column::new("c1", ColumnType::Int32)]).unwrap()
    }

    #[test]
    fn allocate_and_release() {
        let storage = MemoryStorage::new(&Config::default());
        let handle = storage.allocate_table("default", "t", &schema()).unwrap();
        assert!(storage.is_live(handle));
        assert_eq!(storage.live_tables(), 1);

        storage.deallocate_table(handle).unwrap();
        assert!(!storage.is_live(handle));
        assert!(matches!(
            storage.deallocate_table(handle),
            Err(DbError::Storage(_))
        ));
    }

    #[test]
    fn handles_are_unique() {
        let storage = MemoryStorage::new(&Config::default());
        let a = storage.allocate_table("default", "t", &schema()).unwrap();
        let b = storage.allocate_table("default", "t", &schema()).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn stats_report_configured_capacities() {
        let config = Config::builder()
            .block_capacity(16)
            .segment_capacity(256)
            .build();
        let storage = MemoryStorage::new(&config);
        let stats = storage.table_stats(StorageHandle::new());
        assert_eq!(stats.block_capacity, 16);
        assert_eq!(stats.segment_capacity, 256);
        assert_eq!(stats.block_count, 0);
    }

    #[test]
    fn attach_rejects_duplicates() {
        let storage = MemoryStorage::new(&Config::default());
        let handle = StorageHandle::new();
        storage.attach_table(handle).unwrap();
        assert!(storage.attach_table(handle).is_err());
    }
}
