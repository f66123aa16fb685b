use std::sync::Arc;

use common::{ColumnSummary, TableId};
use serde::{Deserialize, Serialize};

use crate::{schema::TableSchema, storage::StorageHandle};

/// Shared, read-only view of a committed table.
pub type TableHandle = Arc<TableMeta>;

/// Metadata describing a registered table.
///
/// Entries are immutable once installed. Replacing a table installs a new
/// entry with a fresh id; holders of the old handle keep seeing the old
/// schema.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMeta {
    /// Creation sequence number within the namespace. Never reused.
    pub id: TableId,
    pub name: String,
    pub schema: TableSchema,
    pub storage: StorageHandle,
}

impl TableMeta {
    pub(crate) fn new(
        id: TableId,
        name: String,
        schema: TableSchema,
        storage: StorageHandle,
    ) -> Self {
        Self {
            id,
            name,
            schema,
            storage,
        }
    }

    pub fn column_count(&self) -> usize {
        self.schema.len()
    }

    pub fn creation_seq(&self) -> u64 {
        self.id.0
    }

    pub fn column_summaries(&self) -> Vec<ColumnSummary> {
        self.schema.columns.iter().map(|c| c.summary()).collect()
    }
}
