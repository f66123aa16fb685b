//! Per-database table namespace.
//!
//! All mutation happens under the namespace's exclusive lock: the existence
//! check, conflict resolution, storage call and map update for a create or
//! drop form one critical section, so operations on the same name are
//! linearizable. Readers clone `Arc` handles out of the map and never see a
//! partially built entry. Identifier validation and schema building are pure
//! and run before the lock is taken.

use std::sync::Arc;

use ahash::RandomState;
use common::{
    ColumnSummary, Config, ConflictError, DbError, DbResult, IdentifierKind, ObjectKind,
    TableDetail, TableId, TableSummary, clip_name,
};
use hashbrown::HashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    conflict::{
        ConflictMode, CreateAction, DropAction, check_drop_mode, resolve_create, resolve_drop,
    },
    ident::validate_identifier,
    schema::{SchemaBuilder, TableSchema},
    storage::{StorageEngine, StorageHandle},
    table::{TableHandle, TableMeta},
};

type Map<K, V> = HashMap<K, V, RandomState>;

/// Serializable image of a namespace, used by catalog snapshots.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NamespaceSnapshot {
    pub name: String,
    pub next_table_id: u64,
    pub tables: Vec<TableMeta>,
}

struct NamespaceState {
    tables: Map<String, TableHandle>,
    next_table_id: u64,
    dropped: bool,
}

impl NamespaceState {
    fn install(&mut self, name: &str, schema: TableSchema, storage: StorageHandle) -> TableHandle {
        let id = TableId(self.next_table_id);
        self.next_table_id += 1;
        let table = Arc::new(TableMeta::new(id, name.to_string(), schema, storage));
        self.tables.insert(name.to_string(), Arc::clone(&table));
        table
    }
}

/// The tables of one database.
pub struct Namespace {
    name: String,
    max_identifier_len: usize,
    schemas: SchemaBuilder,
    storage: Arc<dyn StorageEngine>,
    state: RwLock<NamespaceState>,
}

impl Namespace {
    /// Creates an empty namespace. The database name must already be valid.
    pub fn new(name: &str, config: &Config, storage: Arc<dyn StorageEngine>) -> Self {
        Self {
            name: name.to_string(),
            max_identifier_len: config.max_identifier_len,
            schemas: SchemaBuilder::new(config),
            storage,
            state: RwLock::new(NamespaceState {
                tables: Map::default(),
                next_table_id: 1,
                dropped: false,
            }),
        }
    }

    /// Rebuilds a namespace from a snapshot, re-attaching every storage handle.
    ///
    /// On failure every handle attached so far is released again, so a
    /// rejected snapshot leaves the storage engine as it found it.
    pub fn restore(
        snapshot: NamespaceSnapshot,
        config: &Config,
        storage: Arc<dyn StorageEngine>,
    ) -> DbResult<Self> {
        validate_identifier(&snapshot.name, IdentifierKind::Database, config.max_identifier_len)?;
        let namespace = Self::new(&snapshot.name, config, storage);
        let mut attached = Vec::with_capacity(snapshot.tables.len());
        let restored = namespace.restore_tables(
            snapshot.next_table_id,
            snapshot.tables,
            config,
            &mut attached,
        );
        if let Err(err) = restored {
            for (handle, table) in attached {
                namespace.release_quietly(
                    handle,
                    &table,
                    "failed to release storage after aborted restore",
                );
            }
            return Err(err);
        }
        Ok(namespace)
    }

    fn restore_tables(
        &self,
        next_table_id: u64,
        tables: Vec<TableMeta>,
        config: &Config,
        attached: &mut Vec<(StorageHandle, String)>,
    ) -> DbResult<()> {
        let mut state = self.state.write();
        state.next_table_id = next_table_id;
        for table in tables {
            validate_identifier(&table.name, IdentifierKind::Table, config.max_identifier_len)?;
            if state.tables.contains_key(&table.name) {
                return Err(DbError::Catalog(format!(
                    "snapshot of database '{}' lists table '{}' twice",
                    self.name,
                    clip_name(&table.name)
                )));
            }
            self.storage.attach_table(table.storage)?;
            attached.push((table.storage, table.name.clone()));
            state.next_table_id = state.next_table_id.max(table.id.0 + 1);
            state.tables.insert(table.name.clone(), Arc::new(table));
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creates `name` from raw column specifications under `mode`.
    ///
    /// With `Ignore` on an existing table the current entry is returned
    /// unchanged. With `Replace` the new physical table is allocated first and
    /// the old one released second; if either step fails the old entry stays.
    pub fn create_table(
        &self,
        name: &str,
        columns: Option<&[(String, String)]>,
        mode: ConflictMode,
    ) -> DbResult<TableHandle> {
        validate_identifier(name, IdentifierKind::Table, self.max_identifier_len)?;
        let schema = self.schemas.build(columns)?;

        let mut state = self.state.write();
        self.ensure_live(&state)?;
        let existing = state.tables.get(name).cloned();
        let action = resolve_create(ObjectKind::Table, name, existing.is_some(), mode)?;

        match (action, existing) {
            (CreateAction::NoOp, Some(current)) => {
                debug!(database = %self.name, table = name, "create ignored, table exists");
                Ok(current)
            }
            (CreateAction::ReplaceExisting, Some(previous)) => {
                let handle = self.storage.allocate_table(&self.name, name, &schema)?;
                if let Err(err) = self.storage.deallocate_table(previous.storage) {
                    self.release_quietly(
                        handle,
                        name,
                        "failed to release storage after aborted replace",
                    );
                    return Err(err);
                }
                let table = state.install(name, schema, handle);
                debug!(
                    database = %self.name,
                    table = name,
                    old_id = previous.id.0,
                    new_id = table.id.0,
                    columns = table.column_count(),
                    "replaced table"
                );
                Ok(table)
            }
            _ => {
                let handle = self.storage.allocate_table(&self.name, name, &schema)?;
                let table = state.install(name, schema, handle);
                debug!(
                    database = %self.name,
                    table = name,
                    id = table.id.0,
                    columns = table.column_count(),
                    "created table"
                );
                Ok(table)
            }
        }
    }

    /// Drops `name` under `mode`. `Replace` is rejected before any lookup.
    pub fn drop_table(&self, name: &str, mode: ConflictMode) -> DbResult<()> {
        check_drop_mode(mode)?;
        validate_identifier(name, IdentifierKind::Table, self.max_identifier_len)?;

        let mut state = self.state.write();
        self.ensure_live(&state)?;
        let existing = state.tables.get(name).cloned();
        match (resolve_drop(ObjectKind::Table, name, existing.is_some(), mode)?, existing) {
            (DropAction::Proceed, Some(table)) => {
                self.storage.deallocate_table(table.storage)?;
                state.tables.remove(name);
                debug!(database = %self.name, table = name, id = table.id.0, "dropped table");
            }
            _ => {
                debug!(database = %self.name, table = name, "drop ignored, table missing");
            }
        }
        Ok(())
    }

    /// Looks up a committed table.
    pub fn get_table(&self, name: &str) -> DbResult<TableHandle> {
        self.state
            .read()
            .tables
            .get(name)
            .cloned()
            .ok_or_else(|| ConflictError::not_found(ObjectKind::Table, name).into())
    }

    /// Lists every table committed at the moment the read lock was held,
    /// ordered by name.
    pub fn list_tables(&self) -> Vec<TableSummary> {
        let mut snapshot = self.handles();
        snapshot.sort_by(|a, b| a.name.cmp(&b.name));
        snapshot
            .iter()
            .map(|table| {
                TableSummary::new(
                    &self.name,
                    &table.name,
                    table.column_count(),
                    self.storage.table_stats(table.storage),
                )
            })
            .collect()
    }

    pub fn show_table(&self, name: &str) -> DbResult<TableDetail> {
        let table = self.get_table(name)?;
        Ok(TableDetail {
            database: self.name.clone(),
            table: table.name.clone(),
            table_id: table.id,
            column_count: table.column_count(),
            primary_key: table.schema.primary_key_column().map(|c| c.name.clone()),
            stats: self.storage.table_stats(table.storage),
        })
    }

    pub fn show_columns(&self, name: &str) -> DbResult<Vec<ColumnSummary>> {
        Ok(self.get_table(name)?.column_summaries())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.state.read().tables.contains_key(name)
    }

    pub fn table_count(&self) -> usize {
        self.state.read().tables.len()
    }

    pub fn is_dropped(&self) -> bool {
        self.state.read().dropped
    }

    pub fn snapshot(&self) -> NamespaceSnapshot {
        let state = self.state.read();
        let mut tables: Vec<TableMeta> = state.tables.values().map(|t| (**t).clone()).collect();
        tables.sort_by_key(|t| t.id);
        NamespaceSnapshot {
            name: self.name.clone(),
            next_table_id: state.next_table_id,
            tables,
        }
    }

    /// Releases every table's storage and retires the namespace.
    ///
    /// Tables are removed one at a time; if the storage engine refuses one,
    /// the remaining tables stay registered and the namespace stays live.
    pub(crate) fn retire(&self) -> DbResult<()> {
        let mut state = self.state.write();
        let mut tables: Vec<TableHandle> = state.tables.values().cloned().collect();
        tables.sort_by_key(|t| t.id);
        for table in tables {
            self.storage.deallocate_table(table.storage)?;
            state.tables.remove(&table.name);
        }
        state.dropped = true;
        Ok(())
    }

    fn handles(&self) -> Vec<TableHandle> {
        self.state.read().tables.values().cloned().collect()
    }

    fn ensure_live(&self, state: &NamespaceState) -> DbResult<()> {
        if state.dropped {
            return Err(ConflictError::not_found(ObjectKind::Database, &self.name).into());
        }
        Ok(())
    }

    fn release_quietly(&self, handle: StorageHandle, table: &str, message: &'static str) {
        if let Err(err) = self.storage.deallocate_table(handle) {
            warn!(database = %self.name, table, %handle, error = %err, "{message}");
        }
    }
}

impl std::fmt::Debug for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Namespace")
            .field("name", &self.name)
            .field("tables", &self.table_count())
            .finish()
    }
}
