//! Table catalog: identifier validation, schema building, conflict policy and
//! the per-database namespaces that track which tables exist.

pub mod conflict;
pub mod ident;
pub mod namespace;
pub mod schema;
pub mod storage;
pub mod table;

use std::{fs, path::Path, sync::Arc};

use ahash::RandomState;
use common::{Config, ConflictError, DbError, DbResult, IdentifierKind, ObjectKind};
use hashbrown::HashMap;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub use conflict::{ConflictArg, ConflictMode, CreateAction, DropAction};
pub use ident::validate_identifier;
pub use namespace::{Namespace, NamespaceSnapshot};
pub use schema::{Column, SchemaBuilder, TableSchema};
pub use storage::{MemoryStorage, StorageEngine, StorageHandle};
pub use table::{TableHandle, TableMeta};

use conflict::{check_drop_mode, resolve_create, resolve_drop};

type Map<K, V> = HashMap<K, V, RandomState>;

/// On-disk image of the whole catalog.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub databases: Vec<NamespaceSnapshot>,
}

/// Registry of databases, each owning a table [`Namespace`].
///
/// The configured default database exists from construction and cannot be
/// dropped. Namespaces are handed out as `Arc`s; a caller holding one for a
/// database that is later dropped gets `NotFound` on further mutations.
pub struct Catalog {
    config: Config,
    storage: Arc<dyn StorageEngine>,
    databases: RwLock<Map<String, Arc<Namespace>>>,
    save_lock: Mutex<()>,
}

impl Catalog {
    /// Create a catalog backed by in-memory storage.
    pub fn new(config: Config) -> DbResult<Self> {
        let storage = Arc::new(MemoryStorage::new(&config));
        Self::with_storage(config, storage)
    }

    /// Create a catalog that reports allocations to `storage`.
    pub fn with_storage(config: Config, storage: Arc<dyn StorageEngine>) -> DbResult<Self> {
        validate_identifier(
            &config.default_database,
            IdentifierKind::Database,
            config.max_identifier_len,
        )?;
        let default = Arc::new(Namespace::new(
            &config.default_database,
            &config,
            Arc::clone(&storage),
        ));
        let mut databases = Map::default();
        databases.insert(config.default_database.clone(), default);
        Ok(Self {
            config,
            storage,
            databases: RwLock::new(databases),
            save_lock: Mutex::new(()),
        })
    }

    /// Load a catalog snapshot, returning a fresh catalog if the file does not exist.
    pub fn load(path: &Path, config: Config, storage: Arc<dyn StorageEngine>) -> DbResult<Self> {
        if !path.exists() {
            return Self::with_storage(config, storage);
        }
        let data = fs::read_to_string(path)?;
        let snapshot: CatalogSnapshot = serde_json::from_str(&data)
            .map_err(|err| DbError::Catalog(format!("invalid catalog file: {err}")))?;

        let catalog = Self::with_storage(config, storage)?;
        let mut staged: Map<String, Arc<Namespace>> = Map::default();
        for db in snapshot.databases {
            let restored = if staged.contains_key(&db.name) {
                Err(DbError::Catalog(format!(
                    "catalog file lists database '{}' twice",
                    common::clip_name(&db.name)
                )))
            } else {
                Namespace::restore(db, &catalog.config, Arc::clone(&catalog.storage))
            };
            match restored {
                Ok(namespace) => {
                    staged.insert(namespace.name().to_string(), Arc::new(namespace));
                }
                Err(err) => {
                    for namespace in staged.values() {
                        if let Err(release) = namespace.retire() {
                            warn!(
                                database = namespace.name(),
                                error = %release,
                                "failed to release storage after aborted load"
                            );
                        }
                    }
                    return Err(err);
                }
            }
        }
        catalog.databases.write().extend(staged);
        info!(
            path = %path.display(),
            databases = catalog.databases.read().len(),
            "loaded catalog snapshot"
        );
        Ok(catalog)
    }

    /// Persist the catalog contents as pretty JSON.
    pub fn save(&self, path: &Path) -> DbResult<()> {
        let _guard = self.save_lock.lock();
        let data = serde_json::to_string_pretty(&self.snapshot())
            .map_err(|err| DbError::Catalog(format!("serialize failed: {err}")))?;
        let staging = path.with_extension("tmp");
        fs::write(&staging, data)?;
        fs::rename(&staging, path)?;
        Ok(())
    }

    /// Save to the configured `catalog_file`, if one is set.
    pub fn persist(&self) -> DbResult<()> {
        match &self.config.catalog_file {
            Some(path) => self.save(path),
            None => Ok(()),
        }
    }

    pub fn snapshot(&self) -> CatalogSnapshot {
        let mut databases: Vec<NamespaceSnapshot> = self
            .databases
            .read()
            .values()
            .map(|ns| ns.snapshot())
            .collect();
        databases.sort_by(|a, b| a.name.cmp(&b.name));
        CatalogSnapshot { databases }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn create_database(&self, name: &str, mode: ConflictMode) -> DbResult<Arc<Namespace>> {
        validate_identifier(name, IdentifierKind::Database, self.config.max_identifier_len)?;

        let mut databases = self.databases.write();
        let existing = databases.get(name).cloned();
        let action = resolve_create(ObjectKind::Database, name, existing.is_some(), mode)?;
        match (action, existing) {
            (CreateAction::NoOp, Some(current)) => Ok(current),
            (CreateAction::ReplaceExisting, Some(previous)) => {
                if name == self.config.default_database {
                    return Err(DbError::ProtectedDatabase(name.to_string()));
                }
                previous.retire()?;
                let namespace = self.install(&mut databases, name);
                info!(database = name, "replaced database");
                Ok(namespace)
            }
            _ => {
                let namespace = self.install(&mut databases, name);
                info!(database = name, "created database");
                Ok(namespace)
            }
        }
    }

    pub fn drop_database(&self, name: &str, mode: ConflictMode) -> DbResult<()> {
        check_drop_mode(mode)?;
        validate_identifier(name, IdentifierKind::Database, self.config.max_identifier_len)?;

        let mut databases = self.databases.write();
        let existing = databases.get(name).cloned();
        match (resolve_drop(ObjectKind::Database, name, existing.is_some(), mode)?, existing) {
            (DropAction::Proceed, Some(namespace)) => {
                if name == self.config.default_database {
                    return Err(DbError::ProtectedDatabase(name.to_string()));
                }
                namespace.retire()?;
                databases.remove(name);
                info!(database = name, "dropped database");
            }
            _ => debug!(database = name, "drop ignored, database missing"),
        }
        Ok(())
    }

    /// Database names, sorted.
    pub fn list_databases(&self) -> Vec<String> {
        let mut names: Vec<String> = self.databases.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn database(&self, name: &str) -> DbResult<Arc<Namespace>> {
        self.databases
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| ConflictError::not_found(ObjectKind::Database, name).into())
    }

    pub fn default_database(&self) -> DbResult<Arc<Namespace>> {
        self.database(&self.config.default_database)
    }

    fn install(&self, databases: &mut Map<String, Arc<Namespace>>, name: &str) -> Arc<Namespace> {
        let namespace = Arc::new(Namespace::new(name, &self.config, Arc::clone(&self.storage)));
        databases.insert(name.to_string(), Arc::clone(&namespace));
        namespace
    }
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("databases", &self.list_databases())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use types::ColumnType;

    fn sample_columns() -> Vec<(String, String)> {
        vec![
            ("id".to_string(), "int, primary key".to_string()),
            ("name".to_string(), "varchar".to_string()),
            ("embedding".to_string(), "vector, 3, float".to_string()),
        ]
    }

    fn catalog() -> Catalog {
        Catalog::new(Config::default()).unwrap()
    }

    #[test]
    fn default_database_exists_and_is_protected() {
        let catalog = catalog();
        assert_eq!(catalog.list_databases(), vec!["default".to_string()]);

        let err = catalog
            .drop_database("default", ConflictMode::Error)
            .unwrap_err();
        assert!(matches!(err, DbError::ProtectedDatabase(_)));
        assert!(catalog.default_database().is_ok());
    }

    #[test]
    fn database_conflict_semantics_mirror_tables() {
        let catalog = catalog();
        catalog
            .create_database("analytics", ConflictMode::Error)
            .unwrap();
        assert!(matches!(
            catalog.create_database("analytics", ConflictMode::Error),
            Err(DbError::Conflict(ConflictError::AlreadyExists {
                kind: ObjectKind::Database,
                ..
            }))
        ));
        catalog
            .create_database("analytics", ConflictMode::Ignore)
            .unwrap();
        assert!(matches!(
            catalog.drop_database("analytics", ConflictMode::Replace),
            Err(DbError::Conflict(ConflictError::InvalidMode { .. }))
        ));
        catalog
            .drop_database("analytics", ConflictMode::Error)
            .unwrap();
        catalog
            .drop_database("analytics", ConflictMode::Ignore)
            .unwrap();
        assert!(matches!(
            catalog.drop_database("analytics", ConflictMode::Error),
            Err(DbError::Conflict(ConflictError::NotFound { .. }))
        ));
    }

    #[test]
    fn invalid_database_names_are_rejected() {
        let catalog = catalog();
        for name in ["", " ", "12", "name-12", "12name", "数据库名"] {
            assert!(matches!(
                catalog.create_database(name, ConflictMode::Error),
                Err(DbError::InvalidIdentifier {
                    kind: IdentifierKind::Database,
                    ..
                })
            ));
        }
        assert_eq!(catalog.list_databases().len(), 1);
    }

    #[test]
    fn dropping_a_database_releases_its_tables() {
        let config = Config::default();
        let storage = Arc::new(MemoryStorage::new(&config));
        let catalog = Catalog::with_storage(config, storage.clone()).unwrap();
        let db = catalog.create_database("scratch", ConflictMode::Error).unwrap();
        let cols = sample_columns();
        db.create_table("t1", Some(&cols), ConflictMode::Error).unwrap();
        db.create_table("t2", Some(&cols), ConflictMode::Error).unwrap();
        assert_eq!(storage.live_tables(), 2);

        catalog.drop_database("scratch", ConflictMode::Error).unwrap();
        assert_eq!(storage.live_tables(), 0);
        assert!(db.is_dropped());
        assert!(catalog.database("scratch").is_err());
    }

    #[test]
    fn replacing_a_database_starts_empty() {
        let catalog = catalog();
        let db = catalog.create_database("scratch", ConflictMode::Error).unwrap();
        db.create_table("t1", Some(&sample_columns()), ConflictMode::Error)
            .unwrap();

        let fresh = catalog
            .create_database("scratch", ConflictMode::Replace)
            .unwrap();
        assert_eq!(fresh.table_count(), 0);
        assert!(db.is_dropped());
    }

    #[test]
    fn persistence_round_trip() {
        let catalog = catalog();
        let db = catalog.default_database().unwrap();
        db.create_table("users", Some(&sample_columns()), ConflictMode::Error)
            .unwrap();
        let other = catalog.create_database("other", ConflictMode::Error).unwrap();
        other
            .create_table("events", Some(&sample_columns()), ConflictMode::Error)
            .unwrap();

        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        catalog.save(&path).unwrap();

        let config = Config::default();
        let storage = Arc::new(MemoryStorage::new(&config));
        let loaded = Catalog::load(&path, config, storage.clone()).unwrap();
        assert_eq!(loaded.list_databases(), vec!["default".to_string(), "other".to_string()]);
        let users = loaded.default_database().unwrap().get_table("users").unwrap();
        assert_eq!(users.schema.column_type(2), Some(&ColumnType::vector(ColumnType::Float32, 3)));
        assert_eq!(users.schema.primary_key, Some(0));
        assert_eq!(storage.live_tables(), 2);
    }

    #[test]
    fn load_missing_file_yields_fresh_catalog() {
        let dir = tempdir().unwrap();
        let config = Config::default();
        let storage = Arc::new(MemoryStorage::new(&config));
        let catalog = Catalog::load(&dir.path().join("absent.json"), config, storage).unwrap();
        assert_eq!(catalog.list_databases(), vec!["default".to_string()]);
    }

    fn two_database_snapshot() -> CatalogSnapshot {
        let catalog = catalog();
        catalog
            .default_database()
            .unwrap()
            .create_table("users", Some(&sample_columns()), ConflictMode::Error)
            .unwrap();
        catalog
            .create_database("other", ConflictMode::Error)
            .unwrap()
            .create_table("events", Some(&sample_columns()), ConflictMode::Error)
            .unwrap();
        catalog.snapshot()
    }

    fn load_snapshot(snapshot: &CatalogSnapshot) -> (DbResult<Catalog>, Arc<MemoryStorage>) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        fs::write(&path, serde_json::to_string(snapshot).unwrap()).unwrap();
        let config = Config::default();
        let storage = Arc::new(MemoryStorage::new(&config));
        (Catalog::load(&path, config, storage.clone()), storage)
    }

    #[test]
    fn rejected_load_releases_attached_handles() {
        let mut snapshot = two_database_snapshot();
        let other = &mut snapshot.databases[1];
        assert_eq!(other.name, "other");
        let duplicate = other.tables[0].clone();
        other.tables.push(duplicate);

        let (loaded, storage) = load_snapshot(&snapshot);
        assert!(matches!(loaded, Err(DbError::Catalog(_))));
        assert_eq!(storage.live_tables(), 0);
    }

    #[test]
    fn duplicate_database_in_snapshot_is_rejected() {
        let mut snapshot = two_database_snapshot();
        let again = snapshot.databases[0].clone();
        snapshot.databases.push(again);

        let (loaded, storage) = load_snapshot(&snapshot);
        assert!(matches!(loaded, Err(DbError::Catalog(_))));
        assert_eq!(storage.live_tables(), 0);
    }

    #[test]
    fn persist_is_a_no_op_without_a_file() {
        catalog().persist().unwrap();
    }

    #[test]
    fn rejects_invalid_default_database_name() {
        let config = Config::builder().default_database("1bad".to_string()).build();
        assert!(Catalog::new(config).is_err());
    }
}
