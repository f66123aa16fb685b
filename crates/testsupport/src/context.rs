//! Isolated catalogs for tests.
//!
//! [`TestCatalog`] owns a temporary directory for snapshot files and a
//! [`FailingStorage`] engine so a test can switch storage failures on and off
//! while driving the real catalog code.

use std::{
    path::{Path, PathBuf},
    sync::{
        Arc, Once,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use catalog::{Catalog, MemoryStorage, Namespace, StorageEngine, StorageHandle, TableSchema};
use common::{Config, DbError, DbResult, StorageStats};
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

static LOGGING: Once = Once::new();

/// Route `tracing` output through the test harness. Honours `RUST_LOG`.
pub fn init_test_logging() {
    LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Storage engine that delegates to [`MemoryStorage`] but can be told to fail.
#[derive(Debug)]
pub struct FailingStorage {
    inner: MemoryStorage,
    fail_allocate: AtomicBool,
    fail_deallocate: AtomicBool,
    allocations: AtomicUsize,
    deallocations: AtomicUsize,
}

impl FailingStorage {
    pub fn new(config: &Config) -> Self {
        Self {
            inner: MemoryStorage::new(config),
            fail_allocate: AtomicBool::new(false),
            fail_deallocate: AtomicBool::new(false),
            allocations: AtomicUsize::new(0),
            deallocations: AtomicUsize::new(0),
        }
    }

    pub fn fail_allocations(&self, fail: bool) {
        self.fail_allocate.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deallocations(&self, fail: bool) {
        self.fail_deallocate.store(fail, Ordering::SeqCst);
    }

    /// Successful allocations so far.
    pub fn allocations(&self) -> usize {
        self.allocations.load(Ordering::SeqCst)
    }

    /// Successful deallocations so far.
    pub fn deallocations(&self) -> usize {
        self.deallocations.load(Ordering::SeqCst)
    }

    pub fn live_tables(&self) -> usize {
        self.inner.live_tables()
    }

    pub fn is_live(&self, handle: StorageHandle) -> bool {
        self.inner.is_live(handle)
    }
}

impl StorageEngine for FailingStorage {
    fn allocate_table(
        &self,
        database: &str,
        table: &str,
        schema: &TableSchema,
    ) -> DbResult<StorageHandle> {
        if self.fail_allocate.load(Ordering::SeqCst) {
            return Err(DbError::Storage(format!(
                "injected allocation failure for {database}.{table}"
            )));
        }
        let handle = self.inner.allocate_table(database, table, schema)?;
        self.allocations.fetch_add(1, Ordering::SeqCst);
        Ok(handle)
    }

    fn deallocate_table(&self, handle: StorageHandle) -> DbResult<()> {
        if self.fail_deallocate.load(Ordering::SeqCst) {
            return Err(DbError::Storage(format!("injected deallocation failure for {handle}")));
        }
        self.inner.deallocate_table(handle)?;
        self.deallocations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn attach_table(&self, handle: StorageHandle) -> DbResult<()> {
        self.inner.attach_table(handle)
    }

    fn table_stats(&self, handle: StorageHandle) -> StorageStats {
        self.inner.table_stats(handle)
    }
}

/// A catalog with its own temporary directory and fault-injecting storage.
///
/// # Example
///
/// ```
/// use testsupport::prelude::*;
/// use catalog::ConflictMode;
///
/// let ctx = TestCatalog::new().unwrap();
/// ctx.storage().fail_allocations(true);
/// let result = ctx
///     .default_database()
///     .create_table("t", Some(&sample_columns()), ConflictMode::Error);
/// assert!(result.is_err());
/// ```
pub struct TestCatalog {
    _temp_dir: TempDir,
    snapshot_path: PathBuf,
    config: Config,
    storage: Arc<FailingStorage>,
    catalog: Arc<Catalog>,
}

impl TestCatalog {
    pub fn new() -> DbResult<Self> {
        Self::with_config(Config::default())
    }

    /// Build a test catalog from `config`. Any `catalog_file` is replaced by a
    /// path inside the temporary directory.
    pub fn with_config(config: Config) -> DbResult<Self> {
        init_test_logging();
        let temp_dir = tempfile::tempdir()?;
        let snapshot_path = temp_dir.path().join("catalog.json");
        let config = Config {
            catalog_file: Some(snapshot_path.clone()),
            ..config
        };
        let storage = Arc::new(FailingStorage::new(&config));
        let catalog = Catalog::with_storage(config.clone(), storage.clone())?;
        Ok(Self {
            _temp_dir: temp_dir,
            snapshot_path,
            config,
            storage,
            catalog: Arc::new(catalog),
        })
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn storage(&self) -> &Arc<FailingStorage> {
        &self.storage
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    /// The namespace of the configured default database.
    pub fn default_database(&self) -> Arc<Namespace> {
        match self.catalog.default_database() {
            Ok(ns) => ns,
            Err(err) => panic!("default database missing: {err}"),
        }
    }

    /// Write the current catalog to the snapshot file and load it back into a
    /// fresh catalog over fresh storage.
    pub fn reload(&self) -> DbResult<Catalog> {
        self.catalog.save(&self.snapshot_path)?;
        let storage: Arc<dyn StorageEngine> = Arc::new(MemoryStorage::new(&self.config));
        Catalog::load(&self.snapshot_path, self.config.clone(), storage)
    }
}
