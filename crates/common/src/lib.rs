
pub mod pretty;

use serde::{Deserialize, Serialize};
use std::{fmt, io, path::PathBuf};
use tabled::Tabled;
use thiserror::Error;
use types::TypeError;

/// Ordinal of a column within a table schema.
/// Examples:
/// - `let id_col: ColumnId = 0; // first declared column`
/// - `let embedding_col: ColumnId = 3;`
pub type ColumnId = u16;

/// Hard ceiling on columns per table, bounded by the width of `ColumnId`.
pub const MAX_COLUMNS: usize = ColumnId::MAX as usize;

/// Logical identifier for a table registered in a database namespace.
/// Identifiers are never reused within a namespace, even after a drop.
/// Examples:
/// - `let users = TableId(7);`
/// - `let orders = TableId(11);`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableId(pub u64);

/// What an identifier names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdentifierKind {
    Database,
    Table,
    Column,
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IdentifierKind::Database => "database",
            IdentifierKind::Table => "table",
            IdentifierKind::Column => "column",
        })
    }
}

/// Catalog objects that can collide on create or go missing on drop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    Database,
    Table,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ObjectKind::Database => "database",
            ObjectKind::Table => "table",
        })
    }
}

/// The lexical rule an identifier broke.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum IdentifierIssue {
    #[error("name must not be empty")]
    Empty,
    #[error("name is {len} bytes, longer than the {max} byte limit")]
    TooLong { len: usize, max: usize },
    #[error("name must not consist only of whitespace")]
    Blank,
    #[error("name must start with a letter or underscore, found {0:?}")]
    InvalidStart(char),
    #[error("name may only contain letters, digits and underscores, found {0:?}")]
    InvalidCharacter(char),
}

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum SchemaError {
    #[error("table must contain at least one column")]
    Empty,
    #[error("columns '{first}' and '{second}' are both marked as primary key")]
    MultiplePrimaryKeys { first: String, second: String },
    #[error("table declares {count} columns, more than the limit of {max}")]
    TooManyColumns { count: usize, max: usize },
    #[error("duplicate column '{0}' found while building schema")]
    DuplicateColumn(String),
}

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum ConflictError {
    #[error("{kind} '{name}' already exists")]
    AlreadyExists { kind: ObjectKind, name: String },
    #[error("{kind} '{name}' does not exist")]
    NotFound { kind: ObjectKind, name: String },
    #[error("invalid conflict type: {reason}")]
    InvalidMode { reason: String },
}

impl ConflictError {
    pub fn already_exists(kind: ObjectKind, name: &str) -> Self {
        ConflictError::AlreadyExists {
            kind,
            name: clip_name(name),
        }
    }

    pub fn not_found(kind: ObjectKind, name: &str) -> Self {
        ConflictError::NotFound {
            kind,
            name: clip_name(name),
        }
    }

    pub fn invalid_mode(reason: impl Into<String>) -> Self {
        ConflictError::InvalidMode {
            reason: reason.into(),
        }
    }
}

/// Canonical error type shared across catalog subsystems.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("invalid {kind} name '{name}': {issue}")]
    InvalidIdentifier {
        kind: IdentifierKind,
        name: String,
        issue: IdentifierIssue,
    },
    #[error("column '{column}': {source}")]
    UnknownType {
        column: String,
        #[source]
        source: TypeError,
    },
    #[error("schema: {0}")]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Conflict(#[from] ConflictError),
    #[error("database '{0}' is protected and cannot be dropped")]
    ProtectedDatabase(String),
    #[error("storage: {0}")]
    Storage(String),
    #[error("catalog: {0}")]
    Catalog(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl DbError {
    pub fn invalid_identifier(kind: IdentifierKind, name: &str, issue: IdentifierIssue) -> Self {
        DbError::InvalidIdentifier {
            kind,
            name: clip_name(name),
            issue,
        }
    }

    pub fn unknown_type(column: &str, source: TypeError) -> Self {
        DbError::UnknownType {
            column: clip_name(column),
            source,
        }
    }
}

/// Result alias that carries a `DbError`.
pub type DbResult<T> = Result<T, DbError>;

/// Shortens user-supplied names before they are echoed in error messages.
pub fn clip_name(name: &str) -> String {
    const MAX_ECHO: usize = 64;
    match name.char_indices().nth(MAX_ECHO) {
        Some((idx, _)) => format!("{}...", &name[..idx]),
        None => name.to_string(),
    }
}

/// Runtime configuration for the catalog.
///
/// # Example
/// ```
/// use common::Config;
///
/// let config = Config::builder()
///     .max_identifier_len(128)
///     .default_database("main".to_string())
///     .build();
/// assert_eq!(config.max_identifier_len, 128);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize, bon::Builder)]
pub struct Config {
    /// Longest accepted identifier, in bytes.
    #[builder(default = 65_535)]
    pub max_identifier_len: usize,
    /// Most columns a single table may declare. Capped at `MAX_COLUMNS`.
    #[builder(default = MAX_COLUMNS)]
    pub max_columns: usize,
    /// Largest dimension accepted for vector columns.
    #[builder(default = types::DEFAULT_MAX_VECTOR_DIMENSION)]
    pub max_vector_dimension: u32,
    /// Database created with every catalog. It can never be dropped.
    #[builder(default = "default".to_string())]
    pub default_database: String,
    /// Rows per block reported by the in-memory storage engine.
    #[builder(default = 8192)]
    pub block_capacity: u64,
    /// Rows per segment reported by the in-memory storage engine.
    #[builder(default = 8_388_608)]
    pub segment_capacity: u64,
    /// Where catalog snapshots are written, if anywhere.
    pub catalog_file: Option<PathBuf>,
}

impl Config {
    pub fn column_limit(&self) -> usize {
        self.max_columns.min(MAX_COLUMNS)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::builder().build()
    }
}

/// Physical statistics the storage engine reports for one table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageStats {
    pub block_count: u64,
    pub block_capacity: u64,
    pub segment_count: u64,
    pub segment_capacity: u64,
}

/// One row of `list_tables` output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Tabled)]
pub struct TableSummary {
    pub database: String,
    pub table: String,
    #[serde(rename = "type")]
    #[tabled(rename = "type")]
    pub table_type: String,
    pub column_count: usize,
    pub block_count: u64,
    pub block_capacity: u64,
    pub segment_count: u64,
    pub segment_capacity: u64,
}

impl TableSummary {
    pub fn new(database: &str, table: &str, column_count: usize, stats: StorageStats) -> Self {
        Self {
            database: database.to_string(),
            table: table.to_string(),
            table_type: "Table".to_string(),
            column_count,
            block_count: stats.block_count,
            block_capacity: stats.block_capacity,
            segment_count: stats.segment_count,
            segment_capacity: stats.segment_capacity,
        }
    }
}

/// One row of `show_columns` output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Tabled)]
pub struct ColumnSummary {
    pub name: String,
    #[serde(rename = "type")]
    #[tabled(rename = "type")]
    pub column_type: String,
    pub primary_key: bool,
}

/// Detailed description of a single table, as returned by `show_table`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDetail {
    pub database: String,
    pub table: String,
    pub table_id: TableId,
    pub column_count: usize,
    pub primary_key: Option<String>,
    pub stats: StorageStats,
}

/// Convenient re-exports for downstream crates.
pub mod prelude {
    pub use crate::{
        ColumnSummary, Config, ConflictError, DbError, DbResult, IdentifierIssue,
        IdentifierKind, ObjectKind, SchemaError, StorageStats, TableDetail, TableId,
        TableSummary,
    };
    pub use types::{ColumnType, TypeRegistry};
}
