//! Request/response messages for the catalog service.
//!
//! Requests carry raw, untrusted arguments (the conflict mode arrives as a
//! [`ConflictArg`] and is only parsed by the service). Responses always carry a
//! numeric error code so callers can branch without matching on messages.
//! Messages are length-prefixed using bincode encoding.

use catalog::{ConflictArg, TableMeta};
use common::{ColumnSummary, TableDetail, TableSummary};
use serde::{Deserialize, Serialize};

/// Request message sent to the catalog service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CatalogRequest {
    CreateDatabase {
        name: String,
        conflict: Option<ConflictArg>,
    },
    DropDatabase {
        name: String,
        conflict: Option<ConflictArg>,
    },
    ListDatabases,
    /// `columns: None` models a caller that passed no column list at all.
    CreateTable {
        database: String,
        table: String,
        columns: Option<Vec<(String, String)>>,
        conflict: Option<ConflictArg>,
    },
    DropTable {
        database: String,
        table: String,
        conflict: Option<ConflictArg>,
    },
    ListTables {
        database: String,
    },
    GetTable {
        database: String,
        table: String,
    },
    ShowTable {
        database: String,
        table: String,
    },
    ShowColumns {
        database: String,
        table: String,
    },
}

impl CatalogRequest {
    /// Short operation name used in logs.
    pub fn operation(&self) -> &'static str {
        match self {
            CatalogRequest::CreateDatabase { .. } => "create_database",
            CatalogRequest::DropDatabase { .. } => "drop_database",
            CatalogRequest::ListDatabases => "list_databases",
            CatalogRequest::CreateTable { .. } => "create_table",
            CatalogRequest::DropTable { .. } => "drop_table",
            CatalogRequest::ListTables { .. } => "list_tables",
            CatalogRequest::GetTable { .. } => "get_table",
            CatalogRequest::ShowTable { .. } => "show_table",
            CatalogRequest::ShowColumns { .. } => "show_columns",
        }
    }

    /// Whether a successful run changes catalog state.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            CatalogRequest::CreateDatabase { .. }
                | CatalogRequest::DropDatabase { .. }
                | CatalogRequest::CreateTable { .. }
                | CatalogRequest::DropTable { .. }
        )
    }
}

/// Successful result body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Payload {
    /// Mutation with nothing to report
    Empty,
    Table(TableMeta),
    Tables(Vec<TableSummary>),
    Databases(Vec<String>),
    Columns(Vec<ColumnSummary>),
    Detail(TableDetail),
}

/// Response message sent back by the catalog service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogResponse {
    pub code: ErrorCode,
    /// Error text, or a warning attached to an otherwise successful response.
    pub message: String,
    pub payload: Payload,
}

impl CatalogResponse {
    pub fn ok(payload: Payload) -> Self {
        Self {
            code: ErrorCode::Success,
            message: String::new(),
            payload,
        }
    }

    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            payload: Payload::Empty,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == ErrorCode::Success
    }

    /// Numeric error code as seen by clients.
    pub fn error_code(&self) -> i32 {
        self.code.code()
    }
}

/// Stable numeric error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    Success,
    /// Malformed database, table or column name
    InvalidIdentifier,
    /// Empty column list, several primary keys, too many columns
    InvalidSchema,
    /// Name over the configured length limit
    NameTooLong,
    DuplicateDatabase,
    DuplicateTable,
    DatabaseNotFound,
    TableNotFound,
    /// Type spec that does not resolve
    UnknownType,
    /// Conflict argument that is not a valid mode for the operation
    InvalidConflictType,
    /// Attempt to drop or replace the default database
    ProtectedDatabase,
    StorageError,
    IoError,
    Unknown,
}

impl ErrorCode {
    pub fn code(self) -> i32 {
        match self {
            ErrorCode::Success => 0,
            ErrorCode::InvalidIdentifier => 3003,
            ErrorCode::InvalidSchema => 3007,
            ErrorCode::NameTooLong => 3011,
            ErrorCode::DuplicateDatabase => 3016,
            ErrorCode::DuplicateTable => 3017,
            ErrorCode::DatabaseNotFound => 3021,
            ErrorCode::TableNotFound => 3022,
            ErrorCode::UnknownType => 3032,
            ErrorCode::InvalidConflictType => 3066,
            ErrorCode::ProtectedDatabase => 3071,
            ErrorCode::StorageError => 7001,
            ErrorCode::IoError => 7002,
            ErrorCode::Unknown => 9999,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        const ALL: [ErrorCode; 14] = [
            ErrorCode::Success,
            ErrorCode::InvalidIdentifier,
            ErrorCode::InvalidSchema,
            ErrorCode::NameTooLong,
            ErrorCode::DuplicateDatabase,
            ErrorCode::DuplicateTable,
            ErrorCode::DatabaseNotFound,
            ErrorCode::TableNotFound,
            ErrorCode::UnknownType,
            ErrorCode::InvalidConflictType,
            ErrorCode::ProtectedDatabase,
            ErrorCode::StorageError,
            ErrorCode::IoError,
            ErrorCode::Unknown,
        ];
        ALL.into_iter().find(|c| c.code() == code)
    }
}

/// Frame format: [u32 length (little-endian)][bincode payload]
pub mod frame {
    use super::*;
    use bincode::config;
    use std::io::{self, Read, Write};
    use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

    pub const MAX_FRAME_SIZE: u32 = 64 * 1024 * 1024; // 64 MB

    fn encode<T: Serialize>(message: &T) -> io::Result<Vec<u8>> {
        let encoded = bincode::serde::encode_to_vec(message, config::standard())
            .map_err(|e| io::Error::other(format!("bincode encoding failed: {}", e)))?;
        check_len(encoded.len())?;
        Ok(encoded)
    }

    fn decode<T: for<'de> Deserialize<'de>>(payload: &[u8]) -> io::Result<T> {
        let (message, _) = bincode::serde::decode_from_slice(payload, config::standard())
            .map_err(|e| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("bincode decoding failed: {}", e),
                )
            })?;
        Ok(message)
    }

    fn check_len(len: usize) -> io::Result<u32> {
        match u32::try_from(len) {
            Ok(len) if len <= MAX_FRAME_SIZE => Ok(len),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("message too large: {} bytes (max {})", len, MAX_FRAME_SIZE),
            )),
        }
    }

    /// Write a framed message.
    pub fn write_message<W, T>(writer: &mut W, message: &T) -> io::Result<()>
    where
        W: Write,
        T: Serialize,
    {
        let encoded = encode(message)?;
        let len = check_len(encoded.len())?;
        writer.write_all(&len.to_le_bytes())?;
        writer.write_all(&encoded)?;
        Ok(())
    }

    /// Read a framed message.
    pub fn read_message<R, T>(reader: &mut R) -> io::Result<T>
    where
        R: Read,
        T: for<'de> Deserialize<'de>,
    {
        let mut len_buf = [0u8; 4];
        reader.read_exact(&mut len_buf)?;
        let len = check_len(u32::from_le_bytes(len_buf) as usize)?;

        let mut payload = vec![0u8; len as usize];
        reader.read_exact(&mut payload)?;
        decode(&payload)
    }

    /// Async variant of [`write_message`].
    pub async fn write_message_async<W, T>(writer: &mut W, message: &T) -> io::Result<()>
    where
        W: AsyncWrite + Unpin,
        T: Serialize,
    {
        let encoded = encode(message)?;
        let len = check_len(encoded.len())?;
        writer.write_all(&len.to_le_bytes()).await?;
        writer.write_all(&encoded).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Async variant of [`read_message`].
    pub async fn read_message_async<R, T>(reader: &mut R) -> io::Result<T>
    where
        R: AsyncRead + Unpin,
        T: for<'de> Deserialize<'de>,
    {
        let mut len_buf = [0u8; 4];
        reader.read_exact(&mut len_buf).await?;
        let len = check_len(u32::from_le_bytes(len_buf) as usize)?;

        let mut payload = vec![0u8; len as usize];
        reader.read_exact(&mut payload).await?;
        decode(&payload)
    }
}
