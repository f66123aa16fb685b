//! Async request handler for the catalog.
//!
//! Requests arrive already decoded (see the `protocol` crate). Each one runs
//! on tokio's blocking pool against the shared [`Catalog`], and every failure
//! is turned into a stable numeric code plus a message. Nothing in here
//! panics on untrusted input.

pub mod error;

use std::sync::Arc;

use anyhow::{Context, Result};
use catalog::{Catalog, ConflictArg, ConflictMode, MemoryStorage, StorageEngine};
use common::{Config, pretty::{self, TableStyleKind}};
use protocol::{CatalogRequest, CatalogResponse, ErrorCode, Payload, frame};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, instrument, warn};

/// Shared handle that serves catalog requests.
#[derive(Clone, Debug)]
pub struct CatalogService {
    catalog: Arc<Catalog>,
}

impl CatalogService {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    /// Build a service over in-memory storage, restoring `config.catalog_file`
    /// when it is set and exists.
    pub async fn open(config: Config) -> Result<Self> {
        let storage: Arc<dyn StorageEngine> = Arc::new(MemoryStorage::new(&config));
        Self::open_with_storage(config, storage).await
    }

    pub async fn open_with_storage(
        config: Config,
        storage: Arc<dyn StorageEngine>,
    ) -> Result<Self> {
        let catalog = tokio::task::spawn_blocking(move || match config.catalog_file.clone() {
            Some(path) => Catalog::load(&path, config, storage)
                .with_context(|| format!("failed to load catalog from {}", path.display())),
            None => Catalog::with_storage(config, storage).map_err(anyhow::Error::from),
        })
        .await??;
        Ok(Self::new(Arc::new(catalog)))
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Execute one request and build its response.
    #[instrument(skip(self, request), fields(operation = request.operation()))]
    pub async fn handle(&self, request: CatalogRequest) -> CatalogResponse {
        let catalog = Arc::clone(&self.catalog);
        let result = tokio::task::spawn_blocking(move || execute_and_persist(&catalog, request))
            .await
            .map_err(anyhow::Error::from)
            .and_then(|inner| inner);

        match result {
            Ok(response) => response,
            Err(err) => {
                let code = error::map_error_to_code(&err);
                let message = format!("{err:#}");
                warn!(code = code.code(), %message, "request rejected");
                CatalogResponse::error(code, message)
            }
        }
    }

    /// Serve framed requests from `stream` until the peer closes it.
    pub async fn serve<S>(&self, mut stream: S) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        loop {
            let request: CatalogRequest = match frame::read_message_async(&mut stream).await {
                Ok(request) => request,
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(e) => {
                    let response = CatalogResponse::error(
                        ErrorCode::IoError,
                        format!("failed to read request: {e}"),
                    );
                    if let Err(reply) = frame::write_message_async(&mut stream, &response).await {
                        warn!(error = %reply, "failed to send error reply to peer");
                    }
                    return Err(e.into());
                }
            };
            let response = self.handle(request).await;
            frame::write_message_async(&mut stream, &response).await?;
        }
        Ok(())
    }
}

/// Run a request and write the catalog file after a committed mutation.
///
/// The in-memory commit is authoritative. A snapshot write that fails after
/// it leaves the response successful and carries the write error in its
/// message, so a caller never retries a change that already happened.
pub fn execute_and_persist(catalog: &Catalog, request: CatalogRequest) -> Result<CatalogResponse> {
    let mutation = request.is_mutation();
    let mut response = CatalogResponse::ok(execute(catalog, request)?);
    if mutation {
        if let Err(err) = catalog.persist() {
            warn!(error = %err, "committed change was not written to the catalog file");
            response.message = format!("committed, but failed to persist catalog: {err}");
        }
    }
    Ok(response)
}

/// Run a request synchronously against `catalog`, without touching the
/// catalog file.
///
/// The conflict argument is parsed before any database or table lookup, so a
/// malformed mode is reported even when the target does not exist.
pub fn execute(catalog: &Catalog, request: CatalogRequest) -> Result<Payload> {
    let payload = match request {
        CatalogRequest::CreateDatabase { name, conflict } => {
            let mode = parse_mode(conflict.as_ref())?;
            catalog.create_database(&name, mode)?;
            Payload::Empty
        }
        CatalogRequest::DropDatabase { name, conflict } => {
            let mode = parse_drop_mode(conflict.as_ref())?;
            catalog.drop_database(&name, mode)?;
            Payload::Empty
        }
        CatalogRequest::ListDatabases => Payload::Databases(catalog.list_databases()),
        CatalogRequest::CreateTable {
            database,
            table,
            columns,
            conflict,
        } => {
            let mode = parse_mode(conflict.as_ref())?;
            let namespace = catalog.database(&database)?;
            let handle = namespace.create_table(&table, columns.as_deref(), mode)?;
            Payload::Table((*handle).clone())
        }
        CatalogRequest::DropTable {
            database,
            table,
            conflict,
        } => {
            let mode = parse_drop_mode(conflict.as_ref())?;
            catalog.database(&database)?.drop_table(&table, mode)?;
            Payload::Empty
        }
        CatalogRequest::ListTables { database } => {
            Payload::Tables(catalog.database(&database)?.list_tables())
        }
        CatalogRequest::GetTable { database, table } => {
            let handle = catalog.database(&database)?.get_table(&table)?;
            Payload::Table((*handle).clone())
        }
        CatalogRequest::ShowTable { database, table } => {
            Payload::Detail(catalog.database(&database)?.show_table(&table)?)
        }
        CatalogRequest::ShowColumns { database, table } => {
            Payload::Columns(catalog.database(&database)?.show_columns(&table)?)
        }
    };
    Ok(payload)
}

fn parse_mode(arg: Option<&ConflictArg>) -> Result<ConflictMode> {
    let mode = ConflictMode::from_arg(arg)?;
    debug!(%mode, "parsed conflict mode");
    Ok(mode)
}

fn parse_drop_mode(arg: Option<&ConflictArg>) -> Result<ConflictMode> {
    let mode = parse_mode(arg)?;
    catalog::conflict::check_drop_mode(mode)?;
    Ok(mode)
}

/// Human-readable rendering of a response, used by tooling and logs.
pub fn render_response(response: &CatalogResponse, style: TableStyleKind) -> String {
    if !response.is_ok() {
        return format!("error {}: {}", response.error_code(), response.message);
    }
    if !response.message.is_empty() {
        return format!(
            "{}\nwarning: {}",
            render_payload(&response.payload, style),
            response.message
        );
    }
    render_payload(&response.payload, style)
}

fn render_payload(payload: &Payload, style: TableStyleKind) -> String {
    match payload {
        Payload::Empty => "OK".to_string(),
        Payload::Databases(names) => pretty::render_names("database", names, style),
        Payload::Tables(rows) => pretty::render_table_summaries(rows, style),
        Payload::Columns(rows) => pretty::render_columns(rows, style),
        Payload::Table(meta) => {
            let rows: Vec<_> = meta.column_summaries();
            format!(
                "{} (id {})\n{}",
                meta.name,
                meta.id.0,
                pretty::render_columns(&rows, style)
            )
        }
        Payload::Detail(detail) => pretty::render_string_table(
            &["database", "table", "columns", "primary key", "blocks", "segments"],
            vec![vec![
                detail.database.clone(),
                detail.table.clone(),
                detail.column_count.to_string(),
                detail.primary_key.clone().unwrap_or_default(),
                format!("{}/{}", detail.stats.block_count, detail.stats.block_capacity),
                format!("{}/{}", detail.stats.segment_count, detail.stats.segment_capacity),
            ]],
            style,
        ),
    }
}
