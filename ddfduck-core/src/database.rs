//! DuckDB session: the single connection shared by every pipeline stage.
//!
//! The connection is opened once and released when the `Database` is dropped,
//! so every exit path (including errors and interrupts) closes it. `close()`
//! exists for the success path where a close error should be reported.

use crate::config::DatabaseConfig;
use crate::error::{ConvertError, Result};
use crate::naming::{quote_ident, quote_literal};
use duckdb::{AccessMode, Config, Connection};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub struct Database {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Database {
    /// Create or connect to the database file and apply session settings.
    pub fn open(path: &Path, config: &DatabaseConfig) -> Result<Self> {
        if path.exists() {
            info!("Connecting to existing database: {}", path.display());
        } else {
            info!("Creating new database: {}", path.display());
        }

        let conn = Connection::open(path).map_err(|source| ConvertError::DatabaseOpen {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self {
            conn,
            path: Some(path.to_path_buf()),
        };
        db.configure(config)?;
        Ok(db)
    }

    /// Open an existing database file without write access.
    pub fn open_read_only(path: &Path) -> Result<Self> {
        let open = || -> duckdb::Result<Connection> {
            let config = Config::default().access_mode(AccessMode::ReadOnly)?;
            Connection::open_with_flags(path, config)
        };
        let conn = open().map_err(|source| ConvertError::DatabaseOpen {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| ConvertError::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        Ok(Self { conn, path: None })
    }

    fn configure(&self, config: &DatabaseConfig) -> Result<()> {
        let sql = format!(
            "SET enable_object_cache={}; SET threads={};",
            config.enable_object_cache,
            config.threads.max(1)
        );
        self.conn
            .execute_batch(&sql)
            .map_err(|source| ConvertError::DatabaseOpen {
                path: self.path.clone().unwrap_or_default(),
                source,
            })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Underlying connection, for prepared statements.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Execute one or more statements that return no rows.
    pub fn execute(&self, sql: &str) -> Result<()> {
        debug!(sql = %sql.trim(), "execute");
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    pub fn row_count(&self, table: &str) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(table));
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    /// Base tables in schema `main`, ordered by name.
    pub fn tables(&self) -> Result<Vec<String>> {
        self.query_strings(
            "SELECT table_name FROM information_schema.tables \
             WHERE table_schema = 'main' AND table_type = 'BASE TABLE' \
             ORDER BY table_name",
        )
    }

    /// Tables and views in schema `main`, ordered by name.
    pub fn relations(&self) -> Result<Vec<String>> {
        self.query_strings(
            "SELECT table_name FROM information_schema.tables \
             WHERE table_schema = 'main' ORDER BY table_name",
        )
    }

    /// Column names of `table` in ordinal order.
    pub fn column_names(&self, table: &str) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT column_name FROM information_schema.columns \
             WHERE table_schema = 'main' AND table_name = {} \
             ORDER BY ordinal_position",
            quote_literal(table)
        );
        self.query_strings(&sql)
    }

    pub fn table_comment(&self, table: &str) -> Result<Option<String>> {
        let sql = format!(
            "SELECT comment FROM duckdb_tables() \
             WHERE schema_name = 'main' AND table_name = {}",
            quote_literal(table)
        );
        self.query_optional_string(&sql)
    }

    pub fn column_comment(&self, table: &str, column: &str) -> Result<Option<String>> {
        let sql = format!(
            "SELECT comment FROM duckdb_columns() \
             WHERE schema_name = 'main' AND table_name = {} AND column_name = {}",
            quote_literal(table),
            quote_literal(column)
        );
        self.query_optional_string(&sql)
    }

    /// Size of the database file on disk, if file-backed.
    pub fn file_size(&self) -> Option<u64> {
        self.path
            .as_deref()
            .and_then(|p| std::fs::metadata(p).ok())
            .map(|m| m.len())
    }

    /// Close the connection, reporting any error.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| ConvertError::Database(e))
    }

    fn query_strings(&self, sql: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn query_optional_string(&self, sql: &str) -> Result<Option<String>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([])?;
        match rows.next()? {
            Some(row) => Ok(row.get::<_, Option<String>>(0)?),
            None => Ok(None),
        }
    }
}
