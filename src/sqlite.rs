//! SQLite-backed implementation of the capability traits.

use std::time::Duration;

use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params_from_iter, Connection, OpenFlags};
use serde::Deserialize;

use crate::cursor::BufferedCursor;
use crate::error::{Error, Result};
use crate::executor::{Executor, Querier};
use crate::value::Value;

/// Path that opens a private in-memory database.
pub const IN_MEMORY: &str = ":memory:";

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Tables read and written by the shoe operations.
pub const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS shoes (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS truetosize (
    id INTEGER PRIMARY KEY,
    truetosize INTEGER NOT NULL,
    shoes_id INTEGER REFERENCES shoes(id)
);

CREATE INDEX IF NOT EXISTS idx_truetosize_shoes_id ON truetosize(shoes_id);
"#;

/// How the database file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenMode {
    /// Read and write, creating the file if it does not exist.
    #[default]
    ReadWriteCreate,
    /// Read and write an existing file.
    ReadWrite,
    /// Read an existing file.
    ReadOnly,
}

impl OpenMode {
    fn flags(self) -> OpenFlags {
        let base = OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        match self {
            OpenMode::ReadWriteCreate => {
                base | OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE
            }
            OpenMode::ReadWrite => base | OpenFlags::SQLITE_OPEN_READ_WRITE,
            OpenMode::ReadOnly => base | OpenFlags::SQLITE_OPEN_READ_ONLY,
        }
    }
}

fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

fn default_foreign_keys() -> bool {
    true
}

/// Connection parameters for [`Database::open`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file, or [`IN_MEMORY`].
    pub path: String,
    #[serde(default)]
    pub mode: OpenMode,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    #[serde(default = "default_foreign_keys")]
    pub foreign_keys: bool,
    /// Create the `shoes` and `truetosize` tables when they are missing.
    #[serde(default)]
    pub initialize_schema: bool,
}

impl DatabaseConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mode: OpenMode::default(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            foreign_keys: true,
            initialize_schema: false,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(IN_MEMORY)
    }

    pub fn with_mode(mut self, mode: OpenMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_foreign_keys(mut self, enabled: bool) -> Self {
        self.foreign_keys = enabled;
        self
    }

    pub fn with_schema(mut self) -> Self {
        self.initialize_schema = true;
        self
    }
}

/// A SQLite handle implementing [`Executor`] and [`Querier`].
#[derive(Debug)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens and validates a connection.
    ///
    /// Failures are logged and returned as [`Error::ConnectionConstruction`];
    /// the caller decides whether to retry or give up.
    pub fn open(config: &DatabaseConfig) -> Result<Self> {
        match Self::connect(config) {
            Ok(db) => {
                tracing::debug!(path = %config.path, mode = ?config.mode, "opened database");
                Ok(db)
            }
            Err(err) => {
                tracing::error!(path = %config.path, error = %err, "failed to open database");
                Err(Error::ConnectionConstruction {
                    path: config.path.clone(),
                    source: Box::new(err),
                })
            }
        }
    }

    fn connect(config: &DatabaseConfig) -> rusqlite::Result<Self> {
        let conn = Connection::open_with_flags(&config.path, config.mode.flags())?;
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        conn.pragma_update(None, "foreign_keys", config.foreign_keys)?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        if config.initialize_schema {
            conn.execute_batch(CREATE_TABLES)?;
        }
        Ok(Self { conn })
    }

    /// Creates the `shoes` and `truetosize` tables when they are missing.
    pub fn initialize_schema(&self) -> Result<()> {
        self.conn.execute_batch(CREATE_TABLES).map_err(|err| {
            tracing::error!(error = %err, "failed to initialize schema");
            Error::store(err)
        })
    }

    /// The underlying driver connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl Executor for Database {
    fn execute(&self, statement: &str, args: &[Value]) -> Result<usize> {
        tracing::debug!(
            statement_len = statement.len(),
            args = args.len(),
            "executing statement"
        );
        let mut stmt = self.conn.prepare_cached(statement).map_err(Error::store)?;
        stmt.execute(params_from_iter(args.iter()))
            .map_err(Error::store)
    }
}

impl Querier for Database {
    type Cursor = BufferedCursor;

    fn query(&self, statement: &str, args: &[Value]) -> Result<BufferedCursor> {
        tracing::debug!(statement, args = args.len(), "executing query");
        let mut stmt = self.conn.prepare_cached(statement).map_err(Error::store)?;
        let columns = stmt.column_count();
        let mut rows = stmt
            .query(params_from_iter(args.iter()))
            .map_err(Error::store)?;

        let mut fetched = Vec::new();
        let failure = loop {
            match rows.next() {
                Ok(Some(row)) => match read_row(row, columns) {
                    Ok(values) => fetched.push(values),
                    Err(err) => break Some(err),
                },
                Ok(None) => break None,
                Err(err) => break Some(err),
            }
        };

        let cursor = BufferedCursor::new(fetched);
        Ok(match failure {
            Some(err) => cursor.with_failure(Error::store(err)),
            None => cursor,
        })
    }
}

fn read_row(row: &rusqlite::Row<'_>, columns: usize) -> rusqlite::Result<Vec<Value>> {
    (0..columns)
        .map(|idx| row.get_ref(idx).map(column_value))
        .collect()
}

/// Copies a column out of the row. Text that is not valid UTF-8 is kept as
/// raw bytes so decoding reports a type mismatch.
fn column_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(bytes) => match std::str::from_utf8(bytes) {
            Ok(text) => Value::Text(text.to_string()),
            Err(_) => Value::Blob(bytes.to_vec()),
        },
        ValueRef::Blob(bytes) => Value::Blob(bytes.to_vec()),
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let value = match self {
            Value::Null => ValueRef::Null,
            Value::Integer(i) => ValueRef::Integer(*i),
            Value::Real(f) => ValueRef::Real(*f),
            Value::Text(s) => ValueRef::Text(s.as_bytes()),
            Value::Blob(b) => ValueRef::Blob(b.as_slice()),
            Value::Boolean(b) => ValueRef::Integer(i64::from(*b)),
        };
        Ok(ToSqlOutput::Borrowed(value))
    }
}
