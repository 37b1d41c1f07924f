use std::path::PathBuf;

use thiserror::Error;

/// Boxed driver error carried unchanged through [`Error::Store`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by the data-access operations and the connection factory.
#[derive(Debug, Error)]
pub enum Error {
    /// An insert was called with zero elements.
    #[error("zero {entity} passed to insert")]
    EmptyInput { entity: &'static str },

    /// A dynamic identifier was neither an integer nor a string.
    #[error("identifier must be an integer or a string, found {found}")]
    InvalidIdentifierType { found: &'static str },

    /// The store rejected or failed to execute a statement.
    #[error("store failed to execute statement: {0}")]
    Store(#[source] BoxError),

    /// A result row did not match the requested destination type.
    #[error("failed to decode row {row}: {source}")]
    Decode {
        row: usize,
        #[source]
        source: DecodeError,
    },

    /// The connection factory could not build a usable handle.
    #[error("failed to open database at {path}: {source}")]
    ConnectionConstruction {
        path: String,
        #[source]
        source: BoxError,
    },
}

impl Error {
    /// Wraps a driver error without altering it.
    pub fn store(err: impl Into<BoxError>) -> Self {
        Error::Store(err.into())
    }
}

/// Result type for data-access operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while decoding a row into a typed destination.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DecodeError {
    #[error("cursor is not positioned on a row")]
    NoCurrentRow,
    #[error("expected {expected} column(s), row has {found}")]
    ColumnCount { expected: usize, found: usize },
    #[error("column {column}: expected {expected}, found {found}")]
    InvalidType {
        column: usize,
        expected: &'static str,
        found: &'static str,
    },
    #[error("column {column}: integer {value} does not fit in {target}")]
    OutOfRange {
        column: usize,
        value: i64,
        target: &'static str,
    },
}

/// Errors raised while installing the diagnostic subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to open log file {path:?}: {source}")]
    OpenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to install subscriber: {0}")]
    Install(String),
}
