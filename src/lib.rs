//! SQLite data access for shoe and true-to-size rating records.
//!
//! # Intention
//!
//! - Translate typed calls into parameterized SQL and typed results.
//! - Keep the operations behind two narrow capability traits, [`Executor`]
//!   and [`Querier`], so a test double can stand in for the database.
//!
//! # Architectural Boundaries
//!
//! - Only statement building, execution and row decoding belong here.
//! - No transactions, batching, retries or migrations.
//! - Failures are emitted as `tracing` events; the embedding process owns the
//!   subscriber.

pub mod cursor;
pub mod error;
pub mod executor;
pub mod logging;
pub mod shoes;
pub mod sqlite;
pub mod value;

pub use cursor::{BufferedCursor, Cursor, ReleaseGuard};
pub use error::{BoxError, DecodeError, Error, LoggingError, Result};
pub use executor::{Executor, Querier};
pub use logging::{LogLevel, LoggingConfig};
pub use shoes::{
    insert_shoe_true_to_sizes, insert_shoes, insert_true_to_sizes, select_true_to_size,
    Identifier,
};
pub use sqlite::{Database, DatabaseConfig, OpenMode};
pub use value::{FromRow, FromValue, Value};
