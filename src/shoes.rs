//! Insert and lookup operations for shoes and their true-to-size ratings.

use crate::cursor::{Cursor, ReleaseGuard};
use crate::error::{Error, Result};
use crate::executor::{Executor, Querier};
use crate::value::Value;

/// Selects ratings for a shoe id.
pub const SELECT_TRUE_TO_SIZE_BY_SHOE_ID: &str = "SELECT t.truetosize \
     FROM truetosize t \
     WHERE t.shoes_id = ?1 \
     ORDER BY t.id;";

/// Selects ratings for a shoe name.
pub const SELECT_TRUE_TO_SIZE_BY_SHOE_NAME: &str = "SELECT t.truetosize \
     FROM truetosize t \
     INNER JOIN shoes s ON t.shoes_id = s.id \
     WHERE s.name = ?1 \
     ORDER BY t.id;";

/// Key for looking up true-to-size ratings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier {
    ById(i64),
    ByName(String),
}

impl Identifier {
    /// The statement used to look up ratings for this identifier.
    pub fn statement(&self) -> &'static str {
        match self {
            Identifier::ById(_) => SELECT_TRUE_TO_SIZE_BY_SHOE_ID,
            Identifier::ByName(_) => SELECT_TRUE_TO_SIZE_BY_SHOE_NAME,
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Identifier::ById(id) => Value::Integer(*id),
            Identifier::ByName(name) => Value::Text(name.clone()),
        }
    }
}

impl From<i64> for Identifier {
    fn from(id: i64) -> Self {
        Identifier::ById(id)
    }
}

impl From<i32> for Identifier {
    fn from(id: i32) -> Self {
        Identifier::ById(i64::from(id))
    }
}

impl From<String> for Identifier {
    fn from(name: String) -> Self {
        Identifier::ByName(name)
    }
}

impl From<&str> for Identifier {
    fn from(name: &str) -> Self {
        Identifier::ByName(name.to_string())
    }
}

impl TryFrom<Value> for Identifier {
    type Error = Error;

    /// Accepts integers as shoe ids and text as shoe names.
    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Integer(id) => Ok(Identifier::ById(id)),
            Value::Text(name) => Ok(Identifier::ByName(name)),
            other => {
                let err = Error::InvalidIdentifierType {
                    found: other.type_name(),
                };
                tracing::error!(error = %err, "rejected identifier");
                Err(err)
            }
        }
    }
}

/// Builds `INSERT INTO table (columns) VALUES (?1, ?2), (?3, ?4), ...;` with
/// one placeholder group per row.
fn insert_statement(table: &str, columns: &[&str], rows: usize) -> String {
    let width = columns.len();
    let groups = (0..rows)
        .map(|row| {
            let slots = (1..=width)
                .map(|col| format!("?{}", row * width + col))
                .collect::<Vec<_>>();
            format!("({})", slots.join(", "))
        })
        .collect::<Vec<_>>();
    format!(
        "INSERT INTO {} ({}) VALUES {};",
        table,
        columns.join(", "),
        groups.join(", ")
    )
}

/// Longest error text written to an insert failure record. Store errors can
/// quote the whole statement.
const MAX_LOGGED_ERROR_CHARS: usize = 256;

fn bounded_message(err: &Error) -> String {
    let text = err.to_string();
    match text.char_indices().nth(MAX_LOGGED_ERROR_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text,
    }
}

fn insert_rows<E>(
    db: &E,
    entity: &'static str,
    table: &str,
    columns: &[&str],
    rows: usize,
    args: Vec<Value>,
) -> Result<usize>
where
    E: Executor + ?Sized,
{
    if rows == 0 {
        let err = Error::EmptyInput { entity };
        tracing::error!(entity, error = %err, "refusing empty insert");
        return Err(err);
    }

    let statement = insert_statement(table, columns, rows);
    db.execute(&statement, &args).map_err(|err| {
        tracing::error!(entity, rows, error = %bounded_message(&err), "insert failed");
        err
    })
}

/// Inserts one shoe row per name in a single statement and returns the
/// number of rows the store reports as affected.
///
/// Each name is one bound parameter. SQLite rejects statements with more
/// than 32766 parameters, so larger inputs fail with [`Error::Store`].
pub fn insert_shoes<E, S>(db: &E, names: &[S]) -> Result<usize>
where
    E: Executor + ?Sized,
    S: AsRef<str>,
{
    let args = names
        .iter()
        .map(|name| Value::Text(name.as_ref().to_string()))
        .collect();
    insert_rows(db, "shoes", "shoes", &["name"], names.len(), args)
}

/// Inserts one rating row per value in a single statement and returns the
/// number of rows the store reports as affected.
///
/// Subject to the same SQLite limit of 32766 bound parameters as
/// [`insert_shoes`].
pub fn insert_true_to_sizes<E>(db: &E, ratings: &[i64]) -> Result<usize>
where
    E: Executor + ?Sized,
{
    let args = ratings.iter().copied().map(Value::Integer).collect();
    insert_rows(
        db,
        "truetosizes",
        "truetosize",
        &["truetosize"],
        ratings.len(),
        args,
    )
}

/// Like [`insert_true_to_sizes`], with every rating attached to `shoe_id`.
/// Each rating takes two bound parameters.
pub fn insert_shoe_true_to_sizes<E>(db: &E, shoe_id: i64, ratings: &[i64]) -> Result<usize>
where
    E: Executor + ?Sized,
{
    let args = ratings
        .iter()
        .flat_map(|rating| [Value::Integer(shoe_id), Value::Integer(*rating)])
        .collect();
    insert_rows(
        db,
        "truetosizes",
        "truetosize",
        &["shoes_id", "truetosize"],
        ratings.len(),
        args,
    )
}

/// Returns the ratings recorded for a shoe, in the order the store yields them.
///
/// An integer identifier filters by shoe id; a name joins against `shoes`.
/// Any decode or cursor failure discards the rows read so far. The cursor is
/// released on every path.
pub fn select_true_to_size<Q>(db: &Q, identifier: impl Into<Identifier>) -> Result<Vec<i64>>
where
    Q: Querier + ?Sized,
{
    let identifier = identifier.into();
    let mut cursor = db
        .query(identifier.statement(), &[identifier.to_value()])
        .map_err(|err| {
            tracing::error!(identifier = ?identifier, error = %err, "true-to-size query failed");
            err
        })?;
    let mut guard = ReleaseGuard::new(&mut cursor);
    let cursor = guard.cursor();

    let mut ratings = Vec::new();
    while cursor.advance() {
        let rating = cursor.decode_current::<i64>().map_err(|source| {
            let err = Error::Decode {
                row: ratings.len(),
                source,
            };
            tracing::error!(identifier = ?identifier, error = %err, "failed to decode rating");
            err
        })?;
        ratings.push(rating);
    }
    if let Some(err) = cursor.iteration_failure() {
        tracing::error!(identifier = ?identifier, error = %err, "true-to-size iteration failed");
        return Err(err);
    }
    Ok(ratings)
}
