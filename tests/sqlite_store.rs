mod common;

use anyhow::Result;
use rusqlite::params;
use shoes_db::{
    insert_shoe_true_to_sizes, insert_shoes, insert_true_to_sizes, select_true_to_size, Database,
    DatabaseConfig, DecodeError, Error, Identifier, OpenMode,
};
use tempfile::NamedTempFile;
use tracing::Level;

use common::{capture, capture_errors};

// Helper function to create an in-memory database with the shoe tables
fn create_test_db() -> Result<Database> {
    Ok(Database::open(&DatabaseConfig::in_memory().with_schema())?)
}

fn shoe_id(db: &Database, name: &str) -> Result<i64> {
    Ok(db
        .connection()
        .query_row("SELECT id FROM shoes WHERE name = ?1", [name], |row| {
            row.get(0)
        })?)
}

fn new_shoes(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("shoe_{i}")).collect()
}

#[test]
fn test_insert_shoes_reports_every_row() -> Result<()> {
    let db = create_test_db()?;

    assert_eq!(insert_shoes(&db, &new_shoes(5))?, 5);
    assert_eq!(insert_shoes(&db, &new_shoes(50))?, 50);

    let count: i64 = db
        .connection()
        .query_row("SELECT COUNT(*) FROM shoes", [], |row| row.get(0))?;
    assert_eq!(count, 55);
    Ok(())
}

#[test]
fn test_empty_inserts_write_nothing() -> Result<()> {
    let db = create_test_db()?;

    let names: [&str; 0] = [];
    assert!(matches!(
        insert_shoes(&db, &names),
        Err(Error::EmptyInput { entity: "shoes" })
    ));
    assert!(matches!(
        insert_true_to_sizes(&db, &[]),
        Err(Error::EmptyInput {
            entity: "truetosizes"
        })
    ));

    let count: i64 = db
        .connection()
        .query_row("SELECT COUNT(*) FROM shoes", [], |row| row.get(0))?;
    assert_eq!(count, 0);
    Ok(())
}

#[test]
fn test_lookup_by_id_and_name() -> Result<()> {
    let db = create_test_db()?;
    insert_shoes(&db, &["shoe_0", "shoe_1"])?;
    let id = shoe_id(&db, "shoe_1")?;
    let other = shoe_id(&db, "shoe_0")?;

    assert_eq!(insert_shoe_true_to_sizes(&db, id, &[1, 3, 4, 1])?, 4);
    assert_eq!(insert_shoe_true_to_sizes(&db, other, &[5])?, 1);

    assert_eq!(select_true_to_size(&db, id)?, vec![1, 3, 4, 1]);
    assert_eq!(select_true_to_size(&db, "shoe_1")?, vec![1, 3, 4, 1]);
    assert_eq!(select_true_to_size(&db, Identifier::ById(other))?, vec![5]);
    Ok(())
}

#[test]
fn test_lookup_is_repeatable() -> Result<()> {
    let db = create_test_db()?;
    insert_shoes(&db, &["shoe_0"])?;
    let id = shoe_id(&db, "shoe_0")?;
    insert_shoe_true_to_sizes(&db, id, &[2, 2, 5, 1, 3])?;

    let first = select_true_to_size(&db, "shoe_0")?;
    let second = select_true_to_size(&db, "shoe_0")?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_lookup_unknown_shoe_is_empty() -> Result<()> {
    let db = create_test_db()?;
    assert!(select_true_to_size(&db, 42)?.is_empty());
    assert!(select_true_to_size(&db, "no_such_shoe")?.is_empty());
    Ok(())
}

#[test]
fn test_unbound_ratings_are_not_found_by_lookup() -> Result<()> {
    let db = create_test_db()?;
    insert_shoes(&db, &["shoe_0"])?;
    let id = shoe_id(&db, "shoe_0")?;

    assert_eq!(insert_true_to_sizes(&db, &[1, 2, 3, 4, 5])?, 5);
    assert!(select_true_to_size(&db, id)?.is_empty());

    let unbound: i64 = db.connection().query_row(
        "SELECT COUNT(*) FROM truetosize WHERE shoes_id IS NULL",
        [],
        |row| row.get(0),
    )?;
    assert_eq!(unbound, 5);
    Ok(())
}

#[test]
fn test_store_error_is_passed_through() -> Result<()> {
    // no schema
    let db = Database::open(&DatabaseConfig::in_memory())?;

    match insert_shoes(&db, &["shoe_0"]) {
        Err(Error::Store(source)) => {
            assert!(source.downcast_ref::<rusqlite::Error>().is_some());
        }
        other => panic!("expected store error, got {other:?}"),
    }

    assert!(matches!(
        select_true_to_size(&db, 1),
        Err(Error::Store(_))
    ));
    Ok(())
}

#[test]
fn test_foreign_key_violation() -> Result<()> {
    let db = create_test_db()?;
    let err = insert_shoe_true_to_sizes(&db, 999, &[3]).unwrap_err();
    assert!(matches!(err, Error::Store(_)));
    Ok(())
}

#[test]
fn test_decode_error_on_non_integer_rating() -> Result<()> {
    let db = create_test_db()?;
    insert_shoes(&db, &["shoe_0"])?;
    let id = shoe_id(&db, "shoe_0")?;
    insert_shoe_true_to_sizes(&db, id, &[1, 2, 3])?;
    db.connection().execute(
        "INSERT INTO truetosize (shoes_id, truetosize) VALUES (?1, ?2)",
        params![id, "roomy"],
    )?;

    let err = select_true_to_size(&db, id).unwrap_err();
    assert!(matches!(err, Error::Decode { row: 3, .. }));
    Ok(())
}

#[test]
fn test_invalid_utf8_rating_is_a_decode_error() -> Result<()> {
    let db = create_test_db()?;
    insert_shoes(&db, &["shoe_0"])?;
    let id = shoe_id(&db, "shoe_0")?;
    insert_shoe_true_to_sizes(&db, id, &[1, 2])?;
    db.connection().execute(
        "INSERT INTO truetosize (shoes_id, truetosize) VALUES (?1, CAST(x'ff' AS TEXT))",
        [id],
    )?;

    let (result, errors) = capture_errors(|| select_true_to_size(&db, id));
    match result {
        Err(Error::Decode { row, source }) => {
            assert_eq!(row, 2);
            assert_eq!(
                source,
                DecodeError::InvalidType {
                    column: 0,
                    expected: "integer",
                    found: "blob",
                }
            );
        }
        other => panic!("expected decode error, got {other:?}"),
    }
    assert_eq!(errors.len(), 1);
    Ok(())
}

#[test]
fn test_oversized_insert_fails_with_bounded_logs() -> Result<()> {
    let db = create_test_db()?;
    let names = new_shoes(40_000);

    let (result, lines) = capture(Level::DEBUG, || insert_shoes(&db, &names));
    assert!(matches!(result, Err(Error::Store(_))));

    let errors: Vec<&String> = lines.iter().filter(|l| l.contains("ERROR")).collect();
    assert_eq!(errors.len(), 1);
    for line in &lines {
        assert!(line.len() < 1_024, "record was {} bytes", line.len());
    }

    let count: i64 = db
        .connection()
        .query_row("SELECT COUNT(*) FROM shoes", [], |row| row.get(0))?;
    assert_eq!(count, 0);
    Ok(())
}

#[test]
fn test_file_database_reopened_read_only() -> Result<()> {
    let temp_file = NamedTempFile::new()?;
    let path = temp_file.path().to_string_lossy().into_owned();

    {
        let db = Database::open(&DatabaseConfig::new(path.clone()).with_schema())?;
        insert_shoes(&db, &["shoe_0"])?;
        let id = shoe_id(&db, "shoe_0")?;
        insert_shoe_true_to_sizes(&db, id, &[4, 4])?;
    }

    let db = Database::open(&DatabaseConfig::new(path).with_mode(OpenMode::ReadOnly))?;
    assert_eq!(select_true_to_size(&db, "shoe_0")?, vec![4, 4]);
    assert!(matches!(
        insert_shoes(&db, &["shoe_1"]),
        Err(Error::Store(_))
    ));
    Ok(())
}

#[test]
fn test_open_failure_is_returned() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent").join("shoes.db");
    let config = DatabaseConfig::new(path.to_string_lossy());

    let (result, errors) = capture_errors(|| Database::open(&config));
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("failed to open database"));
    match result.unwrap_err() {
        Error::ConnectionConstruction { path: reported, .. } => {
            assert_eq!(reported, config.path);
        }
        other => panic!("expected connection failure, got {other:?}"),
    }
}

#[test]
fn test_schema_on_read_only_handle_fails_and_logs_once() -> Result<()> {
    let temp_file = NamedTempFile::new()?;
    let path = temp_file.path().to_string_lossy().into_owned();
    let db = Database::open(&DatabaseConfig::new(path).with_mode(OpenMode::ReadOnly))?;

    let (result, errors) = capture_errors(|| db.initialize_schema());
    assert!(matches!(result, Err(Error::Store(_))));
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("failed to initialize schema"));
    Ok(())
}
