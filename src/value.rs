use crate::error::DecodeError;

/// Core value types for positional arguments and result columns
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
    Boolean(bool),
}

impl Value {
    /// Short name of the value's type, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Integer(_) => "integer",
            Value::Real(_) => "real",
            Value::Text(_) => "text",
            Value::Blob(_) => "blob",
            Value::Boolean(_) => "boolean",
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Blob(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// Decodes a single column value.
pub trait FromValue: Sized {
    /// Name of the destination type, reported in [`DecodeError::InvalidType`].
    const EXPECTED: &'static str;

    fn from_value(value: &Value, column: usize) -> Result<Self, DecodeError>;
}

fn invalid_type<T: FromValue>(value: &Value, column: usize) -> DecodeError {
    DecodeError::InvalidType {
        column,
        expected: T::EXPECTED,
        found: value.type_name(),
    }
}

impl FromValue for i64 {
    const EXPECTED: &'static str = "integer";

    fn from_value(value: &Value, column: usize) -> Result<Self, DecodeError> {
        match value {
            Value::Integer(v) => Ok(*v),
            Value::Boolean(b) => Ok(i64::from(*b)),
            other => Err(invalid_type::<Self>(other, column)),
        }
    }
}

impl FromValue for i32 {
    const EXPECTED: &'static str = "integer";

    fn from_value(value: &Value, column: usize) -> Result<Self, DecodeError> {
        let wide = i64::from_value(value, column)?;
        i32::try_from(wide).map_err(|_| DecodeError::OutOfRange {
            column,
            value: wide,
            target: "i32",
        })
    }
}

impl FromValue for f64 {
    const EXPECTED: &'static str = "real";

    fn from_value(value: &Value, column: usize) -> Result<Self, DecodeError> {
        match value {
            Value::Real(v) => Ok(*v),
            Value::Integer(v) => Ok(*v as f64),
            other => Err(invalid_type::<Self>(other, column)),
        }
    }
}

impl FromValue for bool {
    const EXPECTED: &'static str = "boolean";

    fn from_value(value: &Value, column: usize) -> Result<Self, DecodeError> {
        match value {
            Value::Boolean(b) => Ok(*b),
            Value::Integer(0) => Ok(false),
            Value::Integer(1) => Ok(true),
            Value::Integer(v) => Err(DecodeError::OutOfRange {
                column,
                value: *v,
                target: "bool",
            }),
            other => Err(invalid_type::<Self>(other, column)),
        }
    }
}

impl FromValue for String {
    const EXPECTED: &'static str = "text";

    fn from_value(value: &Value, column: usize) -> Result<Self, DecodeError> {
        match value {
            Value::Text(s) => Ok(s.clone()),
            other => Err(invalid_type::<Self>(other, column)),
        }
    }
}

impl FromValue for Vec<u8> {
    const EXPECTED: &'static str = "blob";

    fn from_value(value: &Value, column: usize) -> Result<Self, DecodeError> {
        match value {
            Value::Blob(b) => Ok(b.clone()),
            other => Err(invalid_type::<Self>(other, column)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    const EXPECTED: &'static str = T::EXPECTED;

    fn from_value(value: &Value, column: usize) -> Result<Self, DecodeError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other, column).map(Some),
        }
    }
}

/// Decodes a whole result row.
pub trait FromRow: Sized {
    fn from_row(row: &[Value]) -> Result<Self, DecodeError>;
}

fn expect_columns(row: &[Value], expected: usize) -> Result<(), DecodeError> {
    if row.len() != expected {
        return Err(DecodeError::ColumnCount {
            expected,
            found: row.len(),
        });
    }
    Ok(())
}

macro_rules! single_column_rows {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromRow for $ty {
                fn from_row(row: &[Value]) -> Result<Self, DecodeError> {
                    expect_columns(row, 1)?;
                    <$ty as FromValue>::from_value(&row[0], 0)
                }
            }
        )*
    };
}

single_column_rows!(i64, i32, f64, bool, String, Vec<u8>);

impl<T: FromValue> FromRow for Option<T> {
    fn from_row(row: &[Value]) -> Result<Self, DecodeError> {
        expect_columns(row, 1)?;
        <Option<T> as FromValue>::from_value(&row[0], 0)
    }
}

macro_rules! tuple_rows {
    ($len:expr; $($name:ident : $idx:tt),+) => {
        impl<$($name: FromValue),+> FromRow for ($($name,)+) {
            fn from_row(row: &[Value]) -> Result<Self, DecodeError> {
                expect_columns(row, $len)?;
                Ok(($($name::from_value(&row[$idx], $idx)?,)+))
            }
        }
    };
}

tuple_rows!(1; A: 0);
tuple_rows!(2; A: 0, B: 1);
tuple_rows!(3; A: 0, B: 1, C: 2);
tuple_rows!(4; A: 0, B: 1, C: 2, D: 3);
