//! Capability traits separating the data-access operations from a concrete
//! driver.

use crate::cursor::Cursor;
use crate::error::Result;
use crate::value::Value;

/// Executes write statements.
pub trait Executor {
    /// Executes `statement` with positional `args` bound to `?1`, `?2`, ...
    /// and returns the number of rows the store reports as affected.
    fn execute(&self, statement: &str, args: &[Value]) -> Result<usize>;
}

/// Executes read statements.
pub trait Querier {
    type Cursor: Cursor;

    /// Executes `statement` with positional `args` and returns a cursor over
    /// the result rows.
    fn query(&self, statement: &str, args: &[Value]) -> Result<Self::Cursor>;
}

impl<T: Executor + ?Sized> Executor for &T {
    fn execute(&self, statement: &str, args: &[Value]) -> Result<usize> {
        (**self).execute(statement, args)
    }
}

impl<T: Querier + ?Sized> Querier for &T {
    type Cursor = T::Cursor;

    fn query(&self, statement: &str, args: &[Value]) -> Result<Self::Cursor> {
        (**self).query(statement, args)
    }
}
