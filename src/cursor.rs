//! Forward-only cursors over query results.

use std::collections::VecDeque;

use crate::error::{DecodeError, Error};
use crate::value::{FromRow, Value};

/// A forward-only, releasable iterator over result rows.
///
/// Callers advance the cursor, decode the current row, and after `advance`
/// returns `false` check [`Cursor::iteration_failure`] to tell exhaustion
/// apart from a failure while fetching.
pub trait Cursor {
    /// Moves to the next row. Returns `false` once the rows are exhausted,
    /// fetching failed, or the cursor was released.
    fn advance(&mut self) -> bool;

    /// Decodes the row the cursor is positioned on.
    fn decode_current<T: FromRow>(&self) -> Result<T, DecodeError>;

    /// Takes the failure that stopped iteration, if any.
    fn iteration_failure(&mut self) -> Option<Error>;

    /// Releases the resources held by the cursor. Safe to call more than once
    /// and after partial iteration.
    fn release(&mut self);
}

/// Releases the wrapped cursor when dropped.
pub struct ReleaseGuard<'a, C: Cursor> {
    cursor: &'a mut C,
}

impl<'a, C: Cursor> ReleaseGuard<'a, C> {
    pub fn new(cursor: &'a mut C) -> Self {
        Self { cursor }
    }

    pub fn cursor(&mut self) -> &mut C {
        self.cursor
    }
}

impl<C: Cursor> Drop for ReleaseGuard<'_, C> {
    fn drop(&mut self) {
        self.cursor.release();
    }
}

/// A cursor over rows already fetched from the store.
///
/// A failure hit while fetching is kept and reported through
/// [`Cursor::iteration_failure`] once the rows read before it are consumed.
#[derive(Debug, Default)]
pub struct BufferedCursor {
    rows: VecDeque<Vec<Value>>,
    current: Option<Vec<Value>>,
    failure: Option<Error>,
    released: bool,
}

impl BufferedCursor {
    pub fn new(rows: impl IntoIterator<Item = Vec<Value>>) -> Self {
        Self {
            rows: rows.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Attaches a failure to report after the buffered rows.
    pub fn with_failure(mut self, failure: Error) -> Self {
        self.failure = Some(failure);
        self
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Rows not yet yielded.
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }
}

impl Cursor for BufferedCursor {
    fn advance(&mut self) -> bool {
        if self.released {
            return false;
        }
        self.current = self.rows.pop_front();
        self.current.is_some()
    }

    fn decode_current<T: FromRow>(&self) -> Result<T, DecodeError> {
        let row = self.current.as_deref().ok_or(DecodeError::NoCurrentRow)?;
        T::from_row(row)
    }

    fn iteration_failure(&mut self) -> Option<Error> {
        self.failure.take()
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.rows.clear();
        self.current = None;
        self.released = true;
    }
}
