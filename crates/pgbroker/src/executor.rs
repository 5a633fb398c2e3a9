//! Execution capability consumed by queries.
//!
//! Statement assembly never talks to a driver directly: it renders text plus
//! bindings and hands both to an [`Executor`]. Implementations for
//! tokio-postgres clients live in [`crate::postgres`]; tests supply mocks.

use std::collections::VecDeque;
use std::future::Future;

use crate::error::ExecutionError;
use crate::map::BindValues;
use crate::value::Value;

/// Something that can run a rendered statement and report identity values.
pub trait Executor: Send + Sync {
    /// Run a rendered statement with its placeholder bindings.
    fn execute(
        &self,
        sql: &str,
        bindings: &BindValues,
    ) -> impl Future<Output = Result<RawResult, ExecutionError>> + Send;

    /// Identity value generated by the most recent insert on this
    /// connection.
    fn last_insert_id(&self) -> impl Future<Output = Result<Value, ExecutionError>> + Send;
}

impl<E: Executor> Executor for &E {
    fn execute(
        &self,
        sql: &str,
        bindings: &BindValues,
    ) -> impl Future<Output = Result<RawResult, ExecutionError>> + Send {
        (**self).execute(sql, bindings)
    }

    fn last_insert_id(&self) -> impl Future<Output = Result<Value, ExecutionError>> + Send {
        (**self).last_insert_id()
    }
}

/// One backend row, decoded to `(column, value)` pairs in select-list order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    columns: Vec<(String, Value)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a decoded column.
    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.columns.push((column.into(), value.into()));
    }

    /// Borrowing iterator over the decoded columns.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl FromIterator<(String, Value)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for RawRow {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.into_iter()
    }
}

/// Backend outcome of one statement: decoded rows plus the affected count.
///
/// Rows hand out in arrival order through [`next_row`](Self::next_row).
#[derive(Debug, Default)]
pub struct RawResult {
    rows: VecDeque<RawRow>,
    rows_affected: u64,
}

impl RawResult {
    pub fn new(rows: impl IntoIterator<Item = RawRow>, rows_affected: u64) -> Self {
        Self {
            rows: rows.into_iter().collect(),
            rows_affected,
        }
    }

    /// Result of a row-returning statement; the affected count is the row
    /// count.
    pub fn from_rows(rows: impl IntoIterator<Item = RawRow>) -> Self {
        let rows: VecDeque<RawRow> = rows.into_iter().collect();
        let rows_affected = rows.len() as u64;
        Self {
            rows,
            rows_affected,
        }
    }

    /// Result of a statement that only reports how many rows it touched.
    pub fn from_rows_affected(rows_affected: u64) -> Self {
        Self {
            rows: VecDeque::new(),
            rows_affected,
        }
    }

    /// Take the next row, front first.
    pub fn next_row(&mut self) -> Option<RawRow> {
        self.rows.pop_front()
    }

    /// Rows not yet taken.
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }

    pub fn rows_affected(&self) -> u64 {
        self.rows_affected
    }
}
