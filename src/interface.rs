use chrono::{DateTime, NaiveDate};

use crate::core::{Result, Value};

/// Whether a prepared statement should make generated keys retrievable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratedKeys {
    Return,
    NoReturn,
}

/// A native resource that must be released explicitly.
///
/// Closing twice is allowed and is a no-op the second time.
pub trait Closeable {
    fn close(&mut self) -> Result<()>;
}

/// A factory of connections.
///
/// Implement it over a driver (or a pool) to let [`Session::new`](crate::Session::new)
/// obtain its connection.
pub trait DataSource {
    type Connection: Connection;

    fn connection(&self) -> Result<Self::Connection>;
}

/// An open connection to a database, following the classic statement-level
/// driver model: manual commit toggle, prepared statements, explicit
/// commit/rollback and close.
pub trait Connection {
    type Statement<'c>: Statement
    where
        Self: 'c;

    /// `false` puts the connection into manual-commit mode, statements then
    /// run in a transaction that ends with [`commit`](Self::commit) or
    /// [`rollback`](Self::rollback).
    fn set_auto_commit(&mut self, auto_commit: bool) -> Result<()>;

    /// Prepare `sql`, with `?` as positional placeholders.
    fn prepare(&mut self, sql: &str, keys: GeneratedKeys) -> Result<Self::Statement<'_>>;

    fn commit(&mut self) -> Result<()>;

    fn rollback(&mut self) -> Result<()>;

    fn close(&mut self) -> Result<()>;
}

/// A prepared statement. Parameter positions are 1-indexed.
pub trait Statement: Closeable {
    type Rows: RowCursor;

    /// Bind SQL NULL, typed as text.
    fn set_null(&mut self, pos: usize) -> Result<()>;

    fn set_long(&mut self, pos: usize, value: i64) -> Result<()>;

    fn set_boolean(&mut self, pos: usize, value: bool) -> Result<()>;

    fn set_date(&mut self, pos: usize, value: NaiveDate) -> Result<()>;

    fn set_int(&mut self, pos: usize, value: i32) -> Result<()>;

    fn set_timestamp(&mut self, pos: usize, value: DateTime<chrono::Utc>) -> Result<()>;

    fn set_string(&mut self, pos: usize, value: &str) -> Result<()>;

    /// Execute any kind of statement, discarding what it returns.
    fn execute(&mut self) -> Result<()>;

    /// Execute a data-modification statement, returning the affected row count.
    fn execute_update(&mut self) -> Result<u64>;

    fn execute_query(&mut self) -> Result<Self::Rows>;

    /// Keys generated by the last execution. Only available when the
    /// statement was prepared with [`GeneratedKeys::Return`].
    fn generated_keys(&mut self) -> Result<Self::Rows>;
}

/// Forward-only cursor over the rows of a result. Column indexes are 1-indexed.
///
/// The cursor starts before the first row, [`next`](Self::next) must be
/// called before reading.
pub trait RowCursor: Closeable {
    /// Advance to the next row, `false` once the rows are exhausted.
    fn next(&mut self) -> Result<bool>;

    fn column_count(&self) -> usize;

    fn column_name(&self, column: usize) -> Result<&str>;

    fn get(&self, column: usize) -> Result<Value>;

    fn get_string(&self, column: usize) -> Result<Option<String>> {
        Ok(match self.get(column)? {
            Value::Null => None,
            Value::Text(s) => Some(s),
            other => Some(other.to_string()),
        })
    }

    fn get_long(&self, column: usize) -> Result<Option<i64>> {
        let value = self.get(column)?;
        if value.is_null() {
            return Ok(None);
        }
        value.as_i64().map(Some).ok_or_else(|| {
            crate::core::DbError::TypeMismatch(format!(
                "column {} holds {}, not an integer",
                column,
                value.type_name()
            ))
        })
    }
}
