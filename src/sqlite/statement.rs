use chrono::{DateTime, NaiveDate};
use rusqlite::ToSql;
use rusqlite::types::{Null, ValueRef};

use crate::core::{DbError, Result, Utc, Value};
use crate::interface::{Closeable, GeneratedKeys, Statement};
use crate::result::MemoryRows;

const GENERATED_KEY_COLUMN: &str = "GENERATED_KEY";

/// Prepared SQLite statement. Query results are read fully into a
/// [`MemoryRows`] cursor.
pub struct SqliteStatement<'c> {
    conn: &'c rusqlite::Connection,
    /// `None` once finalized
    stmt: Option<rusqlite::Statement<'c>>,
    keys: GeneratedKeys,
    /// One flag per placeholder
    bound: Vec<bool>,
    /// Rowid inserted by the last execution
    key: Option<i64>,
}

impl<'c> SqliteStatement<'c> {
    pub(crate) fn new(
        conn: &'c rusqlite::Connection,
        stmt: rusqlite::Statement<'c>,
        keys: GeneratedKeys,
    ) -> Self {
        let bound = vec![false; stmt.parameter_count()];
        Self {
            conn,
            stmt: Some(stmt),
            keys,
            bound,
            key: None,
        }
    }

    pub fn parameter_count(&self) -> usize {
        self.stmt.as_ref().map_or(0, |s| s.parameter_count())
    }

    fn raw(&mut self) -> Result<&mut rusqlite::Statement<'c>> {
        self.stmt.as_mut().ok_or(DbError::StatementClosed)
    }

    fn bind<T: ToSql>(&mut self, pos: usize, value: T) -> Result<()> {
        let stmt = self.raw()?;
        if pos == 0 || pos > stmt.parameter_count() {
            return Err(DbError::ParameterOutOfRange(pos));
        }
        stmt.raw_bind_parameter(pos, value)?;
        self.bound[pos - 1] = true;
        Ok(())
    }

    fn check_bound(&self) -> Result<()> {
        if self.stmt.is_none() {
            return Err(DbError::StatementClosed);
        }
        match self.bound.iter().position(|set| !set) {
            Some(idx) => Err(DbError::ParameterNotSet(idx + 1)),
            None => Ok(()),
        }
    }

    /// Run to completion. With `drain`, rows returned by the statement are
    /// stepped through and dropped, otherwise they are an error.
    fn run(&mut self, drain: bool) -> Result<usize> {
        self.check_bound()?;
        let conn = self.conn;
        let last_rowid = conn.last_insert_rowid();

        let stmt = self.raw()?;
        let changed = if drain {
            let mut rows = stmt.raw_query();
            while rows.next()?.is_some() {}
            drop(rows);
            conn.changes() as usize
        } else {
            stmt.raw_execute()?
        };

        let rowid = conn.last_insert_rowid();
        self.key = (changed > 0 && rowid != last_rowid).then_some(rowid);
        Ok(changed)
    }
}

fn read_value(value: ValueRef<'_>) -> Result<Value> {
    Ok(match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Long(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(_) => {
            return Err(DbError::UnsupportedOperation("BLOB columns cannot be read".into()));
        }
    })
}

impl Closeable for SqliteStatement<'_> {
    fn close(&mut self) -> Result<()> {
        match self.stmt.take() {
            Some(stmt) => stmt.finalize().map_err(DbError::from),
            None => Ok(()),
        }
    }
}

impl Statement for SqliteStatement<'_> {
    type Rows = MemoryRows;

    fn set_null(&mut self, pos: usize) -> Result<()> {
        self.bind(pos, Null)
    }

    fn set_long(&mut self, pos: usize, value: i64) -> Result<()> {
        self.bind(pos, value)
    }

    fn set_boolean(&mut self, pos: usize, value: bool) -> Result<()> {
        self.bind(pos, value)
    }

    fn set_date(&mut self, pos: usize, value: NaiveDate) -> Result<()> {
        self.bind(pos, value.format("%Y-%m-%d").to_string())
    }

    fn set_int(&mut self, pos: usize, value: i32) -> Result<()> {
        self.bind(pos, value)
    }

    fn set_timestamp(&mut self, pos: usize, value: DateTime<chrono::Utc>) -> Result<()> {
        self.bind(pos, Utc::new(value).to_string())
    }

    fn set_string(&mut self, pos: usize, value: &str) -> Result<()> {
        self.bind(pos, value)
    }

    fn execute(&mut self) -> Result<()> {
        self.run(true).map(|_| ())
    }

    fn execute_update(&mut self) -> Result<u64> {
        self.run(false).map(|n| n as u64)
    }

    fn execute_query(&mut self) -> Result<MemoryRows> {
        self.check_bound()?;
        let stmt = self.raw()?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut data = Vec::new();
        let mut rows = stmt.raw_query();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(columns.len());
            for idx in 0..columns.len() {
                values.push(read_value(row.get_ref(idx)?)?);
            }
            data.push(values);
        }

        Ok(MemoryRows::new(columns, data))
    }

    fn generated_keys(&mut self) -> Result<MemoryRows> {
        if self.keys != GeneratedKeys::Return {
            return Err(DbError::UnsupportedOperation(
                "statement was not prepared to return generated keys".into(),
            ));
        }
        let rows = self.key.map(|key| vec![Value::Long(key)]).into_iter().collect();
        Ok(MemoryRows::new(vec![GENERATED_KEY_COLUMN.to_string()], rows))
    }
}
