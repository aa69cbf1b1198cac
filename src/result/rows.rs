use crate::core::{DbError, Result, Value};
use crate::interface::{Closeable, RowCursor};

/// A row cursor over rows already materialized in memory.
#[derive(Debug, Clone)]
pub struct MemoryRows {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    /// Index of the current row plus one, 0 = before the first row.
    position: usize,
    closed: bool,
}

impl MemoryRows {
    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns,
            rows,
            position: 0,
            closed: false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn check_open(&self) -> Result<()> {
        if self.closed {
            return Err(DbError::UnsupportedOperation("cursor is closed".into()));
        }
        Ok(())
    }

    fn column_index(&self, column: usize) -> Result<usize> {
        if column == 0 || column > self.columns.len() {
            return Err(DbError::ColumnOutOfRange(column, self.columns.len()));
        }
        Ok(column - 1)
    }
}

impl Closeable for MemoryRows {
    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

impl RowCursor for MemoryRows {
    fn next(&mut self) -> Result<bool> {
        self.check_open()?;
        if self.position < self.rows.len() {
            self.position += 1;
            return Ok(true);
        }
        // stays past the end
        self.position = self.rows.len() + 1;
        Ok(false)
    }

    fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn column_name(&self, column: usize) -> Result<&str> {
        let idx = self.column_index(column)?;
        Ok(&self.columns[idx])
    }

    fn get(&self, column: usize) -> Result<Value> {
        self.check_open()?;
        let idx = self.column_index(column)?;
        let row = self
            .position
            .checked_sub(1)
            .and_then(|r| self.rows.get(r))
            .ok_or(DbError::NoCurrentRow)?;
        row.get(idx).cloned().ok_or(DbError::ColumnOutOfRange(column, row.len()))
    }
}
