//! In-process provider that records every call it receives.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate};
use sqlsession::{
    Closeable, Connection, DataSource, DbError, GeneratedKeys, MemoryRows, Result, RowCursor,
    Statement, Value,
};

pub type Events = Arc<Mutex<Vec<String>>>;

/// Which calls fail, and what the cursors return.
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub fail_connect: bool,
    pub fail_prepare: bool,
    pub fail_bind_at: Option<usize>,
    pub fail_fetch: bool,
    pub fail_commit: bool,
    pub fail_close_rows: bool,
    pub fail_close_statement: bool,
    pub rows: Vec<Vec<Value>>,
    pub keys: Vec<i64>,
}

#[derive(Clone)]
pub struct RecordingSource {
    pub events: Events,
    pub script: Script,
}

impl RecordingSource {
    pub fn new(script: Script) -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            script,
        }
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, event: &str) -> usize {
        self.events().iter().filter(|e| e.as_str() == event).count()
    }

    pub fn position(&self, event: &str) -> Option<usize> {
        self.events().iter().position(|e| e == event)
    }
}

impl DataSource for RecordingSource {
    type Connection = RecordingConnection;

    fn connection(&self) -> Result<RecordingConnection> {
        if self.script.fail_connect {
            return Err(DbError::SqlError("connection refused".into()));
        }
        Ok(RecordingConnection {
            events: Arc::clone(&self.events),
            script: self.script.clone(),
            closed: false,
        })
    }
}

fn record(events: &Events, event: impl Into<String>) {
    events.lock().unwrap().push(event.into());
}

pub struct RecordingConnection {
    events: Events,
    script: Script,
    closed: bool,
}

impl Connection for RecordingConnection {
    type Statement<'c> = RecordingStatement where Self: 'c;

    fn set_auto_commit(&mut self, auto_commit: bool) -> Result<()> {
        record(&self.events, format!("autocommit:{}", auto_commit));
        Ok(())
    }

    fn prepare(&mut self, sql: &str, keys: GeneratedKeys) -> Result<RecordingStatement> {
        if self.closed {
            return Err(DbError::ConnectionClosed);
        }
        record(&self.events, format!("prepare:{}", sql));
        if self.script.fail_prepare {
            return Err(DbError::SqlError("syntax error".into()));
        }
        Ok(RecordingStatement {
            events: Arc::clone(&self.events),
            script: self.script.clone(),
            keys,
        })
    }

    fn commit(&mut self) -> Result<()> {
        record(&self.events, "commit");
        if self.script.fail_commit {
            return Err(DbError::SqlError("disk I/O error".into()));
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        record(&self.events, "rollback");
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        record(&self.events, "close:connection");
        self.closed = true;
        Ok(())
    }
}

pub struct RecordingStatement {
    events: Events,
    script: Script,
    keys: GeneratedKeys,
}

impl RecordingStatement {
    fn bound(&self, pos: usize, what: String) -> Result<()> {
        if self.script.fail_bind_at == Some(pos) {
            return Err(DbError::ParameterOutOfRange(pos));
        }
        record(&self.events, format!("bind:{}:{}", pos, what));
        Ok(())
    }

    fn rows(&self, rows: Vec<Vec<Value>>) -> RecordingRows {
        RecordingRows {
            inner: MemoryRows::new(vec!["c1".into()], rows),
            events: Arc::clone(&self.events),
            fail_close: self.script.fail_close_rows,
        }
    }
}

impl Closeable for RecordingStatement {
    fn close(&mut self) -> Result<()> {
        record(&self.events, "close:statement");
        if self.script.fail_close_statement {
            return Err(DbError::SqlError("cannot finalize".into()));
        }
        Ok(())
    }
}

impl Statement for RecordingStatement {
    type Rows = RecordingRows;

    fn set_null(&mut self, pos: usize) -> Result<()> {
        self.bound(pos, "null".into())
    }

    fn set_long(&mut self, pos: usize, value: i64) -> Result<()> {
        self.bound(pos, format!("long:{}", value))
    }

    fn set_boolean(&mut self, pos: usize, value: bool) -> Result<()> {
        self.bound(pos, format!("boolean:{}", value))
    }

    fn set_date(&mut self, pos: usize, value: NaiveDate) -> Result<()> {
        self.bound(pos, format!("date:{}", value))
    }

    fn set_int(&mut self, pos: usize, value: i32) -> Result<()> {
        self.bound(pos, format!("int:{}", value))
    }

    fn set_timestamp(&mut self, pos: usize, value: DateTime<chrono::Utc>) -> Result<()> {
        self.bound(pos, format!("timestamp:{}", value.timestamp()))
    }

    fn set_string(&mut self, pos: usize, value: &str) -> Result<()> {
        self.bound(pos, format!("string:{}", value))
    }

    fn execute(&mut self) -> Result<()> {
        record(&self.events, "execute");
        if self.script.fail_fetch {
            return Err(DbError::SqlError("constraint failed".into()));
        }
        Ok(())
    }

    fn execute_update(&mut self) -> Result<u64> {
        record(&self.events, "execute_update");
        if self.script.fail_fetch {
            return Err(DbError::SqlError("constraint failed".into()));
        }
        Ok(1)
    }

    fn execute_query(&mut self) -> Result<RecordingRows> {
        record(&self.events, "execute_query");
        if self.script.fail_fetch {
            return Err(DbError::SqlError("no such table: foo".into()));
        }
        Ok(self.rows(self.script.rows.clone()))
    }

    fn generated_keys(&mut self) -> Result<RecordingRows> {
        record(&self.events, "generated_keys");
        if self.keys != GeneratedKeys::Return {
            return Err(DbError::UnsupportedOperation("keys not requested".into()));
        }
        let keys = self.script.keys.iter().map(|k| vec![Value::Long(*k)]).collect();
        Ok(self.rows(keys))
    }
}

pub struct RecordingRows {
    inner: MemoryRows,
    events: Events,
    fail_close: bool,
}

impl Closeable for RecordingRows {
    fn close(&mut self) -> Result<()> {
        record(&self.events, "close:rows");
        self.inner.close()?;
        if self.fail_close {
            return Err(DbError::SqlError("cannot close cursor".into()));
        }
        Ok(())
    }
}

impl RowCursor for RecordingRows {
    fn next(&mut self) -> Result<bool> {
        self.inner.next()
    }

    fn column_count(&self) -> usize {
        self.inner.column_count()
    }

    fn column_name(&self, column: usize) -> Result<&str> {
        self.inner.column_name(column)
    }

    fn get(&self, column: usize) -> Result<Value> {
        self.inner.get(column)
    }
}
