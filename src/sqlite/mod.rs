//! SQLite provider built on `rusqlite`.
//!
//! Manual-commit mode is emulated with `BEGIN`/`COMMIT`: the transaction is
//! opened lazily by the first statement prepared after autocommit was turned
//! off, and ended by [`commit`](Connection::commit) or
//! [`rollback`](Connection::rollback). Transaction-control statements
//! (`BEGIN`, `COMMIT`, `END`, `ROLLBACK`, `SAVEPOINT`, `RELEASE`) never open
//! one implicitly, so a session may start its transaction explicitly with
//! `sql("BEGIN").update()`.

pub mod config;
mod statement;

use log::debug;
use rusqlite::OpenFlags;

use crate::core::{DbError, Result};
use crate::interface::{Connection, DataSource, GeneratedKeys};

pub use config::SqliteConfig;
pub use statement::SqliteStatement;

const TRANSACTION_KEYWORDS: [&str; 6] =
    ["BEGIN", "COMMIT", "END", "ROLLBACK", "SAVEPOINT", "RELEASE"];

fn controls_transaction(sql: &str) -> bool {
    let keyword = sql
        .trim_start()
        .split(|c: char| !c.is_ascii_alphabetic())
        .next()
        .unwrap_or_default();
    TRANSACTION_KEYWORDS
        .iter()
        .any(|k| keyword.eq_ignore_ascii_case(k))
}

/// Opens a new SQLite connection per request.
#[derive(Debug, Clone)]
pub struct SqliteSource {
    config: SqliteConfig,
}

impl SqliteSource {
    pub fn new(config: SqliteConfig) -> Result<Self> {
        config.validate().map_err(DbError::SqlError)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SqliteConfig {
        &self.config
    }
}

impl DataSource for SqliteSource {
    type Connection = SqliteConnection;

    fn connection(&self) -> Result<SqliteConnection> {
        SqliteConnection::open(&self.config)
    }
}

/// SQLite connection handle
pub struct SqliteConnection {
    /// `None` once closed
    conn: Option<rusqlite::Connection>,
    auto_commit: bool,
}

impl SqliteConnection {
    pub fn open(config: &SqliteConfig) -> Result<Self> {
        let conn = match &config.path {
            Some(path) => {
                let flags = if config.read_only {
                    OpenFlags::SQLITE_OPEN_READ_ONLY
                        | OpenFlags::SQLITE_OPEN_URI
                        | OpenFlags::SQLITE_OPEN_NO_MUTEX
                } else {
                    OpenFlags::default()
                };
                rusqlite::Connection::open_with_flags(path, flags)?
            }
            None => rusqlite::Connection::open_in_memory()?,
        };

        conn.busy_timeout(config.busy_timeout)?;
        if config.foreign_keys {
            conn.execute_batch("PRAGMA foreign_keys = ON")?;
        }

        debug!("Opened SQLite connection to {}", config.to_url());
        Ok(Self::from_raw(conn))
    }

    /// Wrap a connection opened elsewhere.
    pub fn from_raw(conn: rusqlite::Connection) -> Self {
        Self {
            conn: Some(conn),
            auto_commit: true,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.conn.is_none()
    }

    /// `true` while a transaction is open.
    pub fn in_transaction(&self) -> bool {
        self.conn.as_ref().is_some_and(|c| !c.is_autocommit())
    }

    fn raw(&self) -> Result<&rusqlite::Connection> {
        self.conn.as_ref().ok_or(DbError::ConnectionClosed)
    }

    fn end_transaction(&self, verb: &str) -> Result<()> {
        let conn = self.raw()?;
        if !conn.is_autocommit() {
            conn.execute_batch(verb)?;
        }
        Ok(())
    }
}

impl Connection for SqliteConnection {
    type Statement<'c> = SqliteStatement<'c> where Self: 'c;

    fn set_auto_commit(&mut self, auto_commit: bool) -> Result<()> {
        if auto_commit && !self.auto_commit {
            self.end_transaction("COMMIT")?;
        }
        self.auto_commit = auto_commit;
        Ok(())
    }

    fn prepare(&mut self, sql: &str, keys: GeneratedKeys) -> Result<SqliteStatement<'_>> {
        let conn = self.raw()?;
        if !self.auto_commit && conn.is_autocommit() && !controls_transaction(sql) {
            conn.execute_batch("BEGIN")?;
        }
        let stmt = conn.prepare(sql)?;
        Ok(SqliteStatement::new(conn, stmt, keys))
    }

    fn commit(&mut self) -> Result<()> {
        self.end_transaction("COMMIT")
    }

    fn rollback(&mut self) -> Result<()> {
        self.end_transaction("ROLLBACK")
    }

    fn close(&mut self) -> Result<()> {
        match self.conn.take() {
            Some(conn) => conn.close().map_err(|(_, e)| DbError::from(e)),
            None => Ok(()),
        }
    }
}
