// ============================================================================
// sqlsession
// ============================================================================

//! Statement sessions over a single database connection.
//!
//! A [`Session`] collects a query and its positional arguments, executes it as
//! a select, an update or an insert, hands the raw rows to a processing
//! function and then commits or rolls back according to its autocommit
//! policy. The row cursor and then the prepared statement are released on
//! every exit path.
//!
//! ```ignore
//! use sqlsession::{handlers, Session, SqliteConfig, SqliteSource};
//!
//! let source = SqliteSource::new(SqliteConfig::new("app.db"))?;
//! let name = Session::new(&source)?
//!     .sql("SELECT name FROM foo WHERE id = ?")
//!     .set(42)
//!     .select(|rows| {
//!         rows.next()?;
//!         rows.get_string(1)
//!     })?;
//! ```
//!
//! Any driver can be plugged in by implementing the traits of [`interface`].
//! A SQLite implementation ships behind the default `sqlite` feature.

pub mod binder;
pub mod core;
pub mod handlers;
pub mod interface;
pub mod result;
pub mod session;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use crate::core::{DbError, Result, SessionError, SessionResult, Utc, Value};
pub use interface::{Closeable, Connection, DataSource, GeneratedKeys, RowCursor, Statement};
pub use result::MemoryRows;
pub use session::Session;

#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteConfig, SqliteConnection, SqliteSource, SqliteStatement};
