use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{debug, warn};

use crate::binder;
use crate::core::{DbError, Result, SessionError, SessionResult, Value};
use crate::interface::{Closeable, Connection, DataSource, GeneratedKeys, RowCursor, Statement};

/// Statement executor bound to one connection.
///
/// Select a name:
///
/// ```ignore
/// let name = Session::new(&source)?
///     .sql("SELECT name FROM foo WHERE id = ?")
///     .set(123)
///     .select(handlers::single)?;
/// ```
///
/// [`select`](Self::select), [`update`](Self::update) and
/// [`insert`](Self::insert) clear the arguments collected by
/// [`set`](Self::set), so one session can run several statements in a row.
/// With autocommit turned off they all share one transaction that ends with
/// [`commit`](Self::commit), or is rolled back if any of them fails:
///
/// ```ignore
/// let session = Session::new(&source)?;
/// session
///     .autocommit(false)
///     .sql("DELETE FROM foo WHERE id = ?")
///     .set(444)
///     .update()?
///     .set(555)
///     .update()?;
/// session.commit()?;
/// ```
///
/// With autocommit on (the default) every execution commits and closes the
/// connection, even when the statement failed. Turn autocommit off whenever a
/// failure must roll back.
///
/// Builder calls and executions are serialized by a lock owned by the
/// session, so a session can be shared between threads. The processing
/// function runs while that lock is held and must not call back into the
/// same session.
pub struct Session<C: Connection> {
    link: Mutex<Link<C>>,
    args: Mutex<Vec<Value>>,
}

/// Connection plus the state guarded together with it.
struct Link<C: Connection> {
    conn: C,
    query: Option<String>,
    auto: bool,
    closed: bool,
}

/// How an execution obtains its row cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fetch {
    Query,
    Update,
    Insert,
}

impl Fetch {
    fn fetch<S: Statement>(self, stmt: &mut S) -> Result<Option<S::Rows>> {
        match self {
            Self::Query => stmt.execute_query().map(Some),
            Self::Update => {
                let count = stmt.execute_update()?;
                debug!("{} row(s) affected", count);
                Ok(None)
            }
            Self::Insert => {
                stmt.execute()?;
                stmt.generated_keys().map(Some)
            }
        }
    }
}

/// Closes the wrapped resource when dropped. A close failure is logged only.
struct Scoped<R: Closeable> {
    label: &'static str,
    resource: R,
}

impl<R: Closeable> Scoped<R> {
    fn new(label: &'static str, resource: R) -> Self {
        Self { label, resource }
    }
}

impl<R: Closeable> Deref for Scoped<R> {
    type Target = R;

    fn deref(&self) -> &R {
        &self.resource
    }
}

impl<R: Closeable> DerefMut for Scoped<R> {
    fn deref_mut(&mut self) -> &mut R {
        &mut self.resource
    }
}

impl<R: Closeable> Drop for Scoped<R> {
    fn drop(&mut self) {
        if let Err(e) = self.resource.close() {
            warn!("Failed to close {}: {}", self.label, e);
        }
    }
}

impl<C: Connection> Session<C> {
    /// Open a session on a fresh connection from `source`.
    pub fn new<D>(source: &D) -> SessionResult<Self>
    where
        D: DataSource<Connection = C>,
    {
        let conn = source.connection().map_err(SessionError::Connect)?;
        Ok(Self::from_connection(conn))
    }

    /// Open a session on an already open connection. The session closes it.
    pub fn from_connection(conn: C) -> Self {
        Self {
            link: Mutex::new(Link {
                conn,
                query: None,
                auto: true,
                closed: false,
            }),
            args: Mutex::new(Vec::new()),
        }
    }

    // Builder state is plain data, a poisoned lock is still usable.
    fn link(&self) -> MutexGuard<'_, Link<C>> {
        self.link.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn pending_args(&self) -> MutexGuard<'_, Vec<Value>> {
        self.args.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Use this query for the next execution, `?` marks a parameter.
    pub fn sql(&self, sql: impl Into<String>) -> &Self {
        let sql = sql.into();
        debug!("sql: {}", sql);
        self.link().query = Some(sql);
        self
    }

    /// With `true` (the default) every execution commits and closes the
    /// connection.
    pub fn autocommit(&self, autocommit: bool) -> &Self {
        debug!("autocommit: {}", autocommit);
        self.link().auto = autocommit;
        self
    }

    /// Append an argument for the next placeholder.
    ///
    /// Nulls, `i64`, `bool`, dates, `i32` and [`Utc`](crate::Utc) timestamps
    /// bind natively, anything else binds as text.
    pub fn set(&self, value: impl Into<Value>) -> &Self {
        self.pending_args().push(value.into());
        self
    }

    /// Commit the transaction and close the connection.
    pub fn commit(&self) -> SessionResult<()> {
        let mut link = self.link.lock()?;
        link.commit()
    }

    /// Run the query and hand its rows to `handler`.
    pub fn select<T, F>(&self, handler: F) -> SessionResult<T>
    where
        F: FnOnce(&mut dyn RowCursor) -> Result<T>,
    {
        self.run(Fetch::Query, with_rows(handler))
    }

    /// Run a data-modification statement.
    pub fn update(&self) -> SessionResult<&Self> {
        self.run(Fetch::Update, |_| Ok(()))?;
        Ok(self)
    }

    /// Run an insert and hand the generated keys to `handler`.
    pub fn insert<T, F>(&self, handler: F) -> SessionResult<T>
    where
        F: FnOnce(&mut dyn RowCursor) -> Result<T>,
    {
        self.run(Fetch::Insert, with_rows(handler))
    }

    pub fn is_autocommit(&self) -> bool {
        self.link().auto
    }

    /// `true` once the connection was closed by a commit or a rollback.
    pub fn is_closed(&self) -> bool {
        self.link().closed
    }

    pub fn query(&self) -> Option<String> {
        self.link().query.clone()
    }

    /// Arguments waiting for the next execution.
    pub fn pending(&self) -> Vec<Value> {
        self.pending_args().clone()
    }

    fn run<T, F>(&self, fetch: Fetch, handler: F) -> SessionResult<T>
    where
        F: FnOnce(Option<&mut dyn RowCursor>) -> Result<T>,
    {
        let mut link = self.link.lock()?;
        // Taken up front: whatever happens below, these are consumed.
        let args = std::mem::take(&mut *self.pending_args());
        if link.closed {
            return Err(SessionError::Closed);
        }
        let query = link.query.clone().ok_or(SessionError::NoQuery)?;
        debug!("{:?}: {} with {} argument(s)", fetch, query, args.len());

        let outcome = link.execute(&query, &args, fetch, handler).map_err(|e| {
            if !link.auto {
                link.rollback_and_close();
            }
            SessionError::Execution(e)
        });

        if !link.auto {
            return outcome;
        }
        let committed = link.commit();
        match (outcome, committed) {
            (Ok(result), Ok(())) => Ok(result),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(commit)) => {
                warn!("Commit after failed statement also failed: {}", commit);
                Err(e)
            }
        }
    }
}

fn with_rows<T, F>(handler: F) -> impl FnOnce(Option<&mut dyn RowCursor>) -> Result<T>
where
    F: FnOnce(&mut dyn RowCursor) -> Result<T>,
{
    move |rows: Option<&mut dyn RowCursor>| match rows {
        Some(rows) => handler(rows),
        None => Err(DbError::UnsupportedOperation("statement produced no rows".into())),
    }
}

impl<C: Connection> Link<C> {
    fn execute<T, F>(&mut self, query: &str, args: &[Value], fetch: Fetch, handler: F) -> Result<T>
    where
        F: FnOnce(Option<&mut dyn RowCursor>) -> Result<T>,
    {
        self.conn.set_auto_commit(false)?;
        let mut stmt = Scoped::new("statement", self.conn.prepare(query, GeneratedKeys::Return)?);
        binder::bind_all(&mut *stmt, args)?;
        match fetch.fetch(&mut *stmt)? {
            Some(rows) => {
                let mut rows = Scoped::new("row cursor", rows);
                let cursor: &mut dyn RowCursor = &mut *rows;
                handler(Some(cursor))
            }
            None => handler(None),
        }
    }

    fn commit(&mut self) -> SessionResult<()> {
        if self.closed {
            return Err(SessionError::Closed);
        }
        let committed = self.conn.commit().map_err(SessionError::Commit);
        self.close_quietly();
        committed
    }

    fn rollback_and_close(&mut self) {
        if let Err(e) = self.conn.rollback() {
            warn!("Rollback failed: {}", e);
        }
        self.close_quietly();
    }

    fn close_quietly(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.conn.close() {
            warn!("Failed to close connection: {}", e);
        }
    }
}

impl<C: Connection> fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let link = self.link();
        f.debug_struct("Session")
            .field("query", &link.query)
            .field("autocommit", &link.auto)
            .field("closed", &link.closed)
            .field("pending", &self.pending_args().len())
            .finish()
    }
}
