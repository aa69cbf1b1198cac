use thiserror::Error;

/// Data-access error raised by a connection provider, a row cursor, or a
/// caller-supplied processing function.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQL error: {0}")]
    SqlError(String),

    #[error("Connection is closed")]
    ConnectionClosed,

    #[error("Statement is closed")]
    StatementClosed,

    #[error("Cursor is not positioned on a row")]
    NoCurrentRow,

    #[error("Column {0} out of range (cursor has {1} columns)")]
    ColumnOutOfRange(usize, usize),

    #[error("Parameter {0} out of range")]
    ParameterOutOfRange(usize),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Parameter {0} was never set")]
    ParameterNotSet(usize),

    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, DbError>;

/// Caller-facing error of a [`Session`](crate::Session).
///
/// Two classes exist. Fatal errors (`NoQuery`, `Connect`, `Commit`, `Closed`,
/// `Lock`) signal misuse or a broken connection and must not be retried.
/// `Execution` wraps a failure raised while preparing, binding, executing or
/// processing a statement.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No query set, call sql() first")]
    NoQuery,

    #[error("Cannot obtain connection: {0}")]
    Connect(#[source] DbError),

    #[error("Commit failed: {0}")]
    Commit(#[source] DbError),

    #[error("Session connection is closed")]
    Closed,

    #[error("Lock error: {0}")]
    Lock(String),

    #[error("Statement execution failed: {0}")]
    Execution(#[source] DbError),
}

impl SessionError {
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Execution(_))
    }

    /// Underlying data-access error, if any.
    pub fn cause(&self) -> Option<&DbError> {
        match self {
            Self::Connect(err) | Self::Commit(err) | Self::Execution(err) => Some(err),
            _ => None,
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for SessionError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::Lock(err.to_string())
    }
}

pub type SessionResult<T> = std::result::Result<T, SessionError>;
