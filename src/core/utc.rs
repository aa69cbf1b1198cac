use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat};

use crate::core::{DbError, Result};
use crate::interface::Statement;

/// A point in time in UTC that knows how to bind itself as a timestamp
/// parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Utc(DateTime<chrono::Utc>);

impl Utc {
    pub fn new(moment: DateTime<chrono::Utc>) -> Self {
        Self(moment)
    }

    pub fn now() -> Self {
        Self(chrono::Utc::now())
    }

    pub fn date_time(&self) -> DateTime<chrono::Utc> {
        self.0
    }

    /// Set this moment as the timestamp parameter at `pos` (1-indexed).
    pub fn bind<S: Statement + ?Sized>(&self, stmt: &mut S, pos: usize) -> Result<()> {
        stmt.set_timestamp(pos, self.0)
    }
}

impl From<DateTime<chrono::Utc>> for Utc {
    fn from(moment: DateTime<chrono::Utc>) -> Self {
        Self(moment)
    }
}

impl FromStr for Utc {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| Self(dt.with_timezone(&chrono::Utc)))
            .map_err(|e| DbError::TypeMismatch(format!("'{}' is not an RFC 3339 timestamp: {}", s, e)))
    }
}

impl fmt::Display for Utc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}
