use std::fmt;

use chrono::{DateTime, NaiveDate};

use crate::core::Utc;

/// A statement argument or a column value read from a row cursor.
///
/// The first six variants are the argument kinds with a dedicated parameter
/// setter. Everything else binds as text, see [`crate::binder`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Long(i64),
    Boolean(bool),
    Date(NaiveDate),
    Int(i32),
    Timestamp(Utc),
    Float(f64),
    Text(String),
}

impl Value {
    /// Textual argument built from any displayable value.
    pub fn display<T: fmt::Display + ?Sized>(value: &T) -> Self {
        Self::Text(value.to_string())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Long(_) => "BIGINT",
            Self::Boolean(_) => "BOOLEAN",
            Self::Date(_) => "DATE",
            Self::Int(_) => "INTEGER",
            Self::Timestamp(_) => "TIMESTAMP",
            Self::Float(_) => "FLOAT",
            Self::Text(_) => "TEXT",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Long(i) => Some(*i),
            Self::Int(i) => Some(i64::from(*i)),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Long(i) => i32::try_from(*i).ok(),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Booleans are frequently stored as 0/1 integers, both forms are accepted.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            Self::Long(i) => Some(*i != 0),
            Self::Int(i) => Some(*i != 0),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            Self::Timestamp(ts) => Some(ts.date_time().date_naive()),
            Self::Text(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d").ok(),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<Utc> {
        match self {
            Self::Timestamp(ts) => Some(*ts),
            Self::Text(s) => s.parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Long(i) => write!(f, "{}", i),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Int(i) => write!(f, "{}", i),
            Self::Timestamp(ts) => write!(f, "{}", ts),
            Self::Float(fl) => write!(f, "{}", fl),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Long(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

impl From<Utc> for Value {
    fn from(ts: Utc) -> Self {
        Self::Timestamp(ts)
    }
}

impl From<DateTime<chrono::Utc>> for Value {
    fn from(moment: DateTime<chrono::Utc>) -> Self {
        Self::Timestamp(Utc::new(moment))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Self::Text(s.clone())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Null, Into::into)
    }
}
