pub mod error;
pub mod utc;
pub mod value;

pub use error::{DbError, Result, SessionError, SessionResult};
pub use utc::Utc;
pub use value::Value;
