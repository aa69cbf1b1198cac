//! Maps argument values onto typed statement setters.
//!
//! Rules are tried in order and the first one that accepts the value wins.
//! A value no rule accepts is bound as text through its `Display` form.
//! To recognize a new kind, add a rule before the textual fallback.

use crate::core::{Result, Value};
use crate::interface::Statement;

/// Binds `value` at `pos` if it is of the rule's kind, `None` otherwise.
type Rule<S> = fn(&mut S, usize, &Value) -> Option<Result<()>>;

fn rules<S: Statement + ?Sized>() -> [(&'static str, Rule<S>); 6] {
    [
        ("null", bind_null),
        ("long", bind_long),
        ("boolean", bind_boolean),
        ("date", bind_date),
        ("int", bind_int),
        ("timestamp", bind_timestamp),
    ]
}

fn bind_null<S: Statement + ?Sized>(stmt: &mut S, pos: usize, value: &Value) -> Option<Result<()>> {
    value.is_null().then(|| stmt.set_null(pos))
}

fn bind_long<S: Statement + ?Sized>(stmt: &mut S, pos: usize, value: &Value) -> Option<Result<()>> {
    match value {
        Value::Long(i) => Some(stmt.set_long(pos, *i)),
        _ => None,
    }
}

fn bind_boolean<S: Statement + ?Sized>(stmt: &mut S, pos: usize, value: &Value) -> Option<Result<()>> {
    match value {
        Value::Boolean(b) => Some(stmt.set_boolean(pos, *b)),
        _ => None,
    }
}

fn bind_date<S: Statement + ?Sized>(stmt: &mut S, pos: usize, value: &Value) -> Option<Result<()>> {
    match value {
        Value::Date(d) => Some(stmt.set_date(pos, *d)),
        _ => None,
    }
}

fn bind_int<S: Statement + ?Sized>(stmt: &mut S, pos: usize, value: &Value) -> Option<Result<()>> {
    match value {
        Value::Int(i) => Some(stmt.set_int(pos, *i)),
        _ => None,
    }
}

fn bind_timestamp<S: Statement + ?Sized>(stmt: &mut S, pos: usize, value: &Value) -> Option<Result<()>> {
    match value {
        Value::Timestamp(ts) => Some(ts.bind(stmt, pos)),
        _ => None,
    }
}

/// Bind one value at `pos` (1-indexed).
pub fn bind<S: Statement + ?Sized>(stmt: &mut S, pos: usize, value: &Value) -> Result<()> {
    for (_, rule) in rules::<S>() {
        if let Some(bound) = rule(stmt, pos, value) {
            return bound;
        }
    }
    stmt.set_string(pos, &value.to_string())
}

/// Bind `args` in order, the first one at position 1.
pub fn bind_all<S: Statement + ?Sized>(stmt: &mut S, args: &[Value]) -> Result<()> {
    for (idx, arg) in args.iter().enumerate() {
        bind(stmt, idx + 1, arg)?;
    }
    Ok(())
}
