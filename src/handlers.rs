//! Ready-made processing functions for [`Session::select`](crate::Session::select)
//! and [`Session::insert`](crate::Session::insert).

use crate::core::{DbError, Result, Value};
use crate::interface::RowCursor;

/// Ignore the rows.
pub fn void(_rows: &mut dyn RowCursor) -> Result<()> {
    Ok(())
}

/// `true` if there is at least one row.
pub fn not_empty(rows: &mut dyn RowCursor) -> Result<bool> {
    rows.next()
}

/// First column of the first row. Fails when there are no rows.
pub fn single(rows: &mut dyn RowCursor) -> Result<Value> {
    if !rows.next()? {
        return Err(DbError::NoCurrentRow);
    }
    rows.get(1)
}

/// First column of every row.
pub fn column(rows: &mut dyn RowCursor) -> Result<Vec<Value>> {
    let mut values = Vec::new();
    while rows.next()? {
        values.push(rows.get(1)?);
    }
    Ok(values)
}

/// Keys reported by an insert, skipping NULLs.
pub fn outcome(rows: &mut dyn RowCursor) -> Result<Vec<i64>> {
    let mut keys = Vec::new();
    while rows.next()? {
        if let Some(key) = rows.get_long(1)? {
            keys.push(key);
        }
    }
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::MemoryRows;

    fn ids(values: &[i64]) -> MemoryRows {
        MemoryRows::new(
            vec!["id".into()],
            values.iter().map(|v| vec![Value::Long(*v)]).collect(),
        )
    }

    #[test]
    fn test_not_empty() {
        assert!(not_empty(&mut ids(&[1])).unwrap());
        assert!(!not_empty(&mut ids(&[])).unwrap());
    }

    #[test]
    fn test_single() {
        assert_eq!(single(&mut ids(&[5, 6])).unwrap(), Value::Long(5));
        assert!(matches!(single(&mut ids(&[])), Err(DbError::NoCurrentRow)));
    }

    #[test]
    fn test_column_and_outcome() {
        assert_eq!(
            column(&mut ids(&[1, 2])).unwrap(),
            vec![Value::Long(1), Value::Long(2)]
        );
        let mut keys = MemoryRows::new(
            vec!["id".into()],
            vec![vec![Value::Long(3)], vec![Value::Null]],
        );
        assert_eq!(outcome(&mut keys).unwrap(), vec![3]);
    }

    #[test]
    fn test_void_reads_nothing() {
        let mut rows = ids(&[1]);
        void(&mut rows).unwrap();
        assert!(rows.next().unwrap());
    }
}
