//! Row-level comparison of two captured row sets.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::schema::TableSchema;
use crate::value::Row;

/// Row-level transition for one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataDiff {
    /// Table name.
    pub table_name: String,
    /// Rows present only in the second snapshot, sorted by key.
    pub rows_added: Vec<Row>,
    /// Rows present only in the first snapshot, sorted by key.
    pub rows_deleted: Vec<Row>,
    /// Rows present in both but with differing content, sorted by key.
    pub rows_modified: Vec<RowModification>,
}

/// A modified row: both full captures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowModification {
    /// The row as captured in the first snapshot.
    pub old_row: Row,
    /// The row as captured in the second snapshot.
    pub new_row: Row,
}

// Separators for composite key encoding; control characters cannot occur in
// canonical value text without being intentional.
const KEY_SEPARATOR: char = '\u{1f}';
const NULL_MARKER: &str = "\u{0}";

/// Compares two row sets and returns their diff, or `None` when the data is
/// unchanged.
///
/// Row identity is the tuple of primary key values, read from the schema's
/// primary index. Without a primary index identity cannot be established:
/// if the row counts differ the whole old set is reported deleted and the
/// whole new set added; if the counts are equal no diff is reported. That
/// equal-count case is a documented precision loss, not an error.
pub fn compare_data(
    table_name: &str,
    old_rows: &[Row],
    new_rows: &[Row],
    schema: &TableSchema,
) -> Result<Option<DataDiff>> {
    let pk_columns = schema.primary_key_columns();
    if pk_columns.is_empty() {
        if old_rows.len() == new_rows.len() {
            return Ok(None);
        }
        return Ok(Some(DataDiff {
            table_name: table_name.to_string(),
            rows_added: new_rows.to_vec(),
            rows_deleted: old_rows.to_vec(),
            rows_modified: Vec::new(),
        }));
    }

    let old_by_key = index_by_key(table_name, old_rows, pk_columns)?;
    let new_by_key = index_by_key(table_name, new_rows, pk_columns)?;

    let mut added = Vec::new();
    let mut modified = Vec::new();
    for (key, new_row) in &new_by_key {
        match old_by_key.get(key) {
            None => added.push((*new_row).clone()),
            Some(old_row) => {
                if !rows_equal(old_row, new_row) {
                    modified.push(RowModification {
                        old_row: (*old_row).clone(),
                        new_row: (*new_row).clone(),
                    });
                }
            }
        }
    }

    let mut deleted = Vec::new();
    for (key, old_row) in &old_by_key {
        if !new_by_key.contains_key(key) {
            deleted.push((*old_row).clone());
        }
    }

    if added.is_empty() && deleted.is_empty() && modified.is_empty() {
        return Ok(None);
    }

    Ok(Some(DataDiff {
        table_name: table_name.to_string(),
        rows_added: added,
        rows_deleted: deleted,
        rows_modified: modified,
    }))
}

/// Maps each row by its composite primary key. The sorted map makes the
/// emitted row order deterministic.
fn index_by_key<'a>(
    table_name: &str,
    rows: &'a [Row],
    pk_columns: &[String],
) -> Result<BTreeMap<String, &'a Row>> {
    let mut by_key = BTreeMap::new();
    for row in rows {
        by_key.insert(row_key(table_name, row, pk_columns)?, row);
    }
    Ok(by_key)
}

/// Encodes the primary key values of a row as a single comparable string.
///
/// Canonical value text is used so the same logical key matches across the
/// two captures even when the underlying representations differ.
fn row_key(table_name: &str, row: &Row, pk_columns: &[String]) -> Result<String> {
    let mut parts = Vec::with_capacity(pk_columns.len());
    for column in pk_columns {
        let value = row
            .get(column)
            .ok_or_else(|| CoreError::MissingPrimaryKeyValue {
                table: table_name.to_string(),
                column: column.clone(),
            })?;
        parts.push(value.canonical_text().unwrap_or_else(|| NULL_MARKER.to_string()));
    }
    Ok(parts.join(&KEY_SEPARATOR.to_string()))
}

/// Compares two rows over the union of their column keys.
///
/// A column present in only one row counts as a difference, as does
/// null-vs-non-null; values themselves compare canonically.
fn rows_equal(a: &Row, b: &Row) -> bool {
    let columns: BTreeSet<&String> = a.keys().chain(b.keys()).collect();
    for column in columns {
        match (a.get(column), b.get(column)) {
            (Some(va), Some(vb)) => {
                if !va.canonically_eq(vb) {
                    return false;
                }
            }
            _ => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Column, Index};
    use crate::value::SqlValue;

    fn users_schema() -> TableSchema {
        TableSchema::new("users")
            .column(Column::new("id", "int").not_null())
            .column(Column::new("username", "varchar(50)"))
            .column(Column::new("email", "varchar(100)"))
            .column(Column::new("age", "int"))
            .index(Index::new("PRIMARY", vec!["id".to_string()]).primary())
    }

    fn row(pairs: &[(&str, SqlValue)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    fn alice(email: &str, age: i64) -> Row {
        row(&[
            ("id", SqlValue::from(1_i64)),
            ("username", SqlValue::from("alice")),
            ("email", SqlValue::from(email)),
            ("age", SqlValue::from(age)),
        ])
    }

    fn charlie() -> Row {
        row(&[
            ("id", SqlValue::from(3_i64)),
            ("username", SqlValue::from("charlie")),
            ("email", SqlValue::from("charlie@x.com")),
            ("age", SqlValue::from(31_i64)),
        ])
    }

    #[test]
    fn test_identical_rows_yield_none() {
        let rows = vec![alice("alice@x.com", 25), charlie()];
        let diff = compare_data("users", &rows, &rows, &users_schema()).unwrap();
        assert!(diff.is_none());
    }

    #[test]
    fn test_delete_and_modify_keyed_by_id() {
        // Scenario: charlie disappears, alice's email and age change.
        let old = vec![alice("alice@x.com", 25), charlie()];
        let new = vec![alice("alice@new.com", 26)];

        let diff = compare_data("users", &old, &new, &users_schema())
            .unwrap()
            .unwrap();
        assert!(diff.rows_added.is_empty());
        assert_eq!(diff.rows_deleted.len(), 1);
        assert_eq!(
            diff.rows_deleted[0].get("id"),
            Some(&SqlValue::from(3_i64))
        );
        assert_eq!(diff.rows_modified.len(), 1);
        let modification = &diff.rows_modified[0];
        assert_eq!(
            modification.old_row.get("email"),
            Some(&SqlValue::from("alice@x.com"))
        );
        assert_eq!(
            modification.new_row.get("email"),
            Some(&SqlValue::from("alice@new.com"))
        );
    }

    #[test]
    fn test_added_row() {
        let old = vec![alice("alice@x.com", 25)];
        let new = vec![alice("alice@x.com", 25), charlie()];

        let diff = compare_data("users", &old, &new, &users_schema())
            .unwrap()
            .unwrap();
        assert_eq!(diff.rows_added.len(), 1);
        assert!(diff.rows_deleted.is_empty());
        assert!(diff.rows_modified.is_empty());
    }

    #[test]
    fn test_key_matches_across_representations() {
        // The same logical key can arrive as an integer in one capture and
        // a driver-provided string in the other.
        let old = vec![row(&[
            ("id", SqlValue::from(1_i64)),
            ("username", SqlValue::from("alice")),
        ])];
        let new = vec![row(&[
            ("id", SqlValue::from("1")),
            ("username", SqlValue::from("alice")),
        ])];

        let diff = compare_data("users", &old, &new, &users_schema()).unwrap();
        assert!(diff.is_none());
    }

    #[test]
    fn test_null_vs_value_is_modification() {
        let old = vec![row(&[
            ("id", SqlValue::from(1_i64)),
            ("email", SqlValue::Null),
        ])];
        let new = vec![row(&[
            ("id", SqlValue::from(1_i64)),
            ("email", SqlValue::from("alice@x.com")),
        ])];

        let diff = compare_data("users", &old, &new, &users_schema())
            .unwrap()
            .unwrap();
        assert_eq!(diff.rows_modified.len(), 1);
    }

    #[test]
    fn test_no_primary_key_equal_counts_reports_nothing() {
        // Scenario: without a primary index and with equal row counts the
        // comparison cannot establish identity; differing content goes
        // unreported. Documented precision loss.
        let schema = TableSchema::new("log").column(Column::new("msg", "text"));
        let old = vec![row(&[("msg", SqlValue::from("a"))]); 3];
        let new = vec![row(&[("msg", SqlValue::from("b"))]); 3];

        let diff = compare_data("log", &old, &new, &schema).unwrap();
        assert!(diff.is_none());
    }

    #[test]
    fn test_no_primary_key_unequal_counts_replaces_everything() {
        let schema = TableSchema::new("log").column(Column::new("msg", "text"));
        let old = vec![row(&[("msg", SqlValue::from("a"))]); 2];
        let new = vec![row(&[("msg", SqlValue::from("a"))]); 3];

        let diff = compare_data("log", &old, &new, &schema).unwrap().unwrap();
        assert_eq!(diff.rows_deleted.len(), 2);
        assert_eq!(diff.rows_added.len(), 3);
        assert!(diff.rows_modified.is_empty());
    }

    #[test]
    fn test_missing_primary_key_value_fails_fast() {
        let old = vec![row(&[("username", SqlValue::from("ghost"))])];
        let result = compare_data("users", &old, &[], &users_schema());
        assert!(matches!(
            result,
            Err(CoreError::MissingPrimaryKeyValue { .. })
        ));
    }

    #[test]
    fn test_extra_column_in_one_row_is_modification() {
        let old = vec![row(&[("id", SqlValue::from(1_i64))])];
        let new = vec![row(&[
            ("id", SqlValue::from(1_i64)),
            ("nickname", SqlValue::from("al")),
        ])];

        let diff = compare_data("users", &old, &new, &users_schema())
            .unwrap()
            .unwrap();
        assert_eq!(diff.rows_modified.len(), 1);
    }
}
