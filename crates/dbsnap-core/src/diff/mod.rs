//! Snapshot comparison.
//!
//! The orchestrator unions the table names of both snapshots, classifies
//! whole-table adds and drops, and delegates per-table structural and
//! row-level comparison. All maps are sorted so two runs over the same
//! inputs produce identical results.

mod data_diff;
mod reconcile;
mod schema_diff;

pub use data_diff::{compare_data, DataDiff, RowModification};
pub use schema_diff::{
    compare_schemas, ColumnChange, ForeignKeyChange, IndexChange, SchemaDiff,
};

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::schema::Snapshot;

/// Transition direction from the first snapshot to the second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    /// Present only in the second snapshot.
    Add,
    /// Present only in the first snapshot.
    Drop,
    /// Present in both with differences.
    Modify,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Add => "ADD",
            Self::Drop => "DROP",
            Self::Modify => "MODIFY",
        };
        f.write_str(text)
    }
}

/// The complete comparison result for two snapshots.
///
/// A table absent from both maps is unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiffResult {
    /// Structural diffs by table name.
    pub schema_diffs: BTreeMap<String, SchemaDiff>,
    /// Row-level diffs by table name.
    pub data_diffs: BTreeMap<String, DataDiff>,
}

impl DiffResult {
    /// Returns true when the two snapshots were identical.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schema_diffs.is_empty() && self.data_diffs.is_empty()
    }

    /// Renders a human-readable report of the differences.
    #[must_use]
    pub fn render_summary(&self) -> String {
        let mut out = String::new();

        if self.is_empty() {
            out.push_str("No differences found.\n");
            return out;
        }

        if !self.schema_diffs.is_empty() {
            out.push_str("=== Schema Differences ===\n\n");
            for (table_name, diff) in &self.schema_diffs {
                let _ = writeln!(out, "Table: {table_name}");
                match diff.action {
                    Action::Add => {
                        let columns = diff
                            .new_schema
                            .as_ref()
                            .map_or(0, |schema| schema.columns.len());
                        out.push_str("  Action: ADD (new table)\n");
                        let _ = writeln!(out, "  Columns: {columns}");
                    }
                    Action::Drop => {
                        out.push_str("  Action: DROP (removed table)\n");
                    }
                    Action::Modify => {
                        out.push_str("  Action: MODIFY\n");
                        if !diff.column_changes.is_empty() {
                            out.push_str("  Column changes:\n");
                            for change in &diff.column_changes {
                                let _ =
                                    writeln!(out, "    - {}: {}", change.name, change.action);
                            }
                        }
                        if !diff.index_changes.is_empty() {
                            out.push_str("  Index changes:\n");
                            for change in &diff.index_changes {
                                let _ =
                                    writeln!(out, "    - {}: {}", change.name, change.action);
                            }
                        }
                        if !diff.foreign_key_changes.is_empty() {
                            out.push_str("  Foreign key changes:\n");
                            for change in &diff.foreign_key_changes {
                                let _ =
                                    writeln!(out, "    - {}: {}", change.name, change.action);
                            }
                        }
                    }
                }
                out.push('\n');
            }
        }

        if !self.data_diffs.is_empty() {
            out.push_str("=== Data Differences ===\n\n");
            for (table_name, diff) in &self.data_diffs {
                let _ = writeln!(out, "Table: {table_name}");
                let _ = writeln!(out, "  Rows added: {}", diff.rows_added.len());
                let _ = writeln!(out, "  Rows deleted: {}", diff.rows_deleted.len());
                let _ = writeln!(out, "  Rows modified: {}", diff.rows_modified.len());
                out.push('\n');
            }
        }

        out
    }
}

/// Compares two snapshots.
///
/// Tables present in only one snapshot become whole-table Add or Drop
/// entries; no data diff is recorded for them since their rows are implied
/// by the table transition itself. Tables present in both are compared
/// structurally and row-by-row. Every table schema is validated up front;
/// a malformed snapshot fails the whole comparison rather than producing a
/// partial result.
pub fn compare(snap1: &Snapshot, snap2: &Snapshot) -> Result<DiffResult> {
    for table in snap1.tables.values().chain(snap2.tables.values()) {
        table.schema.validate()?;
    }

    let table_names: BTreeSet<&String> =
        snap1.tables.keys().chain(snap2.tables.keys()).collect();

    let mut result = DiffResult::default();
    for table_name in table_names {
        match (snap1.tables.get(table_name), snap2.tables.get(table_name)) {
            (None, Some(table)) => {
                result.schema_diffs.insert(
                    table_name.clone(),
                    SchemaDiff::added(table.schema.clone()),
                );
            }
            (Some(table), None) => {
                result.schema_diffs.insert(
                    table_name.clone(),
                    SchemaDiff::dropped(table.schema.clone()),
                );
            }
            (Some(table1), Some(table2)) => {
                if let Some(diff) = compare_schemas(&table1.schema, &table2.schema) {
                    result.schema_diffs.insert(table_name.clone(), diff);
                }
                if let Some(diff) =
                    compare_data(table_name, &table1.rows, &table2.rows, &table2.schema)?
                {
                    result.data_diffs.insert(table_name.clone(), diff);
                }
            }
            (None, None) => unreachable!("name came from one of the two snapshots"),
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::schema::{Column, Index, Table, TableSchema};
    use crate::value::{Row, SqlValue};

    fn users_table() -> Table {
        let schema = TableSchema::new("users")
            .column(Column::new("id", "int").not_null())
            .column(Column::new("username", "varchar(50)"))
            .index(Index::new("PRIMARY", vec!["id".to_string()]).primary());
        Table::new(schema).row(
            [
                ("id".to_string(), SqlValue::from(1_i64)),
                ("username".to_string(), SqlValue::from("alice")),
            ]
            .into_iter()
            .collect::<Row>(),
        )
    }

    fn tags_table() -> Table {
        Table::new(
            TableSchema::new("tags")
                .column(Column::new("id", "int").not_null())
                .column(Column::new("label", "varchar(30)"))
                .index(Index::new("PRIMARY", vec!["id".to_string()]).primary()),
        )
    }

    #[test]
    fn test_compare_snapshot_with_itself_is_empty() {
        let snap = Snapshot::new().table(users_table()).table(tags_table());
        let result = compare(&snap, &snap).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_new_table_is_whole_table_add() {
        // Scenario: a brand-new tags table exists only in snap2.
        let snap1 = Snapshot::new().table(users_table());
        let snap2 = Snapshot::new().table(users_table()).table(tags_table());

        let result = compare(&snap1, &snap2).unwrap();
        assert_eq!(result.schema_diffs.len(), 1);
        assert!(result.data_diffs.is_empty());

        let diff = &result.schema_diffs["tags"];
        assert_eq!(diff.action, Action::Add);
        assert!(diff.new_schema.is_some());
        assert!(diff.old_schema.is_none());
    }

    #[test]
    fn test_removed_table_is_whole_table_drop() {
        let snap1 = Snapshot::new().table(users_table()).table(tags_table());
        let snap2 = Snapshot::new().table(users_table());

        let result = compare(&snap1, &snap2).unwrap();
        let diff = &result.schema_diffs["tags"];
        assert_eq!(diff.action, Action::Drop);
        assert!(diff.old_schema.is_some());
        assert!(diff.new_schema.is_none());
        assert!(!result.data_diffs.contains_key("tags"));
    }

    #[test]
    fn test_data_change_recorded_per_table() {
        let snap1 = Snapshot::new().table(users_table());
        let mut changed = users_table();
        changed.rows[0].insert("username".to_string(), SqlValue::from("alicia"));
        let snap2 = Snapshot::new().table(changed);

        let result = compare(&snap1, &snap2).unwrap();
        assert!(result.schema_diffs.is_empty());
        assert_eq!(result.data_diffs["users"].rows_modified.len(), 1);
    }

    #[test]
    fn test_malformed_schema_fails_whole_comparison() {
        let bad = Table::new(
            TableSchema::new("bad")
                .column(Column::new("x", "int"))
                .column(Column::new("x", "text")),
        );
        let snap1 = Snapshot::new().table(bad);
        let snap2 = Snapshot::new();

        let result = compare(&snap1, &snap2);
        assert!(matches!(result, Err(CoreError::DuplicateColumn { .. })));
    }

    #[test]
    fn test_summary_lists_tables_and_counts() {
        let snap1 = Snapshot::new().table(users_table());
        let mut changed = users_table();
        changed.rows[0].insert("username".to_string(), SqlValue::from("alicia"));
        let snap2 = Snapshot::new().table(changed).table(tags_table());

        let summary = compare(&snap1, &snap2).unwrap().render_summary();
        assert!(summary.contains("=== Schema Differences ==="));
        assert!(summary.contains("Table: tags"));
        assert!(summary.contains("ADD (new table)"));
        assert!(summary.contains("=== Data Differences ==="));
        assert!(summary.contains("Rows modified: 1"));
    }

    #[test]
    fn test_empty_summary() {
        let snap = Snapshot::new();
        let summary = compare(&snap, &snap).unwrap().render_summary();
        assert_eq!(summary, "No differences found.\n");
    }
}
