//! Structural comparison of two table schemas.

use serde::{Deserialize, Serialize};

use crate::schema::{Column, ForeignKey, Index, TableSchema};

use super::reconcile::reconcile_by_name;
use super::Action;

/// Structural transition for one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDiff {
    /// Table name.
    pub table_name: String,
    /// Whole-table transition direction. `Add` and `Drop` are only produced
    /// by the orchestrator when the table exists in one snapshot; schema
    /// comparison itself only ever yields `Modify`.
    pub action: Action,
    /// The table's schema in the first snapshot (populated for Drop and
    /// Modify).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_schema: Option<TableSchema>,
    /// The table's schema in the second snapshot (populated for Add and
    /// Modify).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_schema: Option<TableSchema>,
    /// Column-level changes, sorted by column name.
    pub column_changes: Vec<ColumnChange>,
    /// Index-level changes, sorted by index name.
    pub index_changes: Vec<IndexChange>,
    /// Foreign-key-level changes, sorted by constraint name.
    pub foreign_key_changes: Vec<ForeignKeyChange>,
}

impl SchemaDiff {
    /// Builds a whole-table Add diff.
    #[must_use]
    pub fn added(schema: TableSchema) -> Self {
        Self {
            table_name: schema.name.clone(),
            action: Action::Add,
            old_schema: None,
            new_schema: Some(schema),
            column_changes: Vec::new(),
            index_changes: Vec::new(),
            foreign_key_changes: Vec::new(),
        }
    }

    /// Builds a whole-table Drop diff.
    #[must_use]
    pub fn dropped(schema: TableSchema) -> Self {
        Self {
            table_name: schema.name.clone(),
            action: Action::Drop,
            old_schema: Some(schema),
            new_schema: None,
            column_changes: Vec::new(),
            index_changes: Vec::new(),
            foreign_key_changes: Vec::new(),
        }
    }
}

/// A change to one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnChange {
    /// Column name.
    pub name: String,
    /// Transition direction.
    pub action: Action,
    /// Old definition (Drop, Modify).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old: Option<Column>,
    /// New definition (Add, Modify).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new: Option<Column>,
}

/// A change to one index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexChange {
    /// Index name.
    pub name: String,
    /// Transition direction.
    pub action: Action,
    /// Old definition (Drop, Modify).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old: Option<Index>,
    /// New definition (Add, Modify).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new: Option<Index>,
}

/// A change to one foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyChange {
    /// Constraint name.
    pub name: String,
    /// Transition direction.
    pub action: Action,
    /// Old definition (Drop, Modify).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old: Option<ForeignKey>,
    /// New definition (Add, Modify).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new: Option<ForeignKey>,
}

/// Compares two table schemas and returns their structural diff, or `None`
/// when the table is unchanged.
///
/// Columns, indexes and foreign keys are reconciled independently, each
/// keyed by name. The table-level action is always `Modify`; whole-table
/// Add/Drop is the orchestrator's decision.
#[must_use]
pub fn compare_schemas(old: &TableSchema, new: &TableSchema) -> Option<SchemaDiff> {
    let column_changes: Vec<ColumnChange> =
        reconcile_by_name(&old.columns, &new.columns, |c| &c.name, columns_equal)
            .into_iter()
            .map(|entry| ColumnChange {
                name: entry.name,
                action: entry.action,
                old: entry.old.cloned(),
                new: entry.new.cloned(),
            })
            .collect();

    let index_changes: Vec<IndexChange> =
        reconcile_by_name(&old.indexes, &new.indexes, |i| &i.name, indexes_equal)
            .into_iter()
            .map(|entry| IndexChange {
                name: entry.name,
                action: entry.action,
                old: entry.old.cloned(),
                new: entry.new.cloned(),
            })
            .collect();

    let foreign_key_changes: Vec<ForeignKeyChange> = reconcile_by_name(
        &old.foreign_keys,
        &new.foreign_keys,
        |fk| &fk.name,
        |a, b| a == b,
    )
    .into_iter()
    .map(|entry| ForeignKeyChange {
        name: entry.name,
        action: entry.action,
        old: entry.old.cloned(),
        new: entry.new.cloned(),
    })
    .collect();

    if column_changes.is_empty() && index_changes.is_empty() && foreign_key_changes.is_empty() {
        return None;
    }

    Some(SchemaDiff {
        table_name: new.name.clone(),
        action: Action::Modify,
        old_schema: Some(old.clone()),
        new_schema: Some(new.clone()),
        column_changes,
        index_changes,
        foreign_key_changes,
    })
}

/// Column equality for diffing: ordinal position is deliberately ignored so
/// a pure reordering of columns is not reported as a change.
fn columns_equal(a: &Column, b: &Column) -> bool {
    a.name == b.name
        && a.sql_type == b.sql_type
        && a.nullable == b.nullable
        && a.auto_increment == b.auto_increment
        && a.default_value == b.default_value
}

/// Index equality for diffing: the column list is order-sensitive; the kind
/// string is ignored since it is informational only.
fn indexes_equal(a: &Index, b: &Index) -> bool {
    a.name == b.name && a.unique == b.unique && a.primary == b.primary && a.columns == b.columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ReferentialAction;

    fn users_schema() -> TableSchema {
        TableSchema::new("users")
            .column(Column::new("id", "int").not_null().auto_increment())
            .column(Column::new("username", "varchar(50)").not_null())
            .column(Column::new("email", "varchar(100)"))
            .index(Index::new("PRIMARY", vec!["id".to_string()]).primary())
    }

    #[test]
    fn test_identical_schemas_yield_none() {
        let schema = users_schema();
        assert!(compare_schemas(&schema, &schema).is_none());
    }

    #[test]
    fn test_added_nullable_column() {
        // Scenario: snap2 gains a nullable phone column.
        let old = users_schema();
        let new = users_schema().column(Column::new("phone", "varchar(20)"));

        let diff = compare_schemas(&old, &new).unwrap();
        assert_eq!(diff.action, Action::Modify);
        assert_eq!(diff.column_changes.len(), 1);
        assert!(diff.index_changes.is_empty());
        assert!(diff.foreign_key_changes.is_empty());

        let change = &diff.column_changes[0];
        assert_eq!(change.name, "phone");
        assert_eq!(change.action, Action::Add);
        assert!(change.old.is_none());
        assert_eq!(change.new.as_ref().unwrap().sql_type, "varchar(20)");
    }

    #[test]
    fn test_type_change_is_modify() {
        let old = users_schema();
        let mut new = users_schema();
        new.columns[2].sql_type = "varchar(255)".to_string();

        let diff = compare_schemas(&old, &new).unwrap();
        assert_eq!(diff.column_changes.len(), 1);
        assert_eq!(diff.column_changes[0].name, "email");
        assert_eq!(diff.column_changes[0].action, Action::Modify);
        assert!(diff.column_changes[0].old.is_some());
        assert!(diff.column_changes[0].new.is_some());
    }

    #[test]
    fn test_absent_default_differs_from_empty_default() {
        let old = users_schema();
        let mut new = users_schema();
        new.columns[2].default_value = Some(String::new());

        let diff = compare_schemas(&old, &new).unwrap();
        assert_eq!(diff.column_changes.len(), 1);
        assert_eq!(diff.column_changes[0].action, Action::Modify);
    }

    #[test]
    fn test_column_reorder_is_not_a_change() {
        let old = users_schema();
        let mut new = users_schema();
        new.columns.swap(1, 2);
        new.columns[1].position = 2;
        new.columns[2].position = 3;
        assert!(compare_schemas(&old, &new).is_none());
    }

    #[test]
    fn test_index_column_order_matters() {
        let old = users_schema().index(Index::new(
            "idx_name_email",
            vec!["username".to_string(), "email".to_string()],
        ));
        let new = users_schema().index(Index::new(
            "idx_name_email",
            vec!["email".to_string(), "username".to_string()],
        ));

        let diff = compare_schemas(&old, &new).unwrap();
        assert_eq!(diff.index_changes.len(), 1);
        assert_eq!(diff.index_changes[0].action, Action::Modify);
    }

    #[test]
    fn test_foreign_key_action_change() {
        let old = users_schema().foreign_key(ForeignKey::new("fk_org", "org_id", "orgs", "id"));
        let new = users_schema().foreign_key(
            ForeignKey::new("fk_org", "org_id", "orgs", "id")
                .on_delete(ReferentialAction::Cascade),
        );

        let diff = compare_schemas(&old, &new).unwrap();
        assert_eq!(diff.foreign_key_changes.len(), 1);
        assert_eq!(diff.foreign_key_changes[0].action, Action::Modify);
    }

    #[test]
    fn test_dropped_index_reported() {
        let old = users_schema().index(Index::new("idx_email", vec!["email".to_string()]));
        let new = users_schema();

        let diff = compare_schemas(&old, &new).unwrap();
        assert_eq!(diff.index_changes.len(), 1);
        assert_eq!(diff.index_changes[0].name, "idx_email");
        assert_eq!(diff.index_changes[0].action, Action::Drop);
        assert!(diff.index_changes[0].old.is_some());
    }
}
