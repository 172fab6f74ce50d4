//! Schema representation types.
//!
//! These types describe the structure of a captured table: its columns,
//! indexes and foreign keys. Column type names are kept as the opaque,
//! dialect-native strings reported by the source database; the engine never
//! translates types.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::value::Row;

/// Foreign key referential action (ON DELETE, ON UPDATE).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ReferentialAction {
    /// No action (error if the referenced row is deleted/updated).
    #[default]
    NoAction,
    /// Restrict (same as NoAction but checked immediately).
    Restrict,
    /// Cascade the delete/update to referencing rows.
    Cascade,
    /// Set the foreign key column to NULL.
    SetNull,
    /// Set the foreign key column to its default value.
    SetDefault,
}

impl ReferentialAction {
    /// Returns the SQL representation of this action.
    #[must_use]
    pub fn to_sql(&self) -> &'static str {
        match self {
            Self::NoAction => "NO ACTION",
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
        }
    }

    /// Parses the rule strings reported by information_schema.
    #[must_use]
    pub fn parse(rule: &str) -> Option<Self> {
        match rule.trim().to_ascii_uppercase().as_str() {
            "NO ACTION" => Some(Self::NoAction),
            "RESTRICT" => Some(Self::Restrict),
            "CASCADE" => Some(Self::Cascade),
            "SET NULL" => Some(Self::SetNull),
            "SET DEFAULT" => Some(Self::SetDefault),
            _ => None,
        }
    }
}

/// A captured column definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name, unique within its table.
    pub name: String,
    /// Dialect-native type string (e.g. `varchar(255)`), passed through
    /// verbatim by the renderers.
    #[serde(rename = "type")]
    pub sql_type: String,
    /// Whether the column allows NULL values.
    pub nullable: bool,
    /// Default value literal as reported by the source. Absent default is
    /// distinct from an empty-string default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    /// Whether the column auto-increments.
    pub auto_increment: bool,
    /// Ordinal position in the table (1-based).
    pub position: u32,
}

impl Column {
    /// Creates a nullable column with the given name and type string.
    #[must_use]
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            nullable: true,
            default_value: None,
            auto_increment: false,
            position: 0,
        }
    }

    /// Marks the column NOT NULL.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Sets the default value literal.
    #[must_use]
    pub fn default_value(mut self, literal: impl Into<String>) -> Self {
        self.default_value = Some(literal.into());
        self
    }

    /// Marks the column auto-incrementing.
    #[must_use]
    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Sets the ordinal position.
    #[must_use]
    pub fn position(mut self, position: u32) -> Self {
        self.position = position;
        self
    }
}

/// A captured index definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    /// Index name, unique within its table.
    pub name: String,
    /// Member columns, in index order.
    pub columns: Vec<String>,
    /// Whether this is a unique index.
    pub unique: bool,
    /// Whether this index is the primary key. At most one per table; it
    /// defines row identity for data comparison.
    pub primary: bool,
    /// Index kind as reported by the source (e.g. BTREE, HASH). Opaque.
    pub kind: String,
}

impl Index {
    /// Creates a non-unique BTREE index.
    #[must_use]
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            unique: false,
            primary: false,
            kind: "BTREE".to_string(),
        }
    }

    /// Marks the index unique.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Marks the index as the primary key (implies unique).
    #[must_use]
    pub fn primary(mut self) -> Self {
        self.primary = true;
        self.unique = true;
        self
    }

    /// Sets the index kind string.
    #[must_use]
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }
}

/// A captured foreign key constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Constraint name, unique within its table.
    pub name: String,
    /// Referencing column in the local table.
    pub column: String,
    /// Referenced table name.
    pub referenced_table: String,
    /// Referenced column name.
    pub referenced_column: String,
    /// ON DELETE action; `None` when the source reported no rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<ReferentialAction>,
    /// ON UPDATE action; `None` when the source reported no rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_update: Option<ReferentialAction>,
}

impl ForeignKey {
    /// Creates a foreign key with no referential actions.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        column: impl Into<String>,
        referenced_table: impl Into<String>,
        referenced_column: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            column: column.into(),
            referenced_table: referenced_table.into(),
            referenced_column: referenced_column.into(),
            on_delete: None,
            on_update: None,
        }
    }

    /// Sets the ON DELETE action.
    #[must_use]
    pub fn on_delete(mut self, action: ReferentialAction) -> Self {
        self.on_delete = Some(action);
        self
    }

    /// Sets the ON UPDATE action.
    #[must_use]
    pub fn on_update(mut self, action: ReferentialAction) -> Self {
        self.on_update = Some(action);
        self
    }
}

/// Complete captured schema for one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Table name.
    pub name: String,
    /// Column definitions, in ordinal order.
    pub columns: Vec<Column>,
    /// Index definitions (unordered set).
    pub indexes: Vec<Index>,
    /// Foreign key definitions (unordered set).
    pub foreign_keys: Vec<ForeignKey>,
}

impl TableSchema {
    /// Creates an empty table schema.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    /// Adds a column, assigning its ordinal position if unset.
    #[must_use]
    pub fn column(mut self, mut column: Column) -> Self {
        if column.position == 0 {
            column.position = u32::try_from(self.columns.len()).unwrap_or(u32::MAX) + 1;
        }
        self.columns.push(column);
        self
    }

    /// Adds an index.
    #[must_use]
    pub fn index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    /// Adds a foreign key.
    #[must_use]
    pub fn foreign_key(mut self, fk: ForeignKey) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    /// Returns the primary index, if the table has one.
    #[must_use]
    pub fn primary_index(&self) -> Option<&Index> {
        self.indexes.iter().find(|idx| idx.primary)
    }

    /// Returns the primary key column names, empty when there is no
    /// primary index.
    #[must_use]
    pub fn primary_key_columns(&self) -> &[String] {
        self.primary_index()
            .map_or(&[], |idx| idx.columns.as_slice())
    }

    /// Gets a column by name.
    #[must_use]
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Checks the structural invariants: unique column, index and foreign
    /// key names, and at most one primary index.
    pub fn validate(&self) -> Result<()> {
        let mut seen = BTreeSet::new();
        for column in &self.columns {
            if !seen.insert(column.name.as_str()) {
                return Err(CoreError::DuplicateColumn {
                    table: self.name.clone(),
                    column: column.name.clone(),
                });
            }
        }

        let mut seen = BTreeSet::new();
        for index in &self.indexes {
            if !seen.insert(index.name.as_str()) {
                return Err(CoreError::DuplicateIndex {
                    table: self.name.clone(),
                    index: index.name.clone(),
                });
            }
        }

        let mut seen = BTreeSet::new();
        for fk in &self.foreign_keys {
            if !seen.insert(fk.name.as_str()) {
                return Err(CoreError::DuplicateForeignKey {
                    table: self.name.clone(),
                    name: fk.name.clone(),
                });
            }
        }

        if self.indexes.iter().filter(|idx| idx.primary).count() > 1 {
            return Err(CoreError::MultiplePrimaryIndexes {
                table: self.name.clone(),
            });
        }

        Ok(())
    }
}

/// A table together with its captured rows.
///
/// Row order is the insertion order from the source and carries no meaning
/// for diffing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// The table's schema.
    pub schema: TableSchema,
    /// Captured rows.
    pub rows: Vec<Row>,
}

impl Table {
    /// Creates a table with no rows.
    #[must_use]
    pub fn new(schema: TableSchema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

    /// Adds a row.
    #[must_use]
    pub fn row(mut self, row: Row) -> Self {
        self.rows.push(row);
        self
    }
}

/// A point-in-time capture of a database: free-form metadata plus every
/// captured table, keyed by name.
///
/// Immutable once created; the sorted map makes every traversal of the
/// snapshot deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Free-form metadata (creation timestamp, source database type, ...).
    pub metadata: BTreeMap<String, String>,
    /// Captured tables by name.
    pub tables: BTreeMap<String, Table>,
}

impl Snapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a metadata entry.
    #[must_use]
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Adds a table, keyed by its schema name.
    #[must_use]
    pub fn table(mut self, table: Table) -> Self {
        self.tables.insert(table.schema.name.clone(), table);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_builder() {
        let col = Column::new("id", "bigint").not_null().auto_increment();
        assert_eq!(col.name, "id");
        assert_eq!(col.sql_type, "bigint");
        assert!(!col.nullable);
        assert!(col.auto_increment);
        assert!(col.default_value.is_none());
    }

    #[test]
    fn test_table_assigns_positions() {
        let table = TableSchema::new("users")
            .column(Column::new("id", "int"))
            .column(Column::new("name", "text"));
        assert_eq!(table.columns[0].position, 1);
        assert_eq!(table.columns[1].position, 2);
    }

    #[test]
    fn test_primary_key_columns() {
        let table = TableSchema::new("users")
            .column(Column::new("id", "int"))
            .index(Index::new("PRIMARY", vec!["id".to_string()]).primary());
        assert_eq!(table.primary_key_columns(), ["id".to_string()]);

        let no_pk = TableSchema::new("log").column(Column::new("msg", "text"));
        assert!(no_pk.primary_key_columns().is_empty());
    }

    #[test]
    fn test_validate_rejects_duplicate_column() {
        let table = TableSchema::new("users")
            .column(Column::new("id", "int"))
            .column(Column::new("id", "bigint"));
        assert!(matches!(
            table.validate(),
            Err(CoreError::DuplicateColumn { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_two_primary_indexes() {
        let table = TableSchema::new("users")
            .column(Column::new("id", "int"))
            .index(Index::new("PRIMARY", vec!["id".to_string()]).primary())
            .index(Index::new("pk2", vec!["id".to_string()]).primary());
        assert!(matches!(
            table.validate(),
            Err(CoreError::MultiplePrimaryIndexes { .. })
        ));
    }

    #[test]
    fn test_referential_action_parse() {
        assert_eq!(
            ReferentialAction::parse("CASCADE"),
            Some(ReferentialAction::Cascade)
        );
        assert_eq!(
            ReferentialAction::parse("set null"),
            Some(ReferentialAction::SetNull)
        );
        assert_eq!(ReferentialAction::parse(""), None);
    }

    #[test]
    fn test_schema_json_round_trip() {
        let table = TableSchema::new("users")
            .column(Column::new("id", "int").not_null())
            .column(Column::new("email", "varchar(255)").default_value("''"))
            .index(Index::new("PRIMARY", vec!["id".to_string()]).primary())
            .foreign_key(
                ForeignKey::new("fk_org", "org_id", "orgs", "id")
                    .on_delete(ReferentialAction::Cascade),
            );

        let json = serde_json::to_string(&table).unwrap();
        let back: TableSchema = serde_json::from_str(&json).unwrap();
        assert_eq!(table, back);
    }
}
