//! DDL rendering: one table's structural diff to an ordered statement
//! sequence.

use crate::diff::{Action, SchemaDiff};
use crate::dialect::SqlDialect;
use crate::schema::{ForeignKey, Index, TableSchema};

/// Renders schema diffs into DDL statements for one dialect.
pub struct DdlRenderer<'a> {
    dialect: &'a dyn SqlDialect,
}

impl<'a> DdlRenderer<'a> {
    /// Creates a renderer bound to a dialect.
    #[must_use]
    pub fn new(dialect: &'a dyn SqlDialect) -> Self {
        Self { dialect }
    }

    /// Renders the statements for one table's structural diff, without
    /// trailing semicolons.
    ///
    /// For a modified table the sequence respects dependency constraints:
    /// foreign keys are dropped before the indexes and columns they depend
    /// on, and recreated only after the new columns and indexes exist. The
    /// primary-key index is never dropped or created through generic index
    /// DDL; it lives inside CREATE TABLE.
    #[must_use]
    pub fn render(&self, diff: &SchemaDiff) -> Vec<String> {
        match diff.action {
            Action::Add => {
                let Some(schema) = &diff.new_schema else {
                    return Vec::new();
                };
                vec![self.create_table(schema)]
            }
            Action::Drop => {
                vec![format!(
                    "DROP TABLE {}",
                    self.dialect.quote_identifier(&diff.table_name)
                )]
            }
            Action::Modify => self.render_modify(diff),
        }
    }

    fn render_modify(&self, diff: &SchemaDiff) -> Vec<String> {
        let table = &diff.table_name;
        let mut statements = Vec::new();

        // 1. Drop foreign keys being dropped or redefined.
        for change in &diff.foreign_key_changes {
            if matches!(change.action, Action::Drop | Action::Modify) {
                if let Some(old) = &change.old {
                    statements.push(self.dialect.drop_foreign_key_sql(table, &old.name));
                }
            }
        }

        // 2. Drop indexes being dropped or redefined, except the primary key.
        for change in &diff.index_changes {
            if matches!(change.action, Action::Drop | Action::Modify) {
                if let Some(old) = &change.old {
                    if !old.primary {
                        statements.push(self.dialect.drop_index_sql(table, &old.name));
                    }
                }
            }
        }

        // 3. Column changes.
        for change in &diff.column_changes {
            match change.action {
                Action::Add => {
                    if let Some(new) = &change.new {
                        statements.push(format!(
                            "ALTER TABLE {} ADD COLUMN {}",
                            self.dialect.quote_identifier(table),
                            self.dialect.column_definition(new)
                        ));
                    }
                }
                Action::Drop => {
                    statements.push(format!(
                        "ALTER TABLE {} DROP COLUMN {}",
                        self.dialect.quote_identifier(table),
                        self.dialect.quote_identifier(&change.name)
                    ));
                }
                Action::Modify => {
                    if let Some(new) = &change.new {
                        statements.push(self.dialect.modify_column_sql(table, new));
                    }
                }
            }
        }

        // 4. Create indexes being added or redefined, except the primary key.
        for change in &diff.index_changes {
            if matches!(change.action, Action::Add | Action::Modify) {
                if let Some(new) = &change.new {
                    if !new.primary {
                        statements.push(self.create_index(table, new));
                    }
                }
            }
        }

        // 5. Add foreign keys being added or redefined.
        for change in &diff.foreign_key_changes {
            if matches!(change.action, Action::Add | Action::Modify) {
                if let Some(new) = &change.new {
                    statements.push(format!(
                        "ALTER TABLE {} ADD {}",
                        self.dialect.quote_identifier(table),
                        self.foreign_key_clause(new)
                    ));
                }
            }
        }

        statements
    }

    fn create_table(&self, schema: &TableSchema) -> String {
        let mut parts: Vec<String> = schema
            .columns
            .iter()
            .map(|column| self.dialect.column_definition(column))
            .collect();

        if let Some(primary) = schema.primary_index() {
            parts.push(format!(
                "PRIMARY KEY ({})",
                self.dialect.quote_identifiers(&primary.columns)
            ));
        }

        for fk in &schema.foreign_keys {
            parts.push(self.foreign_key_clause(fk));
        }

        format!(
            "CREATE TABLE {} (\n  {}\n)",
            self.dialect.quote_identifier(&schema.name),
            parts.join(",\n  ")
        )
    }

    fn create_index(&self, table: &str, index: &Index) -> String {
        let unique = if index.unique { "UNIQUE " } else { "" };
        format!(
            "CREATE {}INDEX {} ON {} ({})",
            unique,
            self.dialect.quote_identifier(&index.name),
            self.dialect.quote_identifier(table),
            self.dialect.quote_identifiers(&index.columns)
        )
    }

    fn foreign_key_clause(&self, fk: &ForeignKey) -> String {
        let mut clause = format!(
            "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {}({})",
            self.dialect.quote_identifier(&fk.name),
            self.dialect.quote_identifier(&fk.column),
            self.dialect.quote_identifier(&fk.referenced_table),
            self.dialect.quote_identifier(&fk.referenced_column)
        );
        if let Some(action) = fk.on_delete {
            clause.push_str(" ON DELETE ");
            clause.push_str(action.to_sql());
        }
        if let Some(action) = fk.on_update {
            clause.push_str(" ON UPDATE ");
            clause.push_str(action.to_sql());
        }
        clause
    }
}
