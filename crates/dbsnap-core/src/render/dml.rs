//! DML rendering: one table's row diff to DELETE, INSERT and UPDATE
//! statements.

use crate::diff::DataDiff;
use crate::dialect::SqlDialect;
use crate::value::{Row, SqlValue};

/// Renders data diffs into DML statements for one dialect.
pub struct DmlRenderer<'a> {
    dialect: &'a dyn SqlDialect,
}

impl<'a> DmlRenderer<'a> {
    /// Creates a renderer bound to a dialect.
    #[must_use]
    pub fn new(dialect: &'a dyn SqlDialect) -> Self {
        Self { dialect }
    }

    /// Renders the statements for one table's row diff, without trailing
    /// semicolons. Deletes come first, then inserts, then updates.
    ///
    /// WHERE clauses match on every column of the old row rather than the
    /// primary key alone, so a statement only touches rows that still look
    /// exactly as they did in the first snapshot.
    #[must_use]
    pub fn render(&self, diff: &DataDiff) -> Vec<String> {
        let table = self.dialect.quote_identifier(&diff.table_name);
        let mut statements = Vec::new();

        for row in &diff.rows_deleted {
            statements.push(format!(
                "DELETE FROM {} WHERE {}",
                table,
                self.where_clause(row)
            ));
        }

        for row in &diff.rows_added {
            let columns: Vec<String> = row
                .keys()
                .map(|name| self.dialect.quote_identifier(name))
                .collect();
            let values: Vec<String> = row.values().map(|value| self.literal(value)).collect();
            statements.push(format!(
                "INSERT INTO {} ({}) VALUES ({})",
                table,
                columns.join(", "),
                values.join(", ")
            ));
        }

        for modification in &diff.rows_modified {
            let mut assignments = Vec::new();
            for (name, new_value) in &modification.new_row {
                let changed = match modification.old_row.get(name) {
                    Some(old_value) => !old_value.canonically_eq(new_value),
                    None => true,
                };
                if changed {
                    assignments.push(format!(
                        "{} = {}",
                        self.dialect.quote_identifier(name),
                        self.literal(new_value)
                    ));
                }
            }
            if assignments.is_empty() {
                continue;
            }
            statements.push(format!(
                "UPDATE {} SET {} WHERE {}",
                table,
                assignments.join(", "),
                self.where_clause(&modification.old_row)
            ));
        }

        statements
    }

    fn where_clause(&self, row: &Row) -> String {
        let conditions: Vec<String> = row
            .iter()
            .map(|(name, value)| {
                let column = self.dialect.quote_identifier(name);
                if value.is_null() {
                    format!("{column} IS NULL")
                } else {
                    format!("{} = {}", column, self.literal(value))
                }
            })
            .collect();
        conditions.join(" AND ")
    }

    fn literal(&self, value: &SqlValue) -> String {
        match value {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Bool(b) => self.dialect.boolean_literal(*b).to_string(),
            SqlValue::Integer(i) => i.to_string(),
            SqlValue::Float(f) if f.is_finite() => f.to_string(),
            // Bare NaN/inf is not valid SQL; the quoted spellings are what
            // PostgreSQL accepts for float columns.
            SqlValue::Float(f) if f.is_nan() => "'NaN'".to_string(),
            SqlValue::Float(f) if *f > 0.0 => "'Infinity'".to_string(),
            SqlValue::Float(_) => "'-Infinity'".to_string(),
            SqlValue::String(s) => format!("'{}'", s.replace('\'', "''")),
        }
    }
}
