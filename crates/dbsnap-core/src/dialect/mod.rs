//! SQL dialect descriptors.
//!
//! Everything that differs between target engines lives behind this trait:
//! identifier quoting, column alteration syntax, the DROP INDEX form, the
//! auto-increment keyword and boolean literals. A dialect is selected once
//! when a renderer is constructed; the rendering paths never branch on a
//! dialect name.

mod mysql;
mod postgres;

pub use mysql::MysqlDialect;
pub use postgres::PostgresDialect;

use crate::schema::Column;

/// Engine-specific SQL generation capabilities.
pub trait SqlDialect: Send + Sync {
    /// Returns the dialect name.
    fn name(&self) -> &'static str;

    /// Quotes an identifier (table name, column name, etc.).
    fn quote_identifier(&self, name: &str) -> String;

    /// Returns the keyword appended to auto-increment column definitions,
    /// or `None` when the engine expresses auto-increment through the type
    /// itself (serial/identity columns).
    fn auto_increment_clause(&self) -> Option<&'static str>;

    /// Returns the boolean literal.
    fn boolean_literal(&self, value: bool) -> &'static str {
        if value {
            "TRUE"
        } else {
            "FALSE"
        }
    }

    /// Generates the statement altering an existing column to a new
    /// definition. Engines disagree fundamentally here: MySQL restates the
    /// whole definition, PostgreSQL alters the type in place.
    fn modify_column_sql(&self, table: &str, column: &Column) -> String;

    /// Generates the statement dropping an index.
    fn drop_index_sql(&self, table: &str, index: &str) -> String;

    /// Generates the statement dropping a foreign key constraint.
    fn drop_foreign_key_sql(&self, table: &str, constraint: &str) -> String;

    /// Renders a full column definition: quoted name, verbatim type string,
    /// nullability, default literal and auto-increment keyword.
    fn column_definition(&self, column: &Column) -> String {
        let mut definition = format!(
            "{} {}",
            self.quote_identifier(&column.name),
            column.sql_type
        );

        if !column.nullable {
            definition.push_str(" NOT NULL");
        }

        if let Some(default) = &column.default_value {
            definition.push_str(" DEFAULT ");
            definition.push_str(default);
        }

        if column.auto_increment {
            if let Some(keyword) = self.auto_increment_clause() {
                definition.push(' ');
                definition.push_str(keyword);
            }
        }

        definition
    }

    /// Quotes a list of identifiers and joins them with `, `.
    fn quote_identifiers(&self, names: &[String]) -> String {
        names
            .iter()
            .map(|name| self.quote_identifier(name))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
