//! PostgreSQL dialect.

use crate::schema::Column;

use super::SqlDialect;

/// PostgreSQL SQL generation.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Creates the PostgreSQL dialect.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl SqlDialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{name}\"")
    }

    fn auto_increment_clause(&self) -> Option<&'static str> {
        // Serial and identity columns carry auto-increment in the type
        // string itself; there is no keyword to append.
        None
    }

    fn modify_column_sql(&self, table: &str, column: &Column) -> String {
        format!(
            "ALTER TABLE {} ALTER COLUMN {} TYPE {}",
            self.quote_identifier(table),
            self.quote_identifier(&column.name),
            column.sql_type
        )
    }

    fn drop_index_sql(&self, _table: &str, index: &str) -> String {
        format!("DROP INDEX {}", self.quote_identifier(index))
    }

    fn drop_foreign_key_sql(&self, table: &str, constraint: &str) -> String {
        format!(
            "ALTER TABLE {} DROP CONSTRAINT {}",
            self.quote_identifier(table),
            self.quote_identifier(constraint)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dialect() -> PostgresDialect {
        PostgresDialect::new()
    }

    #[test]
    fn test_double_quote_quoting() {
        assert_eq!(dialect().quote_identifier("users"), "\"users\"");
    }

    #[test]
    fn test_auto_increment_has_no_keyword() {
        let column = Column::new("id", "integer").not_null().auto_increment();
        assert_eq!(
            dialect().column_definition(&column),
            "\"id\" integer NOT NULL"
        );
    }

    #[test]
    fn test_modify_column_alters_type_only() {
        let column = Column::new("email", "varchar(255)").not_null();
        assert_eq!(
            dialect().modify_column_sql("users", &column),
            "ALTER TABLE \"users\" ALTER COLUMN \"email\" TYPE varchar(255)"
        );
    }

    #[test]
    fn test_drop_index_omits_table() {
        assert_eq!(
            dialect().drop_index_sql("users", "idx_email"),
            "DROP INDEX \"idx_email\""
        );
    }

    #[test]
    fn test_drop_foreign_key_uses_constraint_syntax() {
        assert_eq!(
            dialect().drop_foreign_key_sql("users", "fk_org"),
            "ALTER TABLE \"users\" DROP CONSTRAINT \"fk_org\""
        );
    }
}
