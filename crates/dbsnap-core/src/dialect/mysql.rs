//! MySQL dialect.

use crate::schema::Column;

use super::SqlDialect;

/// MySQL SQL generation.
#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlDialect;

impl MysqlDialect {
    /// Creates the MySQL dialect.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl SqlDialect for MysqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("`{name}`")
    }

    fn auto_increment_clause(&self) -> Option<&'static str> {
        Some("AUTO_INCREMENT")
    }

    fn modify_column_sql(&self, table: &str, column: &Column) -> String {
        // MODIFY COLUMN restates the entire definition.
        format!(
            "ALTER TABLE {} MODIFY COLUMN {}",
            self.quote_identifier(table),
            self.column_definition(column)
        )
    }

    fn drop_index_sql(&self, table: &str, index: &str) -> String {
        format!(
            "DROP INDEX {} ON {}",
            self.quote_identifier(index),
            self.quote_identifier(table)
        )
    }

    fn drop_foreign_key_sql(&self, table: &str, constraint: &str) -> String {
        format!(
            "ALTER TABLE {} DROP FOREIGN KEY {}",
            self.quote_identifier(table),
            self.quote_identifier(constraint)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dialect() -> MysqlDialect {
        MysqlDialect::new()
    }

    #[test]
    fn test_backtick_quoting() {
        assert_eq!(dialect().quote_identifier("users"), "`users`");
    }

    #[test]
    fn test_column_definition_full() {
        let column = Column::new("id", "int")
            .not_null()
            .auto_increment();
        assert_eq!(
            dialect().column_definition(&column),
            "`id` int NOT NULL AUTO_INCREMENT"
        );
    }

    #[test]
    fn test_column_definition_with_default() {
        let column = Column::new("status", "varchar(20)").default_value("'active'");
        assert_eq!(
            dialect().column_definition(&column),
            "`status` varchar(20) DEFAULT 'active'"
        );
    }

    #[test]
    fn test_modify_column_restates_definition() {
        let column = Column::new("email", "varchar(255)").not_null();
        assert_eq!(
            dialect().modify_column_sql("users", &column),
            "ALTER TABLE `users` MODIFY COLUMN `email` varchar(255) NOT NULL"
        );
    }

    #[test]
    fn test_drop_index_names_table() {
        assert_eq!(
            dialect().drop_index_sql("users", "idx_email"),
            "DROP INDEX `idx_email` ON `users`"
        );
    }

    #[test]
    fn test_drop_foreign_key() {
        assert_eq!(
            dialect().drop_foreign_key_sql("users", "fk_org"),
            "ALTER TABLE `users` DROP FOREIGN KEY `fk_org`"
        );
    }
}
