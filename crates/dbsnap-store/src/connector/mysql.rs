//! MySQL introspection via information_schema.

use std::collections::BTreeMap;

use sqlx::mysql::{MySqlPool, MySqlRow};
use sqlx::{Column as _, Row as _};
use tracing::debug;

use dbsnap_core::schema::{Column, ForeignKey, Index, ReferentialAction, TableSchema};
use dbsnap_core::value::{Row, SqlValue};

use crate::config::ConnectionConfig;
use crate::error::{Result, StoreError};

/// Introspects a MySQL server.
pub struct MysqlConnector {
    pool: MySqlPool,
    database: String,
}

impl MysqlConnector {
    /// Connects to the configured server.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let pool = MySqlPool::connect(&config.url()).await?;
        Ok(Self {
            pool,
            database: config.database.clone(),
        })
    }

    /// Lists the table names in the configured database, sorted.
    pub async fn list_tables(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT TABLE_NAME FROM information_schema.TABLES \
             WHERE TABLE_SCHEMA = ? ORDER BY TABLE_NAME",
        )
        .bind(&self.database)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    /// Reads columns, indexes and foreign keys for one table.
    pub async fn table_schema(&self, table: &str) -> Result<TableSchema> {
        debug!(table, "introspecting table");
        let mut schema = TableSchema::new(table);
        schema.columns = self.columns(table).await?;
        schema.indexes = self.indexes(table).await?;
        schema.foreign_keys = self.foreign_keys(table).await?;
        Ok(schema)
    }

    async fn columns(&self, table: &str) -> Result<Vec<Column>> {
        let rows: Vec<(String, String, String, Option<String>, String, u32)> = sqlx::query_as(
            "SELECT COLUMN_NAME, COLUMN_TYPE, IS_NULLABLE, COLUMN_DEFAULT, EXTRA, \
                    ORDINAL_POSITION \
             FROM information_schema.COLUMNS \
             WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? \
             ORDER BY ORDINAL_POSITION",
        )
        .bind(&self.database)
        .bind(table)
        .fetch_all(&self.pool)
        .await
        .map_err(|source| StoreError::Table {
            table: table.to_string(),
            phase: "fetch columns",
            source,
        })?;

        Ok(rows
            .into_iter()
            .map(|(name, sql_type, nullable, default_value, extra, position)| Column {
                name,
                sql_type,
                nullable: nullable == "YES",
                default_value,
                auto_increment: extra.to_ascii_lowercase().contains("auto_increment"),
                position,
            })
            .collect())
    }

    async fn indexes(&self, table: &str) -> Result<Vec<Index>> {
        let rows: Vec<(String, String, i64, String)> = sqlx::query_as(
            "SELECT INDEX_NAME, COLUMN_NAME, NON_UNIQUE, INDEX_TYPE \
             FROM information_schema.STATISTICS \
             WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? \
             ORDER BY INDEX_NAME, SEQ_IN_INDEX",
        )
        .bind(&self.database)
        .bind(table)
        .fetch_all(&self.pool)
        .await
        .map_err(|source| StoreError::Table {
            table: table.to_string(),
            phase: "fetch indexes",
            source,
        })?;

        let mut by_name: BTreeMap<String, Index> = BTreeMap::new();
        for (index_name, column_name, non_unique, index_type) in rows {
            by_name
                .entry(index_name.clone())
                .or_insert_with(|| Index {
                    name: index_name.clone(),
                    columns: Vec::new(),
                    unique: non_unique == 0,
                    primary: index_name == "PRIMARY",
                    kind: index_type,
                })
                .columns
                .push(column_name);
        }

        Ok(by_name.into_values().collect())
    }

    async fn foreign_keys(&self, table: &str) -> Result<Vec<ForeignKey>> {
        let rows: Vec<(String, String, String, String)> = sqlx::query_as(
            "SELECT CONSTRAINT_NAME, COLUMN_NAME, REFERENCED_TABLE_NAME, \
                    REFERENCED_COLUMN_NAME \
             FROM information_schema.KEY_COLUMN_USAGE \
             WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? \
               AND REFERENCED_TABLE_NAME IS NOT NULL \
             ORDER BY CONSTRAINT_NAME, ORDINAL_POSITION",
        )
        .bind(&self.database)
        .bind(table)
        .fetch_all(&self.pool)
        .await
        .map_err(|source| StoreError::Table {
            table: table.to_string(),
            phase: "fetch foreign keys",
            source,
        })?;

        // Composite keys arrive as one row per member column.
        let rows = super::first_row_per_constraint(rows, |(name, ..)| name);

        let mut foreign_keys = Vec::with_capacity(rows.len());
        for (name, column, referenced_table, referenced_column) in rows {
            let (delete_rule, update_rule): (String, String) = sqlx::query_as(
                "SELECT DELETE_RULE, UPDATE_RULE \
                 FROM information_schema.REFERENTIAL_CONSTRAINTS \
                 WHERE CONSTRAINT_SCHEMA = ? AND CONSTRAINT_NAME = ?",
            )
            .bind(&self.database)
            .bind(&name)
            .fetch_one(&self.pool)
            .await
            .map_err(|source| StoreError::Table {
                table: table.to_string(),
                phase: "fetch foreign key rules",
                source,
            })?;

            foreign_keys.push(ForeignKey {
                name,
                column,
                referenced_table,
                referenced_column,
                on_delete: ReferentialAction::parse(&delete_rule),
                on_update: ReferentialAction::parse(&update_rule),
            });
        }

        Ok(foreign_keys)
    }

    /// Reads up to `limit` rows from one table.
    pub async fn table_data(&self, table: &str, limit: Option<u64>) -> Result<Vec<Row>> {
        let mut query = format!("SELECT * FROM `{}`", table.replace('`', "``"));
        if let Some(limit) = limit {
            query.push_str(&format!(" LIMIT {limit}"));
        }

        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|source| StoreError::Table {
                table: table.to_string(),
                phase: "fetch rows",
                source,
            })?;

        Ok(rows.iter().map(decode_row).collect())
    }
}

fn decode_row(row: &MySqlRow) -> Row {
    let mut decoded = Row::new();
    for (ordinal, column) in row.columns().iter().enumerate() {
        decoded.insert(column.name().to_string(), decode_value(row, ordinal));
    }
    decoded
}

/// Decodes one cell into a dynamically typed value.
///
/// Tries the native type families in order and stringifies temporal and
/// binary values, matching how the snapshot stores every cell as JSON.
fn decode_value(row: &MySqlRow, ordinal: usize) -> SqlValue {
    if let Ok(value) = row.try_get::<Option<i64>, _>(ordinal) {
        return value.map_or(SqlValue::Null, SqlValue::Integer);
    }
    if let Ok(value) = row.try_get::<Option<u64>, _>(ordinal) {
        return value.map_or(SqlValue::Null, |v| {
            i64::try_from(v).map_or_else(|_| SqlValue::String(v.to_string()), SqlValue::Integer)
        });
    }
    if let Ok(value) = row.try_get::<Option<f64>, _>(ordinal) {
        return value.map_or(SqlValue::Null, SqlValue::Float);
    }
    if let Ok(value) = row.try_get::<Option<bool>, _>(ordinal) {
        return value.map_or(SqlValue::Null, SqlValue::Bool);
    }
    if let Ok(value) = row.try_get::<Option<String>, _>(ordinal) {
        return value.map_or(SqlValue::Null, SqlValue::String);
    }
    if let Ok(value) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(ordinal) {
        return value.map_or(SqlValue::Null, |v| SqlValue::String(v.to_rfc3339()));
    }
    if let Ok(value) = row.try_get::<Option<chrono::NaiveDateTime>, _>(ordinal) {
        return value.map_or(SqlValue::Null, |v| SqlValue::String(v.to_string()));
    }
    if let Ok(value) = row.try_get::<Option<chrono::NaiveDate>, _>(ordinal) {
        return value.map_or(SqlValue::Null, |v| SqlValue::String(v.to_string()));
    }
    if let Ok(value) = row.try_get::<Option<chrono::NaiveTime>, _>(ordinal) {
        return value.map_or(SqlValue::Null, |v| SqlValue::String(v.to_string()));
    }
    if let Ok(value) = row.try_get::<Option<Vec<u8>>, _>(ordinal) {
        return value.map_or(SqlValue::Null, |v| {
            SqlValue::String(String::from_utf8_lossy(&v).into_owned())
        });
    }
    SqlValue::Null
}
