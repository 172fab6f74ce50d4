//! PostgreSQL introspection via information_schema and pg_catalog.

use std::collections::BTreeMap;

use sqlx::postgres::{PgPool, PgRow};
use sqlx::{Column as _, Row as _};
use tracing::debug;

use dbsnap_core::schema::{Column, ForeignKey, Index, ReferentialAction, TableSchema};
use dbsnap_core::value::{Row, SqlValue};

use crate::config::ConnectionConfig;
use crate::error::{Result, StoreError};

/// Introspects a PostgreSQL server. Only the `public` schema is examined.
pub struct PostgresConnector {
    pool: PgPool,
}

impl PostgresConnector {
    /// Connects to the configured server.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let pool = PgPool::connect(&config.url()).await?;
        Ok(Self { pool })
    }

    /// Lists the base table names in the public schema, sorted.
    pub async fn list_tables(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT table_name FROM information_schema.tables \
             WHERE table_schema = 'public' AND table_type = 'BASE TABLE' \
             ORDER BY table_name",
        )
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
        let rows: Vec<(String, String, String, Option<String>, i32)> = sqlx::query_as(
            "SELECT column_name, data_type, is_nullable, column_default, \
                    ordinal_position \
             FROM information_schema.columns \
             WHERE table_schema = 'public' AND table_name = $1 \
             ORDER BY ordinal_position",
        )
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
            .map(|(name, sql_type, nullable, default_value, position)| {
                // Serial and identity columns carry a nextval() default.
                let auto_increment = default_value
                    .as_deref()
                    .is_some_and(|d| d.to_ascii_lowercase().contains("nextval"));
                Column {
                    name,
                    sql_type,
                    nullable: nullable == "YES",
                    default_value,
                    auto_increment,
                    position: position.unsigned_abs(),
                }
            })
            .collect())
    }

    async fn indexes(&self, table: &str) -> Result<Vec<Index>> {
        let rows: Vec<(String, String, bool, bool)> = sqlx::query_as(
            "SELECT i.relname AS index_name, a.attname AS column_name, \
                    ix.indisunique AS is_unique, ix.indisprimary AS is_primary \
             FROM pg_class t \
             JOIN pg_index ix ON t.oid = ix.indrelid \
             JOIN pg_class i ON i.oid = ix.indexrelid \
             JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = ANY(ix.indkey) \
             WHERE t.relname = $1 AND t.relkind = 'r' \
             ORDER BY i.relname, a.attnum",
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await
        .map_err(|source| StoreError::Table {
            table: table.to_string(),
            phase: "fetch indexes",
            source,
        })?;

        let mut by_name: BTreeMap<String, Index> = BTreeMap::new();
        for (index_name, column_name, is_unique, is_primary) in rows {
            by_name
                .entry(index_name.clone())
                .or_insert_with(|| Index {
                    name: index_name.clone(),
                    columns: Vec::new(),
                    unique: is_unique,
                    primary: is_primary,
                    kind: "BTREE".to_string(),
                })
                .columns
                .push(column_name);
        }

        Ok(by_name.into_values().collect())
    }

    async fn foreign_keys(&self, table: &str) -> Result<Vec<ForeignKey>> {
        let rows: Vec<(String, String, String, String, String, String)> = sqlx::query_as(
            "SELECT tc.constraint_name, kcu.column_name, \
                    ccu.table_name AS referenced_table, \
                    ccu.column_name AS referenced_column, \
                    rc.update_rule, rc.delete_rule \
             FROM information_schema.table_constraints tc \
             JOIN information_schema.key_column_usage kcu \
               ON tc.constraint_name = kcu.constraint_name \
              AND tc.table_schema = kcu.table_schema \
             JOIN information_schema.constraint_column_usage ccu \
               ON ccu.constraint_name = tc.constraint_name \
              AND ccu.table_schema = tc.table_schema \
             JOIN information_schema.referential_constraints rc \
               ON rc.constraint_name = tc.constraint_name \
             WHERE tc.constraint_type = 'FOREIGN KEY' \
               AND tc.table_schema = 'public' AND tc.table_name = $1 \
             ORDER BY tc.constraint_name, kcu.ordinal_position",
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await
        .map_err(|source| StoreError::Table {
            table: table.to_string(),
            phase: "fetch foreign keys",
            source,
        })?;

        // Composite keys arrive as one row per member column, and the
        // constraint_column_usage join can multiply them further.
        let rows = super::first_row_per_constraint(rows, |(name, ..)| name);

        Ok(rows
            .into_iter()
            .map(
                |(name, column, referenced_table, referenced_column, update_rule, delete_rule)| {
                    ForeignKey {
                        name,
                        column,
                        referenced_table,
                        referenced_column,
                        on_delete: ReferentialAction::parse(&delete_rule),
                        on_update: ReferentialAction::parse(&update_rule),
                    }
                },
            )
            .collect())
    }

    /// Reads up to `limit` rows from one table.
    pub async fn table_data(&self, table: &str, limit: Option<u64>) -> Result<Vec<Row>> {
        let mut query = format!("SELECT * FROM \"{}\"", table.replace('"', "\"\""));
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

fn decode_row(row: &PgRow) -> Row {
    let mut decoded = Row::new();
    for (ordinal, column) in row.columns().iter().enumerate() {
        decoded.insert(column.name().to_string(), decode_value(row, ordinal));
    }
    decoded
}

fn decode_value(row: &PgRow, ordinal: usize) -> SqlValue {
    if let Ok(value) = row.try_get::<Option<i64>, _>(ordinal) {
        return value.map_or(SqlValue::Null, SqlValue::Integer);
    }
    if let Ok(value) = row.try_get::<Option<i32>, _>(ordinal) {
        return value.map_or(SqlValue::Null, |v| SqlValue::Integer(i64::from(v)));
    }
    if let Ok(value) = row.try_get::<Option<i16>, _>(ordinal) {
        return value.map_or(SqlValue::Null, |v| SqlValue::Integer(i64::from(v)));
    }
    if let Ok(value) = row.try_get::<Option<f64>, _>(ordinal) {
        return value.map_or(SqlValue::Null, SqlValue::Float);
    }
    if let Ok(value) = row.try_get::<Option<f32>, _>(ordinal) {
        return value.map_or(SqlValue::Null, |v| SqlValue::Float(f64::from(v)));
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
