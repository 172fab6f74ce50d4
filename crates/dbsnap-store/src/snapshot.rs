//! Snapshot files.
//!
//! A snapshot is a single SQLite file with three tables: `metadata` holds
//! key/value pairs about the capture, `table_schemas` holds one JSON
//! document per table structure and `table_data` holds one JSON document
//! per captured row. Rows load back in insertion order.

use std::path::Path;

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use tracing::info;

use dbsnap_core::schema::{Snapshot, Table, TableSchema};
use dbsnap_core::value::Row;

use crate::connector::Connector;
use crate::error::{Result, StoreError};

const CREATE_METADATA_TABLE: &str = "CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)";

const CREATE_TABLE_SCHEMAS_TABLE: &str = "CREATE TABLE IF NOT EXISTS table_schemas (
    table_name TEXT PRIMARY KEY,
    schema_json TEXT NOT NULL
)";

const CREATE_TABLE_DATA_TABLE: &str = "CREATE TABLE IF NOT EXISTS table_data (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    table_name TEXT NOT NULL,
    row_json TEXT NOT NULL
)";

const CREATE_TABLE_DATA_INDEX: &str = "CREATE INDEX IF NOT EXISTS idx_table_data_table_name \
     ON table_data(table_name)";

/// Captures a snapshot from a live database.
///
/// `tables` restricts the capture to the named tables; empty means every
/// table the server reports. `limit` caps the rows read per table.
pub async fn capture_snapshot(
    connector: &Connector,
    tables: &[String],
    limit: Option<u64>,
) -> Result<Snapshot> {
    let table_names = if tables.is_empty() {
        connector.list_tables().await?
    } else {
        tables.to_vec()
    };

    let mut snapshot = Snapshot::new()
        .metadata("created_at", Utc::now().to_rfc3339())
        .metadata("db_type", connector.kind().to_string());

    for name in &table_names {
        let schema = connector.table_schema(name).await?;
        let rows = connector.table_data(name, limit).await?;
        info!(table = %name, rows = rows.len(), "captured table");

        let mut table = Table::new(schema);
        table.rows = rows;
        snapshot.tables.insert(name.clone(), table);
    }

    Ok(snapshot)
}

/// Writes a snapshot to a SQLite file, replacing any existing file.
pub async fn save_snapshot(snapshot: &Snapshot, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)?;
        }
    }
    if path.exists() {
        std::fs::remove_file(path)?;
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(options).await?;

    for statement in [
        CREATE_METADATA_TABLE,
        CREATE_TABLE_SCHEMAS_TABLE,
        CREATE_TABLE_DATA_TABLE,
        CREATE_TABLE_DATA_INDEX,
    ] {
        sqlx::query(statement).execute(&pool).await?;
    }

    for (key, value) in &snapshot.metadata {
        sqlx::query("INSERT INTO metadata (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(value)
            .execute(&pool)
            .await?;
    }

    for (name, table) in &snapshot.tables {
        let schema_json = serde_json::to_string(&table.schema)?;
        sqlx::query("INSERT INTO table_schemas (table_name, schema_json) VALUES (?, ?)")
            .bind(name)
            .bind(schema_json)
            .execute(&pool)
            .await?;

        let mut tx = pool.begin().await?;
        for row in &table.rows {
            let row_json = serde_json::to_string(row)?;
            sqlx::query("INSERT INTO table_data (table_name, row_json) VALUES (?, ?)")
                .bind(name)
                .bind(row_json)
                .execute(&mut *tx)
                .await
                .map_err(|source| StoreError::Table {
                    table: name.clone(),
                    phase: "save rows",
                    source,
                })?;
        }
        tx.commit().await?;
    }

    pool.close().await;
    info!(path = %path.display(), tables = snapshot.tables.len(), "snapshot saved");
    Ok(())
}

/// Reads a snapshot back from a SQLite file.
pub async fn load_snapshot(path: &Path) -> Result<Snapshot> {
    if !path.exists() {
        return Err(StoreError::SnapshotNotFound(path.display().to_string()));
    }

    let options = SqliteConnectOptions::new().filename(path);
    let pool = SqlitePool::connect_with(options).await?;

    let mut snapshot = Snapshot::new();

    let metadata: Vec<(String, String)> = sqlx::query_as("SELECT key, value FROM metadata")
        .fetch_all(&pool)
        .await?;
    snapshot.metadata = metadata.into_iter().collect();

    let schemas: Vec<(String, String)> =
        sqlx::query_as("SELECT table_name, schema_json FROM table_schemas")
            .fetch_all(&pool)
            .await?;
    for (name, schema_json) in schemas {
        let schema: TableSchema = serde_json::from_str(&schema_json)?;
        snapshot.tables.insert(name, Table::new(schema));
    }

    for (name, table) in &mut snapshot.tables {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT row_json FROM table_data WHERE table_name = ? ORDER BY id")
                .bind(name.as_str())
                .fetch_all(&pool)
                .await
                .map_err(|source| StoreError::Table {
                    table: name.clone(),
                    phase: "load rows",
                    source,
                })?;

        for (row_json,) in rows {
            let row: Row = serde_json::from_str(&row_json)?;
            table.rows.push(row);
        }
    }

    pool.close().await;
    Ok(snapshot)
}
