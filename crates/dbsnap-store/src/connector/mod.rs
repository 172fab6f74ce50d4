//! Live database introspection.
//!
//! A connector reads table names, table schemas and table rows from a
//! running server. Each backend fills the same snapshot types, so the rest
//! of the toolkit never sees which server the data came from.

mod mysql;
mod postgres;

pub use mysql::MysqlConnector;
pub use postgres::PostgresConnector;

use dbsnap_core::schema::TableSchema;
use dbsnap_core::value::Row;

use crate::config::{ConnectionConfig, DatabaseKind};
use crate::error::Result;

/// A connection to a database server being snapshotted.
pub enum Connector {
    Mysql(MysqlConnector),
    Postgres(PostgresConnector),
}

/// Keeps the first row for each constraint name, preserving order.
///
/// A composite foreign key arrives from information_schema as one row per
/// member column, all sharing the constraint name. The schema model holds
/// one column per constraint, so only the first member (lowest ordinal) is
/// kept; emitting every row would produce duplicate constraint names that
/// schema validation rejects.
pub(crate) fn first_row_per_constraint<T, K>(rows: Vec<T>, name: K) -> Vec<T>
where
    K: Fn(&T) -> &str,
{
    let mut seen = std::collections::BTreeSet::new();
    rows.into_iter()
        .filter(|row| seen.insert(name(row).to_string()))
        .collect()
}

impl Connector {
    /// Connects to the server described by the configuration.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        match config.kind {
            DatabaseKind::Mysql => Ok(Connector::Mysql(MysqlConnector::connect(config).await?)),
            DatabaseKind::Postgres => {
                Ok(Connector::Postgres(PostgresConnector::connect(config).await?))
            }
        }
    }

    /// The backend this connector talks to.
    #[must_use]
    pub fn kind(&self) -> DatabaseKind {
        match self {
            Connector::Mysql(_) => DatabaseKind::Mysql,
            Connector::Postgres(_) => DatabaseKind::Postgres,
        }
    }

    /// Lists the base table names, sorted.
    pub async fn list_tables(&self) -> Result<Vec<String>> {
        match self {
            Connector::Mysql(inner) => inner.list_tables().await,
            Connector::Postgres(inner) => inner.list_tables().await,
        }
    }

    /// Reads the full structure of one table.
    pub async fn table_schema(&self, table: &str) -> Result<TableSchema> {
        match self {
            Connector::Mysql(inner) => inner.table_schema(table).await,
            Connector::Postgres(inner) => inner.table_schema(table).await,
        }
    }

    /// Reads up to `limit` rows from one table; `None` reads all rows.
    pub async fn table_data(&self, table: &str, limit: Option<u64>) -> Result<Vec<Row>> {
        match self {
            Connector::Mysql(inner) => inner.table_data(table, limit).await,
            Connector::Postgres(inner) => inner.table_data(table, limit).await,
        }
    }
}
