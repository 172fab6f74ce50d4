//! Error types for snapshot capture and storage.

use thiserror::Error;

/// Errors that can occur while capturing, saving or loading snapshots.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The configured database type is not recognized.
    #[error("Unsupported database type: {0} (expected mysql or postgres)")]
    UnsupportedDatabase(String),

    /// A required environment variable is not set.
    #[error("Missing required environment variable: {0}")]
    MissingEnv(&'static str),

    /// DB_PORT is not a valid port number.
    #[error("Invalid port: {0}")]
    InvalidPort(String),

    /// The snapshot file does not exist.
    #[error("Snapshot file not found: {0}")]
    SnapshotNotFound(String),

    /// A per-table operation failed; the table and phase give context.
    #[error("Failed to {phase} for table {table}: {source}")]
    Table {
        /// Name of the table being processed.
        table: String,
        /// What was being done ("fetch schema", "fetch rows", "save rows").
        phase: &'static str,
        /// Underlying database error.
        #[source]
        source: sqlx::Error,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Snapshot contents violate a structural invariant.
    #[error(transparent)]
    Core(#[from] dbsnap_core::error::CoreError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
