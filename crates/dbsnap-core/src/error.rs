//! Error types for the comparison engine.

/// Errors raised by the comparison engine.
///
/// These all denote contract violations in the input snapshots; the engine
/// fails fast rather than emit partially-correct SQL.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A table schema declares the same column name twice.
    #[error("table '{table}' has duplicate column '{column}'")]
    DuplicateColumn {
        /// Table name.
        table: String,
        /// Offending column name.
        column: String,
    },

    /// A table schema declares the same index name twice.
    #[error("table '{table}' has duplicate index '{index}'")]
    DuplicateIndex {
        /// Table name.
        table: String,
        /// Offending index name.
        index: String,
    },

    /// A table schema declares the same foreign key name twice.
    #[error("table '{table}' has duplicate foreign key '{name}'")]
    DuplicateForeignKey {
        /// Table name.
        table: String,
        /// Offending constraint name.
        name: String,
    },

    /// More than one index is marked as the primary key.
    #[error("table '{table}' declares more than one primary index")]
    MultiplePrimaryIndexes {
        /// Table name.
        table: String,
    },

    /// A captured row lacks a value for a primary key column, so row
    /// identity cannot be established.
    #[error("row in table '{table}' is missing primary key column '{column}'")]
    MissingPrimaryKeyValue {
        /// Table name.
        table: String,
        /// Missing primary key column.
        column: String,
    },
}

/// Result type for comparison operations.
pub type Result<T> = std::result::Result<T, CoreError>;
