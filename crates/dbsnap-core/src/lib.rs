//! Snapshot comparison and migration SQL generation.
//!
//! `dbsnap-core` holds the database-independent half of the toolkit:
//! in-memory snapshot types, the diff engine that compares two snapshots,
//! and dialect-aware renderers that turn a diff into a migration script,
//! where:
//! - Two snapshots of the same database produce an empty diff
//! - Diffing and rendering are deterministic, so equal inputs always yield
//!   byte-identical scripts
//! - SQL generation is dialect-aware (MySQL, PostgreSQL)
//!
//! # Architecture
//!
//! - **Schema** - Snapshot, table, column, index and foreign key types
//! - **Value** - Dynamically typed cell values with canonical equality
//! - **Diff** - Structural and row-level comparison of two snapshots
//! - **Dialect** - Database-specific identifier quoting and DDL forms
//! - **Render** - DDL and DML renderers plus the script assembler
//!
//! # Example
//!
//! ```rust,ignore
//! use dbsnap_core::prelude::*;
//!
//! let diff = compare(&before, &after)?;
//! if !diff.is_empty() {
//!     println!("{}", generate_sql(&diff, &MysqlDialect::new()));
//! }
//! ```

pub mod diff;
pub mod dialect;
pub mod error;
pub mod render;
pub mod schema;
pub mod value;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::diff::{
        compare, compare_data, compare_schemas, Action, ColumnChange, DataDiff, DiffResult,
        ForeignKeyChange, IndexChange, RowModification, SchemaDiff,
    };
    pub use crate::dialect::{MysqlDialect, PostgresDialect, SqlDialect};
    pub use crate::error::{CoreError, Result};
    pub use crate::render::{generate_sql, DdlRenderer, DmlRenderer};
    pub use crate::schema::{
        Column, ForeignKey, Index, ReferentialAction, Snapshot, Table, TableSchema,
    };
    pub use crate::value::{Row, SqlValue};
}
