//! Snapshot capture and storage.
//!
//! `dbsnap-store` is the database-facing half of the toolkit: connectors
//! that introspect live MySQL and PostgreSQL servers, and the SQLite file
//! format snapshots are saved to and loaded from.

pub mod config;
pub mod connector;
pub mod error;
pub mod snapshot;

pub use config::{ConnectionConfig, DatabaseKind};
pub use connector::Connector;
pub use error::{Result, StoreError};
pub use snapshot::{capture_snapshot, load_snapshot, save_snapshot};
