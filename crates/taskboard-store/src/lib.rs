//! Remote relational store collaborator.
//!
//! The pipeline talks to the store only through the [`Store`] trait:
//! - [`RestStore`] speaks the PostgREST dialect over HTTP
//! - [`MemoryStore`] keeps tables in process, for development and tests

use async_trait::async_trait;

mod config;
pub use config::{ConfigError, KEY_VAR, StoreConfig, URL_VAR};

mod error;
pub use error::StoreError;

mod select;
pub use select::{CountMode, Embed, Order, Predicate, Select};

mod rest;
pub use rest::RestStore;

mod memory;
pub use memory::{MemoryStore, StoreCalls};

/// A single row as exchanged with the store: column name to JSON value.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Rows returned by a select, with the exact total when it was requested.
#[derive(Debug, Clone, Default)]
pub struct Rows {
    pub rows: Vec<Row>,
    /// `None` when no count was requested or the store could not determine it.
    pub count: Option<usize>,
}

/// Tabular store supporting filtered, ordered, ranged selects and keyed writes.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Run a select and return the matching rows.
    async fn select(&self, query: &Select) -> Result<Rows, StoreError>;

    /// Insert one row and return it as stored (with server-assigned columns).
    async fn insert(&self, table: &str, row: Row) -> Result<Row, StoreError>;

    /// Patch the row with the given id and return it as stored.
    async fn update(&self, table: &str, id: &str, patch: Row) -> Result<Row, StoreError>;

    /// Delete the row with the given id.
    async fn delete(&self, table: &str, id: &str) -> Result<(), StoreError>;
}
