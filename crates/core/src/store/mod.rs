//! Generic document access.
//!
//! Every operation takes the collection name as its first argument and works
//! against any collection; nothing here knows about instructors, courses or
//! bookings. Schema enforcement belongs to the caller.

pub mod memory;
pub mod postgres;
pub mod records;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use serde_json::Value;

use crate::document::model::{CREATED_AT_FIELD, ID_FIELD, UPDATED_AT_FIELD};
use crate::document::{Document, Fields, Filter, ListQuery};

pub use memory::MemoryStore;
pub use postgres::PgDocumentStore;

/// URL scheme that selects the in-process backend.
pub const MEMORY_URL_SCHEME: &str = "memory:";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("record must serialize to a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("invalid store configuration: {0}")]
    Config(String),

    /// An upsert missed but its `_id` belongs to another document in the
    /// collection.
    #[error("document id already exists in collection: {0}")]
    DuplicateId(String),

    /// An upsert filter that no inserted document could ever satisfy.
    #[error("invalid upsert filter: {0}")]
    InvalidFilter(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage backend for schema-flexible documents.
///
/// Implementations must be safe to share across concurrently running
/// request handlers.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend name, for logs and diagnostics.
    fn backend(&self) -> &'static str;

    /// Insert a new document. `created_at` and `updated_at` are both set to
    /// the same instant; reserved keys in `data` are ignored.
    async fn create(&self, collection: &str, data: Fields) -> StoreResult<Document>;

    /// All documents matching the query, in sort order (insertion order when
    /// no sort is given).
    async fn list(&self, collection: &str, query: ListQuery) -> StoreResult<Vec<Document>>;

    /// First document matching `filter`. No match is `Ok(None)`.
    async fn get_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Document>>;

    /// Overwrite the provided fields on the document matching `filter`, or
    /// insert `filter` plus `data` when nothing matches. A string `_id` in the
    /// filter becomes the inserted document's id. Returns the document read
    /// back by `filter` after the write.
    ///
    /// Filters with a non-string `_id` or with a timestamp key are rejected
    /// before anything is written.
    async fn upsert_one(
        &self,
        collection: &str,
        filter: &Filter,
        data: Fields,
    ) -> StoreResult<Option<Document>>;

    /// Verify the backend is reachable.
    async fn ping(&self) -> StoreResult<()>;

    /// Release backend resources. Called once on shutdown.
    async fn close(&self);
}

/// Validate an upsert filter and return the caller-chosen id, if any.
pub(crate) fn upsert_target_id(filter: &Filter) -> StoreResult<Option<&str>> {
    for key in [CREATED_AT_FIELD, UPDATED_AT_FIELD] {
        if filter.contains_key(key) {
            return Err(StoreError::InvalidFilter(format!(
                "`{key}` is set by the store and cannot select an upsert target"
            )));
        }
    }

    match filter.get(ID_FIELD) {
        None => Ok(None),
        Some(Value::String(id)) => Ok(Some(id.as_str())),
        Some(other) => Err(StoreError::InvalidFilter(format!(
            "`{ID_FIELD}` must be a string, got {other}"
        ))),
    }
}

/// Connection settings for [`open_store`].
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// `postgres://...` or `memory://`.
    pub url: String,
    /// Logical database name; overrides any name present in `url`.
    pub database_name: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Open the backend selected by `config.url`. Postgres stores have their
/// migrations applied before they are returned.
pub async fn open_store(config: &StoreConfig) -> StoreResult<Arc<dyn DocumentStore>> {
    if config.url.starts_with(MEMORY_URL_SCHEME) {
        tracing::warn!("Using in-memory document store; data will not survive a restart");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let store = PgDocumentStore::connect(config).await?;
    store.migrate().await?;
    Ok(Arc::new(store))
}
