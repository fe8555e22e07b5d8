//! Document storage and domain types for the course booking service.

pub mod document;
pub mod schema;
pub mod seed;
pub mod store;

pub use document::{Document, DocumentId, Fields, Filter, ListQuery, SortDirection};
pub use store::{open_store, DocumentStore, StoreConfig, StoreError, StoreResult};
