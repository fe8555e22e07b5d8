//! Typed wrappers over [`DocumentStore`]: any serde record can be written to or
//! read from a collection without per-entity code.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::{DocumentStore, StoreError, StoreResult};
use crate::document::{Document, Fields, Filter, ListQuery};

/// Serialize a record into document fields. Only records that serialize to a
/// JSON object are accepted.
pub fn to_fields<T: Serialize>(record: &T) -> StoreResult<Fields> {
    match serde_json::to_value(record)? {
        Value::Object(fields) => Ok(fields),
        Value::Null => Err(StoreError::NotAnObject("null")),
        Value::Bool(_) => Err(StoreError::NotAnObject("boolean")),
        Value::Number(_) => Err(StoreError::NotAnObject("number")),
        Value::String(_) => Err(StoreError::NotAnObject("string")),
        Value::Array(_) => Err(StoreError::NotAnObject("array")),
    }
}

pub async fn create_record<T: Serialize + Sync>(
    store: &dyn DocumentStore,
    collection: &str,
    record: &T,
) -> StoreResult<Document> {
    store.create(collection, to_fields(record)?).await
}

/// List a collection and decode every document as `T`.
pub async fn list_records<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: &str,
    query: ListQuery,
) -> StoreResult<Vec<T>> {
    store
        .list(collection, query)
        .await?
        .into_iter()
        .map(|doc| doc.into_record().map_err(StoreError::from))
        .collect()
}

pub async fn get_record<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: &str,
    filter: &Filter,
) -> StoreResult<Option<T>> {
    match store.get_one(collection, filter).await? {
        Some(doc) => Ok(Some(doc.into_record()?)),
        None => Ok(None),
    }
}

pub async fn upsert_record<T: Serialize + Sync>(
    store: &dyn DocumentStore,
    collection: &str,
    filter: &Filter,
    record: &T,
) -> StoreResult<Option<Document>> {
    store
        .upsert_one(collection, filter, to_fields(record)?)
        .await
}
