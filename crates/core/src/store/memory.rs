//! In-process backend. Same matching, ordering and timestamp rules as the
//! Postgres store, held in a map of collection name to insertion-ordered
//! documents.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::RwLock;

use super::{upsert_target_id, DocumentStore, StoreError, StoreResult};
use crate::document::model::{
    now, strip_reserved, CREATED_AT_FIELD, ID_FIELD, UPDATED_AT_FIELD,
};
use crate::document::{Document, DocumentId, Fields, Filter, ListQuery, SortDirection};

#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently held in `collection`.
    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn create(&self, collection: &str, data: Fields) -> StoreResult<Document> {
        let ts = now();
        let doc = Document {
            id: DocumentId::generate().to_string(),
            created_at: ts,
            updated_at: ts,
            fields: strip_reserved(data),
        };

        self.collections
            .write()
            .await
            .entry(collection.to_owned())
            .or_default()
            .push(doc.clone());

        tracing::debug!(collection, id = %doc.id, "Document created");
        Ok(doc)
    }

    async fn list(&self, collection: &str, query: ListQuery) -> StoreResult<Vec<Document>> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut found: Vec<Document> = docs
            .iter()
            .filter(|doc| query.filter.as_ref().map_or(true, |f| matches_filter(doc, f)))
            .cloned()
            .collect();

        if let Some(sort) = &query.sort {
            // Stable sort keeps insertion order as the final tie-breaker.
            found.sort_by(|a, b| {
                sort.iter()
                    .map(|(field, direction)| compare_field(a, b, field, *direction))
                    .find(|ord| ord.is_ne())
                    .unwrap_or(Ordering::Equal)
            });
        }

        if let Some(limit) = query.effective_limit() {
            found.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }

        tracing::debug!(collection, count = found.len(), "Documents listed");
        Ok(found)
    }

    async fn get_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| matches_filter(doc, filter)))
            .cloned())
    }

    async fn upsert_one(
        &self,
        collection: &str,
        filter: &Filter,
        data: Fields,
    ) -> StoreResult<Option<Document>> {
        let target_id = upsert_target_id(filter)?;
        let ts = now();
        let data = strip_reserved(data);

        {
            let mut collections = self.collections.write().await;
            let docs = collections.entry(collection.to_owned()).or_default();

            match docs.iter().position(|doc| matches_filter(doc, filter)) {
                Some(index) => {
                    let doc = &mut docs[index];
                    doc.fields.extend(data);
                    doc.updated_at = ts;
                    tracing::debug!(collection, id = %doc.id, "Upsert updated existing document");
                }
                None => {
                    if let Some(id) = target_id {
                        if docs.iter().any(|doc| doc.id == id) {
                            return Err(StoreError::DuplicateId(id.to_owned()));
                        }
                    }
                    let id = target_id
                        .map(str::to_owned)
                        .unwrap_or_else(|| DocumentId::generate().to_string());
                    let mut fields = strip_reserved(filter.clone());
                    fields.extend(data);
                    tracing::debug!(collection, %id, "Upsert inserted new document");
                    docs.push(Document {
                        id,
                        created_at: ts,
                        updated_at: ts,
                        fields,
                    });
                }
            }
        }

        self.get_one(collection, filter).await
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn close(&self) {}
}

fn matches_filter(doc: &Document, filter: &Filter) -> bool {
    filter.iter().all(|(field, expected)| match field.as_str() {
        // Ids are text columns: no JSON coercion, exact string match only.
        ID_FIELD => expected.as_str() == Some(doc.id.as_str()),
        CREATED_AT_FIELD => parse_timestamp(expected) == Some(doc.created_at),
        UPDATED_AT_FIELD => parse_timestamp(expected) == Some(doc.updated_at),
        _ => doc
            .fields
            .get(field)
            .is_some_and(|actual| jsonb_eq(actual, expected)),
    })
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    serde_json::from_value(value.clone()).ok()
}

/// Missing fields sort after present ones in ascending order, as SQL NULLs do.
fn compare_field(a: &Document, b: &Document, field: &str, direction: SortDirection) -> Ordering {
    let ord = match field {
        ID_FIELD => a.id.cmp(&b.id),
        CREATED_AT_FIELD => a.created_at.cmp(&b.created_at),
        UPDATED_AT_FIELD => a.updated_at.cmp(&b.updated_at),
        _ => match (a.fields.get(field), b.fields.get(field)) {
            (Some(x), Some(y)) => jsonb_cmp(x, y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    };
    match direction {
        SortDirection::Ascending => ord,
        SortDirection::Descending => ord.reverse(),
    }
}

/// JSONB equality: numbers compare by value, so `2` equals `2.0`.
fn jsonb_eq(a: &Value, b: &Value) -> bool {
    jsonb_cmp(a, b) == Ordering::Equal
}

/// JSONB's btree order:
/// object > array > boolean > number > string > null.
/// Arrays and objects compare by length first, then element by element;
/// object pairs are visited in JSONB storage order (shorter keys first).
/// Strings compare bytewise rather than by database collation.
fn jsonb_cmp(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::String(_) => 1,
            Value::Number(_) => 2,
            Value::Bool(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => x.len().cmp(&y.len()).then_with(|| {
            x.iter()
                .zip(y)
                .map(|(x, y)| jsonb_cmp(x, y))
                .find(|ord| ord.is_ne())
                .unwrap_or(Ordering::Equal)
        }),
        (Value::Object(x), Value::Object(y)) => x.len().cmp(&y.len()).then_with(|| {
            let (mut xs, mut ys): (Vec<_>, Vec<_>) = (x.iter().collect(), y.iter().collect());
            xs.sort_by(|(k1, _), (k2, _)| storage_key_order(k1, k2));
            ys.sort_by(|(k1, _), (k2, _)| storage_key_order(k1, k2));
            xs.into_iter()
                .zip(ys)
                .map(|((kx, vx), (ky, vy))| {
                    storage_key_order(kx, ky).then_with(|| jsonb_cmp(vx, vy))
                })
                .find(|ord| ord.is_ne())
                .unwrap_or(Ordering::Equal)
        }),
        _ => rank(a).cmp(&rank(b)),
    }
}

fn storage_key_order(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn compare_numbers(x: &serde_json::Number, y: &serde_json::Number) -> Ordering {
    if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
        return x.cmp(&y);
    }
    if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
        return x.cmp(&y);
    }
    let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
    x.total_cmp(&y)
}
