//! Postgres backend: every collection lives in the single `documents` table,
//! business fields in a JSONB column and the reserved keys in real columns.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};

use super::{upsert_target_id, DocumentStore, StoreConfig, StoreError, StoreResult};
use crate::document::model::{
    now, strip_reserved, CREATED_AT_FIELD, ID_FIELD, UPDATED_AT_FIELD,
};
use crate::document::{Document, DocumentId, Fields, Filter, ListQuery};

const SELECT_COLUMNS: &str = "SELECT id, content, created_at, updated_at FROM documents";

/// Document store backed by a shared sqlx connection pool.
#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    /// Build the pool. The configured database name replaces whatever the URL
    /// names.
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        let options = PgConnectOptions::from_str(&config.url)
            .map_err(|e| StoreError::Config(format!("bad database url: {e}")))?
            .database(&config.database_name);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_with(options)
            .await?;

        tracing::info!(database = %config.database_name, "Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Wrap an existing pool. Migrations are the caller's responsibility.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply pending migrations from the workspace `migrations/` directory.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        tracing::info!("Database migrations applied");
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn create(&self, collection: &str, data: Fields) -> StoreResult<Document> {
        let id = DocumentId::generate().to_string();
        let ts = now();
        let fields = strip_reserved(data);

        sqlx::query(
            "INSERT INTO documents (id, collection, content, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $4)",
        )
        .bind(&id)
        .bind(collection)
        .bind(Json(&fields))
        .bind(ts)
        .execute(&self.pool)
        .await?;

        tracing::debug!(collection, %id, "Document created");
        Ok(Document {
            id,
            created_at: ts,
            updated_at: ts,
            fields,
        })
    }

    async fn list(&self, collection: &str, query: ListQuery) -> StoreResult<Vec<Document>> {
        let mut qb = build_list_query(collection, &query);
        let rows = qb.build().fetch_all(&self.pool).await?;
        tracing::debug!(collection, count = rows.len(), "Documents listed");
        rows.iter().map(row_to_document).collect()
    }

    async fn get_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Document>> {
        let query = ListQuery {
            filter: Some(filter.clone()),
            limit: Some(1),
            sort: None,
        };
        let mut qb = build_list_query(collection, &query);
        let row = qb.build().fetch_optional(&self.pool).await?;
        row.as_ref().map(row_to_document).transpose()
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
        let mut tx = self.pool.begin().await?;

        // Serialize upserts on the same (collection, filter) so that two
        // concurrent misses cannot both insert.
        let lock_key = format!("{collection}\u{1f}{}", serde_json::to_string(filter)?);
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(lock_key)
            .execute(&mut *tx)
            .await?;

        let mut qb = QueryBuilder::<Postgres>::new("SELECT id FROM documents");
        push_where(&mut qb, collection, filter);
        qb.push(" ORDER BY seq LIMIT 1 FOR UPDATE");
        let existing = qb.build().fetch_optional(&mut *tx).await?;

        match existing {
            Some(row) => {
                let id: String = row.try_get("id")?;
                sqlx::query(
                    "UPDATE documents SET content = content || $1, updated_at = $2 \
                     WHERE collection = $3 AND id = $4",
                )
                .bind(Json(&data))
                .bind(ts)
                .bind(collection)
                .bind(&id)
                .execute(&mut *tx)
                .await?;
                tracing::debug!(collection, %id, "Upsert updated existing document");
            }
            None => {
                let id = target_id
                    .map(str::to_owned)
                    .unwrap_or_else(|| DocumentId::generate().to_string());
                let mut content = strip_reserved(filter.clone());
                content.extend(data);
                let inserted = sqlx::query(
                    "INSERT INTO documents (id, collection, content, created_at, updated_at) \
                     VALUES ($1, $2, $3, $4, $4) ON CONFLICT (collection, id) DO NOTHING",
                )
                .bind(&id)
                .bind(collection)
                .bind(Json(&content))
                .bind(ts)
                .execute(&mut *tx)
                .await?;
                // The id is taken by a document the rest of the filter rejected.
                if inserted.rows_affected() == 0 {
                    return Err(StoreError::DuplicateId(id));
                }
                tracing::debug!(collection, %id, "Upsert inserted new document");
            }
        }

        tx.commit().await?;

        // Read-after-write: a concurrent writer may change the record between
        // the commit and this read.
        self.get_one(collection, filter).await
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
        tracing::info!("PostgreSQL pool closed");
    }
}

/// `SELECT ... WHERE ... ORDER BY ... LIMIT ...` for a list query.
fn build_list_query(collection: &str, query: &ListQuery) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::<Postgres>::new(SELECT_COLUMNS);
    let empty = Filter::new();
    push_where(&mut qb, collection, query.filter.as_ref().unwrap_or(&empty));

    qb.push(" ORDER BY ");
    for (field, direction) in query.sort.iter().flatten() {
        push_field(&mut qb, field);
        qb.push(" ").push(direction.as_sql()).push(", ");
    }
    qb.push("seq ASC");

    if let Some(limit) = query.effective_limit() {
        qb.push(" LIMIT ")
            .push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
    }
    qb
}

fn push_where(qb: &mut QueryBuilder<'static, Postgres>, collection: &str, filter: &Filter) {
    qb.push(" WHERE collection = ").push_bind(collection.to_owned());

    for (field, expected) in filter {
        qb.push(" AND ");
        match field.as_str() {
            ID_FIELD => match expected.as_str() {
                Some(id) => {
                    qb.push("id = ").push_bind(id.to_owned());
                }
                None => {
                    qb.push("FALSE");
                }
            },
            CREATED_AT_FIELD | UPDATED_AT_FIELD => match parse_timestamp(expected) {
                Some(ts) => {
                    qb.push(field.as_str()).push(" = ").push_bind(ts);
                }
                None => {
                    qb.push("FALSE");
                }
            },
            _ => {
                // Containment lets the GIN index narrow the scan; the equality
                // keeps the match exact (containment alone accepts sub-arrays
                // and sub-objects).
                let mut fragment = Fields::new();
                fragment.insert(field.clone(), expected.clone());
                qb.push("content @> ")
                    .push_bind(Json(Value::Object(fragment)))
                    .push(" AND content -> ")
                    .push_bind(field.clone())
                    .push(" = ")
                    .push_bind(Json(expected.clone()));
            }
        }
    }
}

/// Sort expression for a field; reserved keys sort on their columns.
fn push_field(qb: &mut QueryBuilder<'static, Postgres>, field: &str) {
    match field {
        ID_FIELD => {
            qb.push("id");
        }
        CREATED_AT_FIELD | UPDATED_AT_FIELD => {
            qb.push(field);
        }
        _ => {
            qb.push("content -> ").push_bind(field.to_owned());
        }
    }
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    serde_json::from_value(value.clone()).ok()
}

fn row_to_document(row: &PgRow) -> StoreResult<Document> {
    let Json(fields): Json<Fields> = row.try_get("content")?;
    Ok(Document {
        id: row.try_get("id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        fields,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::SortDirection;
    use serde_json::json;

    fn filter(value: Value) -> Filter {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn list_without_options_scans_collection_in_insertion_order() {
        let qb = build_list_query("course", &ListQuery::new());
        assert_eq!(
            qb.sql(),
            "SELECT id, content, created_at, updated_at FROM documents \
             WHERE collection = $1 ORDER BY seq ASC"
        );
    }

    #[test]
    fn filter_entries_become_indexed_jsonb_equalities() {
        let query = ListQuery::new().filter(filter(json!({"active": true, "title": "Lift"})));
        let qb = build_list_query("course", &query);
        assert_eq!(
            qb.sql(),
            "SELECT id, content, created_at, updated_at FROM documents \
             WHERE collection = $1 \
             AND content @> $2 AND content -> $3 = $4 \
             AND content @> $5 AND content -> $6 = $7 \
             ORDER BY seq ASC"
        );
    }

    #[test]
    fn id_filter_uses_the_id_column() {
        let id = DocumentId::generate().to_string();
        let query = ListQuery::new().filter(filter(json!({ "_id": id })));
        let qb = build_list_query("booking", &query);
        assert!(qb.sql().contains("AND id = $2"));
    }

    #[test]
    fn any_string_id_filter_uses_the_id_column() {
        let query = ListQuery::new().filter(filter(json!({"_id": "nope"})));
        let qb = build_list_query("booking", &query);
        assert!(qb.sql().contains("AND id = $2"));
    }

    #[test]
    fn non_string_id_filter_matches_nothing() {
        let query = ListQuery::new().filter(filter(json!({"_id": 12})));
        let qb = build_list_query("booking", &query);
        assert!(qb.sql().contains("AND FALSE"));
    }

    #[test]
    fn sort_and_limit_are_applied_in_order() {
        let query = ListQuery::new()
            .sort_by("title", SortDirection::Ascending)
            .sort_by("created_at", SortDirection::Descending)
            .limit(2);
        let qb = build_list_query("course", &query);
        assert_eq!(
            qb.sql(),
            "SELECT id, content, created_at, updated_at FROM documents \
             WHERE collection = $1 ORDER BY content -> $2 ASC, created_at DESC, seq ASC LIMIT $3"
        );
    }

    #[test]
    fn zero_limit_is_not_emitted() {
        let qb = build_list_query("course", &ListQuery::new().limit(0));
        assert!(!qb.sql().contains("LIMIT"));
    }
}
