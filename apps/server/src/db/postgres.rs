//! PostgreSQL document store
//!
//! Every collection lives in one `documents` table keyed by `(collection, id)`
//! with the stored fields in a `jsonb` column. Filters compare `data -> field`
//! against a `jsonb` literal and cursors use a row comparison on
//! `(data -> order_field, id)`, which matches the `ORDER BY` used for reads.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::{postgres::PgPoolOptions, types::Json, PgPool, Postgres, QueryBuilder};
use std::time::Duration;
use uuid::Uuid;

use super::{
    query::{CollectionQuery, WriteBatch, WriteOp},
    traits::DocumentStore,
};
use crate::{
    config::DatabaseConfig,
    models::{Collection, Document, FilterOp, JsonMap, SortDirection},
    Error, Result,
};

type DocumentRow = (String, Json<JsonMap>);

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool for the configured database.
    pub async fn connect(config: &DatabaseConfig, url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .min_connections(config.pool_min_size)
            .max_connections(config.pool_max_size)
            .acquire_timeout(Duration::from_secs(config.pool_timeout_seconds))
            .connect(url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Apply pending schema migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(sqlx::Error::from)?;
        Ok(())
    }
}

fn into_document((id, Json(data)): DocumentRow) -> Document {
    Document::new(id, data)
}

/// Append the WHERE clause shared by count and find.
fn push_conditions(builder: &mut QueryBuilder<'_, Postgres>, query: &CollectionQuery, with_cursor: bool) {
    builder
        .push(" WHERE collection = ")
        .push_bind(query.collection.as_str().to_string());
    builder
        .push(" AND data ? ")
        .push_bind(query.order_by.clone());

    for filter in &query.filters {
        match filter.op {
            FilterOp::Eq => {
                builder
                    .push(" AND data -> ")
                    .push_bind(filter.field.clone())
                    .push(" = ")
                    .push_bind(Json(filter.value.clone()));
            }
        }
    }

    if !with_cursor {
        return;
    }
    if let Some(cursor) = &query.start_after {
        let cursor_value = cursor
            .field(&query.order_by)
            .cloned()
            .unwrap_or(JsonValue::Null);
        let comparison = match query.direction {
            SortDirection::Asc => ") > (",
            SortDirection::Desc => ") < (",
        };
        builder
            .push(" AND (data -> ")
            .push_bind(query.order_by.clone())
            .push(", id")
            .push(comparison)
            .push_bind(Json(cursor_value))
            .push(", ")
            .push_bind(cursor.id.clone())
            .push(")");
    }
}

#[async_trait]
impl DocumentStore for PostgresStore {
    async fn count(&self, query: &CollectionQuery) -> Result<u64> {
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM documents");
        push_conditions(&mut builder, query, false);

        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(count.max(0) as u64)
    }

    async fn find(&self, query: &CollectionQuery) -> Result<Vec<Document>> {
        let mut builder = QueryBuilder::new("SELECT id, data FROM documents");
        push_conditions(&mut builder, query, true);

        let direction = match query.direction {
            SortDirection::Asc => " ASC",
            SortDirection::Desc => " DESC",
        };
        builder
            .push(" ORDER BY data -> ")
            .push_bind(query.order_by.clone())
            .push(direction)
            .push(", id")
            .push(direction);

        if let Some(limit) = query.limit {
            builder
                .push(" LIMIT ")
                .push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        let rows: Vec<DocumentRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(rows.into_iter().map(into_document).collect())
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>> {
        let row: Option<DocumentRow> =
            sqlx::query_as("SELECT id, data FROM documents WHERE collection = $1 AND id = $2")
                .bind(collection.as_str())
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(Error::Database)?;
        Ok(row.map(into_document))
    }

    async fn insert(&self, collection: Collection, mut data: JsonMap) -> Result<Document> {
        data.remove("id");
        let id = Uuid::new_v4().simple().to_string();
        let row: DocumentRow = sqlx::query_as(
            "INSERT INTO documents (collection, id, data)
             VALUES ($1, $2, $3)
             RETURNING id, data",
        )
        .bind(collection.as_str())
        .bind(&id)
        .bind(Json(data))
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(into_document(row))
    }

    async fn update(&self, collection: Collection, id: &str, mut patch: JsonMap) -> Result<Document> {
        patch.remove("id");
        let row: Option<DocumentRow> = sqlx::query_as(
            "UPDATE documents
             SET data = data || $3, updated_at = NOW()
             WHERE collection = $1 AND id = $2
             RETURNING id, data",
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(Json(patch))
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.map(into_document)
            .ok_or_else(|| Error::record_not_found(collection.as_str(), id))
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<()> {
        let deleted = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?
            .rows_affected();

        if deleted == 0 {
            return Err(Error::record_not_found(collection.as_str(), id));
        }
        Ok(())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        for op in batch.ops {
            let affected = match &op {
                WriteOp::Update {
                    collection,
                    id,
                    patch,
                    expect,
                } => {
                    let mut patch = patch.clone();
                    patch.remove("id");
                    let mut builder = QueryBuilder::<Postgres>::new("UPDATE documents SET data = data || ");
                    builder
                        .push_bind(Json(patch))
                        .push(", updated_at = NOW() WHERE collection = ")
                        .push_bind(collection.as_str())
                        .push(" AND id = ")
                        .push_bind(id.clone());
                    // Row locks make concurrent guarded updates re-check these after waiting.
                    for (field, value) in expect {
                        builder
                            .push(" AND COALESCE(data -> ")
                            .push_bind(field.clone())
                            .push(", 'null'::jsonb) = ")
                            .push_bind(Json(value.clone()));
                    }
                    let affected = builder
                        .build()
                        .execute(&mut *tx)
                        .await
                        .map_err(Error::Database)?
                        .rows_affected();

                    if affected == 0 && !expect.is_empty() {
                        let exists: bool = sqlx::query_scalar(
                            "SELECT EXISTS (SELECT 1 FROM documents WHERE collection = $1 AND id = $2)",
                        )
                        .bind(collection.as_str())
                        .bind(id)
                        .fetch_one(&mut *tx)
                        .await
                        .map_err(Error::Database)?;
                        if exists {
                            return Err(Error::Conflict(format!(
                                "{}/{} changed concurrently",
                                collection, id
                            )));
                        }
                    }
                    affected
                }
                WriteOp::Delete { collection, id } => {
                    sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
                        .bind(collection.as_str())
                        .bind(id)
                        .execute(&mut *tx)
                        .await
                        .map_err(Error::Database)?
                        .rows_affected()
                }
            };

            if affected == 0 {
                // Dropping the transaction rolls back earlier ops.
                let (collection, id) = op.target();
                return Err(Error::record_not_found(collection.as_str(), id));
            }
        }

        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }
}
