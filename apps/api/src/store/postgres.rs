//! Postgres-backed document store.
//!
//! All collections share one `documents` table with a JSONB body. Equality
//! filters are pushed down as a JSONB containment check (`data @> $filter`),
//! and a `WriteBatch` runs inside a single transaction.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{FromRow, PgConnection, PgPool};
use tracing::debug;

use super::{
    new_document_id, Document, DocumentStore, Fields, Filter, StoreError, WriteBatch, WriteOp,
};

const INSERT_SQL: &str = "INSERT INTO documents (collection, id, data) VALUES ($1, $2, $3)";
const UPDATE_SQL: &str =
    "UPDATE documents SET data = data || $3, updated_at = NOW() WHERE collection = $1 AND id = $2";
const DELETE_SQL: &str = "DELETE FROM documents WHERE collection = $1 AND id = $2";

#[derive(Debug, FromRow)]
struct DocumentRow {
    id: String,
    data: Value,
}

#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies pending migrations from `migrations/`.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn into_document(collection: &str, row: DocumentRow) -> Result<Document, StoreError> {
    match row.data {
        Value::Object(data) => Ok(Document { id: row.id, data }),
        _ => Err(StoreError::Corrupt {
            collection: collection.to_string(),
            id: row.id,
        }),
    }
}

/// `LIMIT NULL` is `LIMIT ALL` in Postgres; oversized limits saturate.
fn sql_limit(limit: Option<usize>) -> Option<i64> {
    limit.map(|l| i64::try_from(l).unwrap_or(i64::MAX))
}

fn filter_object(filters: &[Filter]) -> Value {
    let map: Fields = filters
        .iter()
        .map(|f| (f.field.clone(), f.value.clone()))
        .collect();
    Value::Object(map)
}

async fn apply_op(conn: &mut PgConnection, op: WriteOp) -> Result<(), StoreError> {
    match op {
        WriteOp::Set {
            collection,
            id,
            data,
        } => {
            sqlx::query(INSERT_SQL)
                .bind(&collection)
                .bind(&id)
                .bind(Value::Object(data))
                .execute(&mut *conn)
                .await?;
        }
        WriteOp::Update {
            collection,
            id,
            patch,
        } => {
            let result = sqlx::query(UPDATE_SQL)
                .bind(&collection)
                .bind(&id)
                .bind(Value::Object(patch))
                .execute(&mut *conn)
                .await?;
            if result.rows_affected() == 0 {
                return Err(StoreError::NotFound { collection, id });
            }
        }
    }
    Ok(())
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let row: Option<DocumentRow> =
            sqlx::query_as("SELECT id, data FROM documents WHERE collection = $1 AND id = $2")
                .bind(collection)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(|r| into_document(collection, r)).transpose()
    }

    async fn query(
        &self,
        collection: &str,
        filters: &[Filter],
        limit: Option<usize>,
    ) -> Result<Vec<Document>, StoreError> {
        let rows: Vec<DocumentRow> = sqlx::query_as(
            r#"
            SELECT id, data
            FROM documents
            WHERE collection = $1 AND data @> $2
            ORDER BY created_at
            LIMIT $3
            "#,
        )
        .bind(collection)
        .bind(filter_object(filters))
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|r| into_document(collection, r))
            .collect()
    }

    async fn add(&self, collection: &str, data: Fields) -> Result<String, StoreError> {
        let id = new_document_id();
        sqlx::query(INSERT_SQL)
            .bind(collection)
            .bind(&id)
            .bind(Value::Object(data))
            .execute(&self.pool)
            .await?;
        debug!("Inserted {collection}/{id}");
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, patch: Fields) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await?;
        apply_op(
            &mut conn,
            WriteOp::Update {
                collection: collection.to_string(),
                id: id.to_string(),
                patch,
            },
        )
        .await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        sqlx::query(DELETE_SQL)
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }
        let ops = batch.into_ops();
        let count = ops.len();

        let mut tx = self.pool.begin().await?;
        for op in ops {
            apply_op(&mut tx, op).await?;
        }
        tx.commit().await?;

        debug!("Committed batch of {count} writes");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_object_combines_filters() {
        let filters = [Filter::eq("userId", "u1"), Filter::eq("status", "active")];
        assert_eq!(
            filter_object(&filters),
            json!({"userId": "u1", "status": "active"})
        );
    }

    #[test]
    fn test_sql_limit_saturates() {
        assert_eq!(sql_limit(None), None);
        assert_eq!(sql_limit(Some(10)), Some(10));
        assert_eq!(sql_limit(Some(usize::MAX)), Some(i64::MAX));
    }

    #[test]
    fn test_empty_filters_match_everything() {
        assert_eq!(filter_object(&[]), json!({}));
    }

    #[test]
    fn test_non_object_row_is_corrupt() {
        let row = DocumentRow {
            id: "x".into(),
            data: json!([1, 2]),
        };
        assert!(matches!(
            into_document("c", row),
            Err(StoreError::Corrupt { .. })
        ));
    }
}
