use serde_json::{Map, Value};
use sqlx::{Row, SqlitePool};
use thiserror::Error;
use tracing::debug;

use shared::types::Collection;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("stored document is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
}

pub type DocumentResult<T> = Result<T, DocumentError>;

fn millis_now() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn rfc3339_now() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn decode_body(id: String, body: &str) -> DocumentResult<Value> {
    let mut doc: Map<String, Value> = serde_json::from_str(body)?;
    doc.insert("_id".to_string(), Value::String(id));
    Ok(Value::Object(doc))
}

/// All documents in a collection, oldest first, each carrying its `_id`.
pub async fn list(pool: &SqlitePool, collection: Collection) -> DocumentResult<Vec<Value>> {
    let rows = sqlx::query(
        "SELECT id, body FROM documents
         WHERE collection = ?1
         ORDER BY created_at ASC, id ASC",
    )
    .bind(collection.name())
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| -> DocumentResult<Value> {
            let id: String = row.try_get("id")?;
            let body: String = row.try_get("body")?;
            decode_body(id, &body)
        })
        .collect()
}

/// Store a new document and return its id. Any client-supplied `_id` is
/// discarded; `createdAt` and `updatedAt` are stamped here.
pub async fn insert(
    pool: &SqlitePool,
    collection: Collection,
    mut doc: Map<String, Value>,
) -> DocumentResult<String> {
    let id = uuid::Uuid::new_v4().to_string();
    let stamp = rfc3339_now();
    let now = millis_now();

    doc.remove("_id");
    doc.insert("createdAt".to_string(), Value::String(stamp.clone()));
    doc.insert("updatedAt".to_string(), Value::String(stamp));

    sqlx::query(
        "INSERT INTO documents (id, collection, body, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(&id)
    .bind(collection.name())
    .bind(serde_json::to_string(&doc)?)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    debug!("Inserted {} document {}", collection.name(), id);
    Ok(id)
}

/// Merge `patch` into the stored document's top-level fields.
/// Returns `false` when no document with `id` exists in `collection`.
pub async fn update(
    pool: &SqlitePool,
    collection: Collection,
    id: &str,
    patch: Map<String, Value>,
) -> DocumentResult<bool> {
    let mut tx = pool.begin().await?;

    let existing: Option<String> =
        sqlx::query_scalar("SELECT body FROM documents WHERE id = ?1 AND collection = ?2")
            .bind(id)
            .bind(collection.name())
            .fetch_optional(&mut *tx)
            .await?;

    let Some(body) = existing else {
        return Ok(false);
    };

    let mut doc: Map<String, Value> = serde_json::from_str(&body)?;
    for (key, value) in patch {
        if key == "_id" || key == "createdAt" {
            continue;
        }
        doc.insert(key, value);
    }
    doc.insert("updatedAt".to_string(), Value::String(rfc3339_now()));

    sqlx::query("UPDATE documents SET body = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(serde_json::to_string(&doc)?)
        .bind(millis_now())
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    debug!("Updated {} document {}", collection.name(), id);
    Ok(true)
}

/// Returns `false` when nothing matched.
pub async fn delete(pool: &SqlitePool, collection: Collection, id: &str) -> DocumentResult<bool> {
    let result = sqlx::query("DELETE FROM documents WHERE id = ?1 AND collection = ?2")
        .bind(id)
        .bind(collection.name())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Whether any document in `collection` has top-level `field` equal to the
/// string `value`.
pub async fn exists_with_field(
    pool: &SqlitePool,
    collection: Collection,
    field: &str,
    value: &str,
) -> DocumentResult<bool> {
    let found: Option<i64> = sqlx::query_scalar(
        "SELECT 1 FROM documents
         WHERE collection = ?1 AND json_extract(body, ?2) = ?3
         LIMIT 1",
    )
    .bind(collection.name())
    .bind(format!("$.{}", field))
    .bind(value)
    .fetch_optional(pool)
    .await?;

    Ok(found.is_some())
}
