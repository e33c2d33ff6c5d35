use sqlx::SqlitePool;
use tracing::info;

/// Create the credential and document tables if they do not exist yet.
pub async fn create_tables(pool: &SqlitePool) -> sqlx::Result<()> {
    // Credential store. Written only by the `add-user` command; the server
    // reads it during login.
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            id            TEXT    PRIMARY KEY,
            username      TEXT    NOT NULL UNIQUE,
            password_hash TEXT    NOT NULL,
            name          TEXT    NOT NULL,
            email         TEXT    NOT NULL,
            role          TEXT    NOT NULL,
            created_at    TEXT    NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    // Document store: one row per document, body is a JSON object.
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS documents (
            id          TEXT    PRIMARY KEY,
            collection  TEXT    NOT NULL,
            body        TEXT    NOT NULL,
            created_at  INTEGER NOT NULL,
            updated_at  INTEGER NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_documents_collection
            ON documents(collection, created_at)",
    )
    .execute(pool)
    .await?;

    info!("Database schema ready");
    Ok(())
}
