use anyhow::{Context, Result, anyhow};
use sqlx::{FromRow, SqlitePool};
use tracing::info;

use shared::types::{Role, UserSummary};

/// A credential record as stored.
#[derive(Debug, Clone)]
pub struct CredentialRecord {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl CredentialRecord {
    /// Everything except the password hash.
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            username: self.username.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// Data required to INSERT a new credential record. `password_hash` must
/// already be an argon2 PHC string.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

#[derive(FromRow)]
struct UserRow {
    id: String,
    username: String,
    password_hash: String,
    name: String,
    email: String,
    role: String,
}

impl TryFrom<UserRow> for CredentialRecord {
    type Error = anyhow::Error;

    fn try_from(row: UserRow) -> Result<Self> {
        let role = row
            .role
            .parse::<Role>()
            .map_err(|e| anyhow!("user {} has {}", row.username, e))?;

        Ok(Self {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            name: row.name,
            email: row.email,
            role,
        })
    }
}

/// Look up a credential record by username.
pub async fn find_by_username(
    pool: &SqlitePool,
    username: &str,
) -> Result<Option<CredentialRecord>> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, username, password_hash, name, email, role
         FROM users WHERE username = ?1",
    )
    .bind(username)
    .fetch_optional(pool)
    .await
    .context("Failed to query users")?;

    row.map(CredentialRecord::try_from).transpose()
}

/// Insert a credential record. Fails if the username is taken.
pub async fn insert_user(pool: &SqlitePool, user: NewUser) -> Result<CredentialRecord> {
    let id = uuid::Uuid::new_v4().to_string();
    let created_at = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        "INSERT INTO users (id, username, password_hash, name, email, role, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )
    .bind(&id)
    .bind(&user.username)
    .bind(&user.password_hash)
    .bind(&user.name)
    .bind(&user.email)
    .bind(user.role.as_str())
    .bind(&created_at)
    .execute(pool)
    .await
    .with_context(|| format!("Failed to insert user {}", user.username))?;

    info!("Created user: {} ({})", user.username, user.role);

    Ok(CredentialRecord {
        id,
        username: user.username,
        password_hash: user.password_hash,
        name: user.name,
        email: user.email,
        role: user.role,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
            name: "Registrar".to_string(),
            email: format!("{}@campus.edu", username),
            role: Role::Editor,
        }
    }

    #[tokio::test]
    async fn inserted_user_can_be_found() {
        let pool = test_pool().await;
        let created = insert_user(&pool, new_user("registrar")).await.unwrap();

        let found = find_by_username(&pool, "registrar").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.role, Role::Editor);
        assert_eq!(found.email, "registrar@campus.edu");
    }

    #[tokio::test]
    async fn unknown_user_is_none() {
        let pool = test_pool().await;
        assert!(find_by_username(&pool, "ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let pool = test_pool().await;
        insert_user(&pool, new_user("dup")).await.unwrap();
        assert!(insert_user(&pool, new_user("dup")).await.is_err());
    }

    #[tokio::test]
    async fn unknown_stored_role_is_an_error() {
        let pool = test_pool().await;
        sqlx::query(
            "INSERT INTO users (id, username, password_hash, name, email, role, created_at)
             VALUES ('1', 'odd', 'h', 'n', 'e', 'superuser', 'now')",
        )
        .execute(&pool)
        .await
        .unwrap();

        assert!(find_by_username(&pool, "odd").await.is_err());
    }

    #[test]
    fn summary_excludes_hash() {
        let record = CredentialRecord {
            id: "1".into(),
            username: "admin".into(),
            password_hash: "secret-hash".into(),
            name: "Admin".into(),
            email: "a@b.c".into(),
            role: Role::Admin,
        };
        let json = serde_json::to_string(&record.summary()).unwrap();
        assert!(!json.contains("secret-hash"));
    }
}
