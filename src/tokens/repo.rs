use rand::{rngs::OsRng, RngCore};
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use time::OffsetDateTime;

/// Opaque API credential; one per user.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AuthToken {
    pub token: String,
    pub user_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// 20 random bytes as 40 lowercase hex characters.
pub fn generate_key() -> String {
    let mut bytes = [0u8; 20];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

impl AuthToken {
    /// Return the user's token, creating it on first use.
    ///
    /// Concurrent callers for the same user all end up with the row that won the insert.
    pub async fn get_or_create(db: &SqlitePool, user_id: i64) -> sqlx::Result<AuthToken> {
        sqlx::query(
            r#"
            INSERT INTO auth_tokens (token, user_id, created_at)
            VALUES (?, ?, ?)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(generate_key())
        .bind(user_id)
        .bind(OffsetDateTime::now_utc())
        .execute(db)
        .await?;

        sqlx::query_as::<_, AuthToken>(
            "SELECT token, user_id, created_at FROM auth_tokens WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_one(db)
        .await
    }

    pub async fn find(db: &SqlitePool, token: &str) -> sqlx::Result<Option<AuthToken>> {
        sqlx::query_as::<_, AuthToken>(
            "SELECT token, user_id, created_at FROM auth_tokens WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(db)
        .await
    }

    pub async fn for_user(db: &SqlitePool, user_id: i64) -> sqlx::Result<Option<AuthToken>> {
        sqlx::query_as::<_, AuthToken>(
            "SELECT token, user_id, created_at FROM auth_tokens WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(db)
        .await
    }
}
