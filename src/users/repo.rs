use sqlx::{Executor, Sqlite, SqlitePool};
use time::OffsetDateTime;

use crate::users::repo_types::{NewUser, User, UserChanges};

const COLUMNS: &str =
    "id, email, name, password_hash, is_active, is_staff, is_superuser, last_login, date_joined";

impl User {
    /// Find a user by exact email.
    pub async fn find_by_email(db: &SqlitePool, email: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE email = ?"))
            .bind(email)
            .fetch_optional(db)
            .await
    }

    pub async fn find_by_id(db: &SqlitePool, id: i64) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// Whether another account (not `except_id`) already uses `email`.
    pub async fn email_taken(
        db: &SqlitePool,
        email: &str,
        except_id: Option<i64>,
    ) -> sqlx::Result<bool> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = ? AND id IS NOT ?")
                .bind(email)
                .bind(except_id)
                .fetch_one(db)
                .await?;
        Ok(count > 0)
    }

    /// All users in admin changelist order.
    pub async fn list(db: &SqlitePool) -> sqlx::Result<Vec<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users ORDER BY id"))
            .fetch_all(db)
            .await
    }

    pub async fn insert(db: &SqlitePool, new: NewUser<'_>) -> sqlx::Result<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, name, password_hash, is_staff, is_superuser, date_joined)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(new.email)
        .bind(new.name)
        .bind(new.password_hash)
        .bind(new.is_staff)
        .bind(new.is_superuser)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(db)
        .await
    }

    pub async fn update<'e, E>(db: E, id: i64, changes: UserChanges<'_>) -> sqlx::Result<Option<User>>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET email = ?, name = ?, is_active = ?, is_staff = ?, is_superuser = ?
            WHERE id = ?
            RETURNING {COLUMNS}
            "#
        ))
        .bind(changes.email)
        .bind(changes.name)
        .bind(changes.is_active)
        .bind(changes.is_staff)
        .bind(changes.is_superuser)
        .bind(id)
        .fetch_optional(db)
        .await
    }

    pub async fn set_password_hash<'e, E>(db: E, id: i64, password_hash: &str) -> sqlx::Result<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }

    pub async fn touch_last_login(db: &SqlitePool, id: i64) -> sqlx::Result<()> {
        sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
            .bind(OffsetDateTime::now_utc())
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Remove the user; its token goes with it through the FK cascade.
    pub async fn delete(db: &SqlitePool, id: i64) -> sqlx::Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
