use sqlx::SqlitePool;

/// Row in the `users` table. `refresh_token` is a single slot: the only
/// refresh token currently accepted for this user, or NULL when logged out.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub refresh_token: Option<String>,
}

impl User {
    pub async fn create(
        pool: &SqlitePool,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash)
            VALUES (?, ?, ?)
            RETURNING id, name, email, password_hash, refresh_token
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_email(
        pool: &SqlitePool,
        email: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, refresh_token
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, refresh_token
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Overwrite the refresh-token slot. Passing `None` clears it (logout);
    /// passing a new token supersedes whatever was stored before.
    pub async fn set_refresh_token(
        pool: &SqlitePool,
        id: i64,
        token: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET refresh_token = ? WHERE id = ?")
            .bind(token)
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }
}
