use serde::Serialize;
use sqlx::SqlitePool;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub completed: bool,
    pub created_at: String,
}

impl Task {
    pub async fn create(
        pool: &SqlitePool,
        user_id: i64,
        title: &str,
    ) -> Result<Task, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (user_id, title)
            VALUES (?, ?)
            RETURNING id, user_id, title, completed, created_at
            "#,
        )
        .bind(user_id)
        .bind(title)
        .fetch_one(pool)
        .await
    }

    pub async fn list_for_user(
        pool: &SqlitePool,
        user_id: i64,
    ) -> Result<Vec<Task>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, user_id, title, completed, created_at
            FROM tasks
            WHERE user_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Update is scoped to the owning user; a foreign or unknown id updates
    /// nothing and returns `None`.
    pub async fn update(
        pool: &SqlitePool,
        user_id: i64,
        id: i64,
        title: Option<&str>,
        completed: Option<bool>,
    ) -> Result<Option<Task>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET title = COALESCE(?, title),
                completed = COALESCE(?, completed)
            WHERE id = ? AND user_id = ?
            RETURNING id, user_id, title, completed, created_at
            "#,
        )
        .bind(title)
        .bind(completed)
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, user_id: i64, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
