use super::Comment;
use crate::error::{StorageResultExt as _, StoreError, is_foreign_key_violation};
use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite, SqlitePool};

/// Adds a comment stamped with the current time.
///
/// An absent or empty `author` is stored as NULL.
pub async fn add(
    pool: &SqlitePool,
    post_id: i64,
    author: Option<&str>,
    content: &str,
) -> Result<i64, StoreError> {
    insert_at(pool, post_id, author, content, Utc::now()).await
}

/// Adds a comment with an explicit timestamp.
pub async fn insert_at(
    pool: &SqlitePool,
    post_id: i64,
    author: Option<&str>,
    content: &str,
    post_time: DateTime<Utc>,
) -> Result<i64, StoreError> {
    if content.trim().is_empty() {
        return Err(StoreError::Validation("comment content is empty".to_owned()));
    }
    let author = author.filter(|name| !name.is_empty());

    let result = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO comments (post_id, username, content, post_time)
        VALUES (?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(post_id)
    .bind(author)
    .bind(content)
    .bind(post_time)
    .fetch_one(pool)
    .await;

    match result {
        Ok(id) => {
            tracing::debug!(post_id, comment_id = id, anonymous = author.is_none(), "Comment added");
            Ok(id)
        }
        Err(err) if is_foreign_key_violation(&err) => Err(missing_parent(pool, post_id, author).await),
        Err(err) => Err(StoreError::Storage {
            context: "inserting comment",
            source: err,
        }),
    }
}

/// Names the missing row behind a rejected comment insert.
async fn missing_parent(pool: &SqlitePool, post_id: i64, author: Option<&str>) -> StoreError {
    let post_exists = match sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM posts WHERE id = ?)")
        .bind(post_id)
        .fetch_one(pool)
        .await
    {
        Ok(exists) => exists,
        Err(err) => {
            tracing::warn!(post_id, error = %err, "Could not tell which comment parent is missing");
            false
        }
    };

    match author {
        Some(name) if post_exists => StoreError::NotFound(format!("account '{name}'")),
        _ => StoreError::NotFound(format!("post {post_id}")),
    }
}

/// Comments on a post, newest first.
pub async fn list_for_post<'e, E>(executor: E, post_id: i64) -> Result<Vec<Comment>, StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Comment>(
        r#"
        SELECT id, post_id, username, content, post_time
        FROM comments
        WHERE post_id = ?
        ORDER BY post_time DESC, id DESC
        "#,
    )
    .bind(post_id)
    .fetch_all(executor)
    .await
    .during("loading comments")
}
