//! Per-post view counter.

use sqlx::{Executor, Sqlite, SqlitePool};

use crate::error::{StorageResultExt as _, StoreError};

/// Adds one view to `post_id`. Returns false when the post does not exist.
pub async fn increment<'e, E>(executor: E, post_id: i64) -> Result<bool, StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("UPDATE posts SET views = views + 1 WHERE id = ?")
        .bind(post_id)
        .execute(executor)
        .await
        .during("incrementing views")?;
    Ok(result.rows_affected() == 1)
}

/// Best-effort increment: failures are logged and dropped.
pub async fn record_view(pool: &SqlitePool, post_id: i64) {
    match increment(pool, post_id).await {
        Ok(true) => {}
        Ok(false) => tracing::debug!(post_id, "View recorded for missing post"),
        Err(err) => tracing::warn!(post_id, error = %err, "Failed to record view"),
    }
}
