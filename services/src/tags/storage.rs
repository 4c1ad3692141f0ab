use super::{Tag, TagChoice};
use crate::error::{StorageResultExt as _, StoreError};
use sqlx::{Connection as _, Executor, Sqlite, SqliteConnection};

//
// Registry
//

/// Returns the id of the tag called `name`, inserting it first if needed.
///
/// Runs as a single upsert on the caller's connection, so concurrent writers
/// that race on the same name both receive the one surviving row.
pub async fn resolve_or_create(conn: &mut SqliteConnection, name: &str) -> Result<i64, StoreError> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO tags (name)
        VALUES (?)
        ON CONFLICT(name) DO UPDATE SET name = excluded.name
        RETURNING id
        "#,
    )
    .bind(name)
    .fetch_one(conn)
    .await
    .during("resolving tag")
}

/// Deletes every tag that no post references any more.
pub async fn sweep_orphans<'e, E>(executor: E) -> Result<u64, StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        DELETE FROM tags
        WHERE NOT EXISTS (
            SELECT 1 FROM post_tags WHERE post_tags.tag_id = tags.id
        )
        "#,
    )
    .execute(executor)
    .await
    .during("sweeping orphan tags")?;

    Ok(result.rows_affected())
}

/// Sweeps orphans inside a savepoint of the caller's transaction.
///
/// A failing sweep is rolled back to the savepoint and logged; the
/// enclosing mutation carries on and still commits.
pub async fn sweep_orphans_best_effort(conn: &mut SqliteConnection) -> u64 {
    let attempt = async {
        let mut savepoint = conn.begin().await.during("opening sweep savepoint")?;
        let removed = sweep_orphans(&mut *savepoint).await?;
        savepoint
            .commit()
            .await
            .during("releasing sweep savepoint")?;
        Ok::<_, StoreError>(removed)
    };

    match attempt.await {
        Ok(removed) => {
            if removed > 0 {
                tracing::debug!(removed, "Swept orphan tags");
            }
            removed
        }
        Err(err) => {
            tracing::warn!(error = %err, "Orphan tag sweep failed, leaving cleanup for a later write");
            0
        }
    }
}

//
// Associations
//

/// Links `post_id` to every named tag, creating missing tags.
///
/// Empty names are skipped and repeated names collapse into one association.
/// Returns the number of associations actually inserted.
pub async fn link_all(
    conn: &mut SqliteConnection,
    post_id: i64,
    names: &[String],
) -> Result<u64, StoreError> {
    let mut linked = 0;
    for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
        let tag_id = resolve_or_create(&mut *conn, name).await?;
        let result = sqlx::query(
            r#"
            INSERT INTO post_tags (post_id, tag_id)
            VALUES (?, ?)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(post_id)
        .bind(tag_id)
        .execute(&mut *conn)
        .await
        .during("linking tag to post")?;
        linked += result.rows_affected();
    }
    Ok(linked)
}

/// Removes every association of `post_id`.
pub async fn unlink_all(conn: &mut SqliteConnection, post_id: i64) -> Result<u64, StoreError> {
    let result = sqlx::query("DELETE FROM post_tags WHERE post_id = ?")
        .bind(post_id)
        .execute(conn)
        .await
        .during("unlinking post tags")?;
    Ok(result.rows_affected())
}

//
// Reads
//

pub async fn tags_for_post<'e, E>(executor: E, post_id: i64) -> Result<Vec<Tag>, StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Tag>(
        r#"
        SELECT t.id, t.name
        FROM tags t
        INNER JOIN post_tags pt ON pt.tag_id = t.id
        WHERE pt.post_id = ?
        ORDER BY t.name
        "#,
    )
    .bind(post_id)
    .fetch_all(executor)
    .await
    .during("loading post tags")
}

/// All tags ordered by name, each marked when it appears in `selected`.
pub async fn list_all<'e, E>(executor: E, selected: &[String]) -> Result<Vec<TagChoice>, StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let tags = sqlx::query_as::<_, Tag>("SELECT id, name FROM tags ORDER BY name")
        .fetch_all(executor)
        .await
        .during("listing tags")?;

    Ok(tags
        .into_iter()
        .map(|tag| TagChoice {
            selected: selected.iter().any(|s| *s == tag.name),
            id: tag.id,
            name: tag.name,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::database::create_pool;
    use sqlx::SqlitePool;

    async fn setup() -> (SqlitePool, i64) {
        let pool = create_pool(&Config::new_for_test())
            .await
            .expect("pool should open");
        let post_id: i64 = sqlx::query_scalar(
            "INSERT INTO posts (title, content, post_time, uploader) VALUES ('p', '', '2024-01-01T00:00:00Z', 'u') RETURNING id",
        )
        .fetch_one(&pool)
        .await
        .expect("post insert should succeed");
        (pool, post_id)
    }

    async fn tag_count(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM tags")
            .fetch_one(pool)
            .await
            .expect("count should succeed")
    }

    #[tokio::test]
    async fn test_resolve_or_create_is_idempotent() {
        let (pool, _) = setup().await;
        let mut conn = pool.acquire().await.expect("acquire");

        let first = resolve_or_create(&mut conn, "rust").await.expect("insert");
        let second = resolve_or_create(&mut conn, "rust").await.expect("resolve");
        let other = resolve_or_create(&mut conn, "Rust").await.expect("insert");

        assert_eq!(first, second);
        assert_ne!(first, other);
    }

    #[tokio::test]
    async fn test_link_all_collapses_duplicates_and_skips_empty() {
        let (pool, post_id) = setup().await;
        let mut conn = pool.acquire().await.expect("acquire");
        let names = vec![
            "a".to_owned(),
            String::new(),
            "  ".to_owned(),
            "b".to_owned(),
            "a".to_owned(),
        ];

        let linked = link_all(&mut conn, post_id, &names).await.expect("link");
        drop(conn);

        assert_eq!(linked, 2);
        let tags = tags_for_post(&pool, post_id).await.expect("tags");
        let names: Vec<_> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_sweep_removes_only_orphans() {
        let (pool, post_id) = setup().await;
        let mut conn = pool.acquire().await.expect("acquire");
        link_all(&mut conn, post_id, &["kept".to_owned()])
            .await
            .expect("link");
        resolve_or_create(&mut conn, "orphan").await.expect("orphan");

        let removed = sweep_orphans(&mut *conn).await.expect("sweep");
        drop(conn);

        assert_eq!(removed, 1);
        assert_eq!(tag_count(&pool).await, 1);
    }

    #[tokio::test]
    async fn test_best_effort_sweep_inside_transaction() {
        let (pool, post_id) = setup().await;
        let mut tx = pool.begin().await.expect("begin");
        link_all(&mut tx, post_id, &["x".to_owned()]).await.expect("link");
        unlink_all(&mut tx, post_id).await.expect("unlink");

        let removed = sweep_orphans_best_effort(&mut tx).await;
        tx.commit().await.expect("commit");

        assert_eq!(removed, 1);
        assert_eq!(tag_count(&pool).await, 0);
    }

    #[tokio::test]
    async fn test_list_all_marks_selection() {
        let (pool, post_id) = setup().await;
        let mut conn = pool.acquire().await.expect("acquire");
        link_all(&mut conn, post_id, &["zig".to_owned(), "go".to_owned()])
            .await
            .expect("link");
        drop(conn);

        let choices = list_all(&pool, &["zig".to_owned()]).await.expect("list");

        let rendered: Vec<_> = choices
            .iter()
            .map(|c| (c.name.as_str(), c.selected))
            .collect();
        assert_eq!(rendered, vec![("go", false), ("zig", true)]);
    }
}
