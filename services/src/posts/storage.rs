use super::{ListFilter, NewPost, Post, PostEdit, PostSummary};
use crate::comments::storage as comment_storage;
use crate::database::with_transaction;
use crate::error::{StorageResultExt as _, StoreError, is_unique_violation};
use crate::query::{ListingTagsQuery, PostQuery};
use crate::tags::storage as tag_storage;
use sqlx::{Executor, Sqlite, SqlitePool};

fn require_title(title: &str) -> Result<(), StoreError> {
    if title.trim().is_empty() {
        return Err(StoreError::Validation("post title is empty".to_owned()));
    }
    Ok(())
}

//
// Writes
//

/// Inserts a post and links its tags in one transaction.
///
/// The insert doubles as the uniqueness check: a taken title yields no row
/// and the whole transaction is rolled back with `AlreadyExists`.
pub async fn create(pool: &SqlitePool, post: NewPost) -> Result<i64, StoreError> {
    require_title(&post.title)?;

    let post_id = with_transaction(pool, "create post", move |tx| {
        Box::pin(async move {
            let post_id = sqlx::query_scalar::<_, i64>(
                r#"
                INSERT INTO posts
                    (title, content, post_time, image, thumbnail, uploader, unlisted, link_post, url_link)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(title) DO NOTHING
                RETURNING id
                "#,
            )
            .bind(&post.title)
            .bind(&post.content)
            .bind(post.post_time)
            .bind(&post.image.image)
            .bind(&post.image.thumbnail)
            .bind(&post.uploader)
            .bind(post.unlisted)
            .bind(post.link_post)
            .bind(&post.url_link)
            .fetch_optional(&mut **tx)
            .await
            .during("inserting post")?
            .ok_or_else(|| StoreError::AlreadyExists(format!("post '{}'", post.title)))?;

            let linked = tag_storage::link_all(&mut **tx, post_id, &post.tags).await?;
            tracing::info!(post_id, title = %post.title, tags = linked, "Post created");
            Ok(post_id)
        })
    })
    .await?;

    Ok(post_id)
}

/// Rewrites a post's fields and replaces its whole tag set.
pub async fn edit(pool: &SqlitePool, edit: PostEdit) -> Result<(), StoreError> {
    require_title(&edit.new_title)?;

    with_transaction(pool, "edit post", move |tx| {
        Box::pin(async move {
            let (image, thumbnail) = match edit.image {
                Some(image) => (Some(image.image), Some(image.thumbnail)),
                None => (None, None),
            };

            let post_id = sqlx::query_scalar::<_, i64>(
                r#"
                UPDATE posts
                SET title = ?,
                    content = ?,
                    post_time = COALESCE(?, post_time),
                    unlisted = ?,
                    link_post = ?,
                    url_link = ?,
                    image = COALESCE(?, image),
                    thumbnail = COALESCE(?, thumbnail)
                WHERE title = ?
                RETURNING id
                "#,
            )
            .bind(&edit.new_title)
            .bind(&edit.content)
            .bind(edit.post_time)
            .bind(edit.unlisted)
            .bind(edit.link_post)
            .bind(&edit.url_link)
            .bind(image)
            .bind(thumbnail)
            .bind(&edit.original_title)
            .fetch_optional(&mut **tx)
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    StoreError::AlreadyExists(format!("post '{}'", edit.new_title))
                } else {
                    StoreError::Storage {
                        context: "updating post",
                        source: err,
                    }
                }
            })?
            .ok_or_else(|| StoreError::NotFound(format!("post '{}'", edit.original_title)))?;

            tag_storage::unlink_all(&mut **tx, post_id).await?;
            let linked = tag_storage::link_all(&mut **tx, post_id, &edit.tags).await?;
            tag_storage::sweep_orphans_best_effort(&mut **tx).await;

            tracing::info!(
                post_id,
                title = %edit.new_title,
                renamed = edit.original_title != edit.new_title,
                tags = linked,
                "Post edited"
            );
            Ok(())
        })
    })
    .await
}

/// Deletes a post with its associations, then sweeps orphaned tags.
///
/// Comments go with the post through the foreign key cascade.
pub async fn delete(pool: &SqlitePool, title: &str) -> Result<(), StoreError> {
    let title = title.to_owned();

    with_transaction(pool, "delete post", move |tx| {
        Box::pin(async move {
            sqlx::query(
                r#"
                DELETE FROM post_tags
                WHERE post_id IN (SELECT id FROM posts WHERE title = ?)
                "#,
            )
            .bind(&title)
            .execute(&mut **tx)
            .await
            .during("deleting post tags")?;

            let result = sqlx::query("DELETE FROM posts WHERE title = ?")
                .bind(&title)
                .execute(&mut **tx)
                .await
                .during("deleting post")?;
            if result.rows_affected() == 0 {
                return Err(StoreError::NotFound(format!("post '{title}'")));
            }

            let swept = tag_storage::sweep_orphans_best_effort(&mut **tx).await;
            tracing::info!(title = %title, swept_tags = swept, "Post deleted");
            Ok(())
        })
    })
    .await
}

//
// Reads
//

/// Loads a post with its tags and comments from one snapshot.
pub async fn get(pool: &SqlitePool, title: &str) -> Result<Post, StoreError> {
    let mut tx = pool.begin().await.during("beginning read")?;

    let mut post = sqlx::query_as::<_, Post>(
        r#"
        SELECT id, title, content, post_time, image, thumbnail, uploader,
               unlisted, views, link_post, url_link
        FROM posts
        WHERE title = ?
        "#,
    )
    .bind(title)
    .fetch_optional(&mut *tx)
    .await
    .during("loading post")?
    .ok_or_else(|| StoreError::NotFound(format!("post '{title}'")))?;

    post.tags = tag_storage::tags_for_post(&mut *tx, post.id).await?;
    post.comments = comment_storage::list_for_post(&mut *tx, post.id).await?;
    tx.commit().await.during("ending read")?;

    Ok(post)
}

/// The uploader of `title`, for callers deciding whether an edit is allowed.
pub async fn uploader_of<'e, E>(executor: E, title: &str) -> Result<String, StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar::<_, String>("SELECT uploader FROM posts WHERE title = ?")
        .bind(title)
        .fetch_optional(executor)
        .await
        .during("loading post uploader")?
        .ok_or_else(|| StoreError::NotFound(format!("post '{title}'")))
}

pub async fn id_for_title<'e, E>(executor: E, title: &str) -> Result<i64, StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_scalar::<_, i64>("SELECT id FROM posts WHERE title = ?")
        .bind(title)
        .fetch_optional(executor)
        .await
        .during("loading post id")?
        .ok_or_else(|| StoreError::NotFound(format!("post '{title}'")))
}

/// Post summaries, newest first, each carrying its tags.
pub async fn list(pool: &SqlitePool, filter: &ListFilter) -> Result<Vec<PostSummary>, StoreError> {
    let mut tx = pool.begin().await.during("beginning read")?;

    let mut posts = PostQuery::summaries()
        .tagged(filter.tag.as_deref())
        .include_unlisted(filter.include_unlisted)
        .newest_first()
        .fetch_all(&mut *tx)
        .await?;

    if !posts.is_empty() {
        let mut tags = ListingTagsQuery::new(filter.tag.as_deref(), filter.include_unlisted)
            .fetch_grouped(&mut *tx)
            .await?;
        for post in &mut posts {
            post.tags = tags.remove(&post.id).unwrap_or_default();
        }
    }
    tx.commit().await.during("ending read")?;

    Ok(posts)
}
