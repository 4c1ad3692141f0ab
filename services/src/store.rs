//! Content store trait and its SQLite implementation.
//!
//! [`ContentStore`] is the seam the policy layer is written against. It
//! bundles the post, comment, tag and navigation operations behind one
//! cloneable handle.
//!
//! ```rust,ignore
//! use blog_services::{ContentStore, ListFilter, StoreError};
//!
//! async fn titles<S: ContentStore>(store: &S) -> Result<Vec<String>, StoreError> {
//!     let posts = store.list_posts(&ListFilter::all()).await?;
//!     Ok(posts.into_iter().map(|p| p.title).collect())
//! }
//! ```

use std::future::Future;

use sqlx::SqlitePool;

use crate::comments::{Comment, storage as comment_storage};
use crate::config::Config;
use crate::database::create_pool;
use crate::error::StoreError;
use crate::navigation::{self, Adjacent};
use crate::posts::{ListFilter, NewPost, Post, PostEdit, PostSummary, storage as post_storage};
use crate::tags::{TagChoice, storage as tag_storage};
use crate::views;

/// Operations over posts, tags, comments and navigation.
///
/// Every write is atomic: it either fully applies or leaves the store as it
/// was. Implementations must be cheap to clone and safe to share across
/// tasks.
pub trait ContentStore: Clone + Send + Sync + 'static {
    /// Creates a post and links its tags.
    ///
    /// # Errors
    ///
    /// - `AlreadyExists` if another post already has this title
    /// - `Validation` if the title is empty
    /// - `Storage` for database failures
    fn create_post(&self, post: NewPost) -> impl Future<Output = Result<i64, StoreError>> + Send;

    /// Rewrites a post, replacing its entire tag set.
    ///
    /// # Errors
    ///
    /// - `NotFound` if `original_title` does not exist
    /// - `AlreadyExists` if `new_title` belongs to another post
    fn edit_post(&self, edit: PostEdit) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Deletes a post, its associations and comments, then sweeps orphan tags.
    fn delete_post(&self, title: &str) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Loads a post with tags and comments.
    fn get_post(&self, title: &str) -> impl Future<Output = Result<Post, StoreError>> + Send;

    /// Lists post summaries newest first.
    fn list_posts(
        &self,
        filter: &ListFilter,
    ) -> impl Future<Output = Result<Vec<PostSummary>, StoreError>> + Send;

    /// Returns who uploaded `title`, so callers can authorize edits.
    fn uploader_of(&self, title: &str) -> impl Future<Output = Result<String, StoreError>> + Send;

    /// Best-effort view increment; never fails.
    fn increment_views(&self, post_id: i64) -> impl Future<Output = ()> + Send;

    /// Adds a comment. `None` or an empty author means anonymous.
    fn add_comment(
        &self,
        post_id: i64,
        author: Option<&str>,
        content: &str,
    ) -> impl Future<Output = Result<i64, StoreError>> + Send;

    /// Comments on a post, newest first.
    fn comments_for(
        &self,
        post_id: i64,
    ) -> impl Future<Output = Result<Vec<Comment>, StoreError>> + Send;

    /// Neighbours of `title`, optionally restricted to posts tagged `scope`.
    fn adjacent(
        &self,
        title: &str,
        scope: Option<&str>,
    ) -> impl Future<Output = Result<Adjacent, StoreError>> + Send;

    /// All tags ordered by name, marked against `selected`.
    fn list_tags(
        &self,
        selected: &[String],
    ) -> impl Future<Output = Result<Vec<TagChoice>, StoreError>> + Send;

    /// Removes tags no post references. Returns how many were removed.
    fn sweep_orphan_tags(&self) -> impl Future<Output = Result<u64, StoreError>> + Send;
}

/// SQLite-backed content store.
#[derive(Clone, Debug)]
pub struct SqliteContentStore {
    pool: SqlitePool,
}

impl SqliteContentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens a pool for `config` and migrates it.
    pub async fn connect(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(create_pool(config).await?))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl ContentStore for SqliteContentStore {
    async fn create_post(&self, post: NewPost) -> Result<i64, StoreError> {
        post_storage::create(&self.pool, post).await
    }

    async fn edit_post(&self, edit: PostEdit) -> Result<(), StoreError> {
        post_storage::edit(&self.pool, edit).await
    }

    async fn delete_post(&self, title: &str) -> Result<(), StoreError> {
        post_storage::delete(&self.pool, title).await
    }

    async fn get_post(&self, title: &str) -> Result<Post, StoreError> {
        post_storage::get(&self.pool, title).await
    }

    async fn list_posts(&self, filter: &ListFilter) -> Result<Vec<PostSummary>, StoreError> {
        post_storage::list(&self.pool, filter).await
    }

    async fn uploader_of(&self, title: &str) -> Result<String, StoreError> {
        post_storage::uploader_of(&self.pool, title).await
    }

    async fn increment_views(&self, post_id: i64) {
        views::record_view(&self.pool, post_id).await;
    }

    async fn add_comment(
        &self,
        post_id: i64,
        author: Option<&str>,
        content: &str,
    ) -> Result<i64, StoreError> {
        comment_storage::add(&self.pool, post_id, author, content).await
    }

    async fn comments_for(&self, post_id: i64) -> Result<Vec<Comment>, StoreError> {
        comment_storage::list_for_post(&self.pool, post_id).await
    }

    async fn adjacent(&self, title: &str, scope: Option<&str>) -> Result<Adjacent, StoreError> {
        navigation::adjacent(&self.pool, title, scope).await
    }

    async fn list_tags(&self, selected: &[String]) -> Result<Vec<TagChoice>, StoreError> {
        tag_storage::list_all(&self.pool, selected).await
    }

    async fn sweep_orphan_tags(&self) -> Result<u64, StoreError> {
        let removed = tag_storage::sweep_orphans(&self.pool).await?;
        tracing::info!(removed, "Orphan tag sweep finished");
        Ok(removed)
    }
}
