//! Composable read queries over posts.
//!
//! Scoped and unscoped reads go through the same builder; the tag scope only
//! appends one `EXISTS` predicate and one bound parameter.

use sqlx::{Executor, QueryBuilder, Sqlite};

use std::collections::HashMap;

use crate::error::{StorageResultExt as _, StoreError};
use crate::posts::PostSummary;
use crate::tags::Tag;

const SUMMARY_COLUMNS: &str = "p.id, p.title, p.post_time, p.thumbnail, p.uploader, \
     p.unlisted, p.views, p.link_post, p.url_link";

/// Treats an empty scope the same as no scope.
pub fn normalize_scope(scope: Option<&str>) -> Option<&str> {
    scope.filter(|tag| !tag.is_empty())
}

/// Appends `AND EXISTS (...)` restricting `alias` to posts carrying `tag`.
pub fn push_tag_scope<'a>(builder: &mut QueryBuilder<'a, Sqlite>, alias: &str, tag: &'a str) {
    builder.push(
        " AND EXISTS (SELECT 1 FROM post_tags pt INNER JOIN tags t ON t.id = pt.tag_id WHERE pt.post_id = ",
    );
    builder.push(alias);
    builder.push(".id AND t.name = ");
    builder.push_bind(tag);
    builder.push(")");
}

fn push_scope<'a>(builder: &mut QueryBuilder<'a, Sqlite>, scope: Option<&'a str>) {
    if let Some(tag) = normalize_scope(scope) {
        push_tag_scope(builder, "p", tag);
    }
}

fn push_visibility(builder: &mut QueryBuilder<'_, Sqlite>, include_unlisted: bool) {
    if !include_unlisted {
        builder.push(" AND p.unlisted = 0");
    }
}

/// Listing query over post summaries.
pub struct PostQuery<'a> {
    builder: QueryBuilder<'a, Sqlite>,
}

impl<'a> PostQuery<'a> {
    pub fn summaries() -> Self {
        let mut builder = QueryBuilder::new("SELECT ");
        builder.push(SUMMARY_COLUMNS);
        builder.push(" FROM posts p WHERE 1 = 1");
        Self { builder }
    }

    pub fn tagged(mut self, scope: Option<&'a str>) -> Self {
        push_scope(&mut self.builder, scope);
        self
    }

    pub fn include_unlisted(mut self, include: bool) -> Self {
        push_visibility(&mut self.builder, include);
        self
    }

    pub fn newest_first(mut self) -> Self {
        self.builder.push(" ORDER BY p.post_time DESC, p.id DESC");
        self
    }

    pub fn sql(&self) -> &str {
        self.builder.sql()
    }

    pub async fn fetch_all<'c, E>(mut self, executor: E) -> Result<Vec<PostSummary>, StoreError>
    where
        E: Executor<'c, Database = Sqlite>,
    {
        self.builder
            .build_query_as::<PostSummary>()
            .fetch_all(executor)
            .await
            .during("listing posts")
    }
}

/// Tags of every post a listing with the same filters selects.
///
/// The posts are picked by a subquery rather than a list of bound ids, so the
/// statement size does not grow with the listing.
pub struct ListingTagsQuery<'a> {
    builder: QueryBuilder<'a, Sqlite>,
}

impl<'a> ListingTagsQuery<'a> {
    pub fn new(scope: Option<&'a str>, include_unlisted: bool) -> Self {
        let mut builder = QueryBuilder::new(
            "SELECT lt.post_id, tg.id, tg.name FROM post_tags lt \
             INNER JOIN tags tg ON tg.id = lt.tag_id \
             WHERE lt.post_id IN (SELECT p.id FROM posts p WHERE 1 = 1",
        );
        push_scope(&mut builder, scope);
        push_visibility(&mut builder, include_unlisted);
        builder.push(") ORDER BY tg.name");
        Self { builder }
    }

    pub fn sql(&self) -> &str {
        self.builder.sql()
    }

    /// Runs the query and groups the tags by post id, each group ordered by name.
    pub async fn fetch_grouped<'c, E>(mut self, executor: E) -> Result<HashMap<i64, Vec<Tag>>, StoreError>
    where
        E: Executor<'c, Database = Sqlite>,
    {
        let rows: Vec<(i64, i64, String)> = self
            .builder
            .build_query_as()
            .fetch_all(executor)
            .await
            .during("loading listing tags")?;

        let mut grouped: HashMap<i64, Vec<Tag>> = HashMap::new();
        for (post_id, id, name) in rows {
            grouped.entry(post_id).or_default().push(Tag { id, name });
        }
        Ok(grouped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unscoped_query_has_no_tag_predicate() {
        let query = PostQuery::summaries()
            .tagged(None)
            .include_unlisted(true)
            .newest_first();
        assert!(!query.sql().contains("EXISTS"));
        assert!(query.sql().ends_with("ORDER BY p.post_time DESC, p.id DESC"));
    }

    #[test]
    fn test_empty_scope_is_unscoped() {
        let query = PostQuery::summaries().tagged(Some(""));
        assert!(!query.sql().contains("EXISTS"));
        assert_eq!(normalize_scope(Some("")), None);
        assert_eq!(normalize_scope(Some("x")), Some("x"));
    }

    #[test]
    fn test_scoped_query_binds_tag() {
        let query = PostQuery::summaries()
            .tagged(Some("rust"))
            .include_unlisted(false);
        let sql = query.sql();
        assert!(sql.contains("pt.post_id = p.id AND t.name = ?"));
        assert!(sql.contains("p.unlisted = 0"));
        assert!(!sql.contains("rust"), "tag must be bound, not inlined");
    }

    #[test]
    fn test_listing_tags_reuse_the_listing_filters() {
        let query = ListingTagsQuery::new(Some("rust"), false);
        let sql = query.sql();
        assert!(sql.contains("lt.post_id IN (SELECT p.id FROM posts p WHERE 1 = 1"));
        assert!(sql.contains("t.name = ?"));
        assert!(sql.contains("p.unlisted = 0"));
        assert_eq!(sql.matches('?').count(), 1, "only the tag is bound");

        let unscoped = ListingTagsQuery::new(Some(""), true);
        assert!(!unscoped.sql().contains('?'));
        assert!(unscoped.sql().ends_with(") ORDER BY tg.name"));
    }
}
