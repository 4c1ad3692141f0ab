//! Request-level operations: role checks and form parsing on top of a
//! [`ContentStore`].
//!
//! Each method takes the caller's [`AuthContext`] explicitly. Nothing here
//! knows about HTTP or templates; results are plain serializable values.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

use crate::auth::AuthContext;
use crate::error::StoreError;
use crate::navigation::Adjacent;
use crate::posts::{ListFilter, NewPost, Post, PostEdit, PostImage, PostSummary};
use crate::query::normalize_scope;
use crate::store::ContentStore;
use crate::tags::{TagChoice, parse_tag_input};

/// Format of a `datetime-local` form field, interpreted as UTC.
pub const POST_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Parses a form timestamp. An empty field yields `None`.
pub fn parse_post_time(input: &str) -> Result<Option<DateTime<Utc>>, StoreError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    NaiveDateTime::parse_from_str(input, POST_TIME_FORMAT)
        .map(|naive| Some(naive.and_utc()))
        .map_err(|err| StoreError::Validation(format!("invalid post time '{input}': {err}")))
}

/// Upload form for a new post.
#[derive(Debug, Clone, Default)]
pub struct PublishForm {
    pub title: String,
    pub content: String,
    /// Comma or whitespace separated tag names.
    pub tags: String,
    /// `YYYY-MM-DDTHH:MM`, or empty for now.
    pub post_time: String,
    pub unlisted: bool,
    pub link_post: bool,
    pub url_link: String,
    pub image: PostImage,
}

/// Edit form for an existing post.
#[derive(Debug, Clone, Default)]
pub struct EditForm {
    pub original_title: String,
    pub title: String,
    pub content: String,
    pub tags: String,
    /// Empty keeps the stored time.
    pub post_time: String,
    pub unlisted: bool,
    pub link_post: bool,
    pub url_link: String,
    /// `None` keeps the stored image.
    pub image: Option<PostImage>,
}

/// Everything needed to render one post page.
#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    pub post: Post,
    pub adjacent: Adjacent,
    /// Tag the reader is following, if any.
    pub follow_tag: Option<String>,
    pub viewer: Option<String>,
    pub can_edit: bool,
}

/// The listing page.
#[derive(Debug, Clone, Serialize)]
pub struct HomePage {
    pub posts: Vec<PostSummary>,
    pub tags: Vec<TagChoice>,
    pub selected_tag: Option<String>,
}

#[derive(Clone, Debug)]
pub struct BlogService<S: ContentStore> {
    store: S,
}

impl<S: ContentStore> BlogService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Publishes a new post as the calling uploader.
    pub async fn publish(&self, ctx: &AuthContext, form: PublishForm) -> Result<i64, StoreError> {
        if !ctx.is_uploader() {
            tracing::warn!(user = ?ctx.username(), "Non-uploader attempted to publish");
            return Err(StoreError::Unauthorized("uploaders only".to_owned()));
        }
        if form.title.trim().is_empty() {
            return Err(StoreError::Validation("title is required".to_owned()));
        }
        let uploader = ctx.current_username()?;
        let post_time = parse_post_time(&form.post_time)?.unwrap_or_else(Utc::now);

        let mut post = NewPost::new(form.title, uploader, form.image)
            .with_content(form.content)
            .with_post_time(post_time)
            .with_tags(parse_tag_input(&form.tags))
            .with_unlisted(form.unlisted);
        if form.link_post {
            post = post.with_link(form.url_link);
        }

        self.store.create_post(post).await
    }

    /// Applies an edit if the caller uploaded the post or is an admin.
    pub async fn edit(&self, ctx: &AuthContext, form: EditForm) -> Result<(), StoreError> {
        if !ctx.is_uploader() {
            tracing::warn!(user = ?ctx.username(), "Non-uploader attempted to edit");
            return Err(StoreError::Unauthorized("uploaders only".to_owned()));
        }
        let uploader = self.store.uploader_of(&form.original_title).await?;
        if !ctx.can_edit(&uploader) {
            tracing::warn!(
                user = ?ctx.username(),
                uploader = %uploader,
                title = %form.original_title,
                "Edit refused for post owned by another uploader"
            );
            return Err(StoreError::Unauthorized(format!(
                "only '{uploader}' or an admin may edit '{}'",
                form.original_title
            )));
        }

        let mut edit = PostEdit::new(form.original_title, form.title)
            .with_content(form.content)
            .with_tags(parse_tag_input(&form.tags))
            .with_unlisted(form.unlisted);
        if let Some(post_time) = parse_post_time(&form.post_time)? {
            edit = edit.with_post_time(post_time);
        }
        if form.link_post {
            edit = edit.with_link(form.url_link);
        }
        if let Some(image) = form.image {
            edit = edit.with_image(image);
        }

        self.store.edit_post(edit).await
    }

    pub async fn delete(&self, ctx: &AuthContext, title: &str) -> Result<(), StoreError> {
        if !ctx.is_admin() {
            tracing::warn!(user = ?ctx.username(), title, "Non-admin attempted to delete");
            return Err(StoreError::Unauthorized("admins only".to_owned()));
        }
        self.store.delete_post(title).await
    }

    /// Comments as the caller, or anonymously when nobody is signed in.
    pub async fn comment(
        &self,
        ctx: &AuthContext,
        post_id: i64,
        content: &str,
    ) -> Result<i64, StoreError> {
        if content.trim().is_empty() {
            return Err(StoreError::Validation("comment content is required".to_owned()));
        }
        self.store.add_comment(post_id, ctx.username(), content).await
    }

    /// Loads a post for reading, counts the view and finds its neighbours.
    ///
    /// Neighbour lookup failures are logged and render as no neighbours.
    pub async fn view_page(
        &self,
        ctx: &AuthContext,
        title: &str,
        follow_tag: Option<&str>,
    ) -> Result<PageView, StoreError> {
        if !ctx.is_authenticated() {
            return Err(StoreError::Unauthorized("sign in to read posts".to_owned()));
        }
        let follow_tag = normalize_scope(follow_tag);

        let post = self.store.get_post(title).await?;
        self.store.increment_views(post.id).await;

        let adjacent = match self.store.adjacent(&post.title, follow_tag).await {
            Ok(adjacent) => adjacent,
            Err(err) => {
                tracing::warn!(title, error = %err, "Failed to find adjacent posts");
                Adjacent::default()
            }
        };

        Ok(PageView {
            can_edit: ctx.can_edit(&post.uploader),
            viewer: ctx.username().map(ToOwned::to_owned),
            follow_tag: follow_tag.map(ToOwned::to_owned),
            adjacent,
            post,
        })
    }

    /// The listing, optionally filtered by tag, with the tag list.
    ///
    /// Unlisted posts are shown to uploaders and admins only.
    pub async fn home(&self, ctx: &AuthContext, tag: Option<&str>) -> Result<HomePage, StoreError> {
        if !ctx.is_authenticated() {
            return Err(StoreError::Unauthorized("sign in to browse posts".to_owned()));
        }
        let selected_tag = normalize_scope(tag).map(ToOwned::to_owned);

        let filter = ListFilter {
            tag: selected_tag.clone(),
            include_unlisted: ctx.is_uploader() || ctx.is_admin(),
        };
        let posts = self.store.list_posts(&filter).await?;
        let selected: Vec<String> = selected_tag.iter().cloned().collect();
        let tags = self.store.list_tags(&selected).await?;

        Ok(HomePage {
            posts,
            tags,
            selected_tag,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::store::SqliteContentStore;
    use chrono::TimeZone as _;

    async fn service() -> BlogService<SqliteContentStore> {
        let store = SqliteContentStore::connect(&Config::new_for_test())
            .await
            .expect("store should open");
        BlogService::new(store)
    }

    fn uploader(name: &str) -> AuthContext {
        AuthContext::for_user(name).with_uploader(true)
    }

    fn form(title: &str, post_time: &str, tags: &str) -> PublishForm {
        PublishForm {
            title: title.to_owned(),
            content: format!("about {title}"),
            tags: tags.to_owned(),
            post_time: post_time.to_owned(),
            ..PublishForm::default()
        }
    }

    #[test]
    fn test_parse_post_time() {
        assert_eq!(parse_post_time("").expect("empty is fine"), None);
        assert_eq!(
            parse_post_time("2024-02-29T13:45").expect("valid"),
            Some(Utc.with_ymd_and_hms(2024, 2, 29, 13, 45, 0).single().expect("valid"))
        );
        assert!(matches!(
            parse_post_time("29/02/2024"),
            Err(StoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_publish_requires_uploader() {
        let service = service().await;
        let reader = AuthContext::for_user("reader");

        let err = service
            .publish(&reader, form("Hi", "", ""))
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_publish_parses_tags_and_time() {
        let service = service().await;
        let alice = uploader("alice");

        service
            .publish(&alice, form("Hi", "2024-01-02T03:04", "a,,  ,b"))
            .await
            .expect("publish should succeed");

        let page = service.view_page(&alice, "Hi", None).await.expect("view");
        let tags: Vec<_> = page.post.tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(tags, vec!["a", "b"]);
        assert_eq!(page.post.uploader, "alice");
        assert_eq!(
            page.post.post_time,
            Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 0).single().expect("valid")
        );
        assert!(page.can_edit);
    }

    #[tokio::test]
    async fn test_publish_rejects_bad_time_and_empty_title() {
        let service = service().await;
        let alice = uploader("alice");

        let bad_time = service
            .publish(&alice, form("Hi", "yesterday", ""))
            .await
            .unwrap_err();
        assert!(matches!(bad_time, StoreError::Validation(_)));

        let no_title = service.publish(&alice, form(" ", "", "")).await.unwrap_err();
        assert!(matches!(no_title, StoreError::Validation(_)));
    }

    #[tokio::test]
    async fn test_only_owner_or_admin_may_edit() {
        let service = service().await;
        service
            .publish(&uploader("alice"), form("Hi", "2024-01-02T03:04", "x"))
            .await
            .expect("publish");

        let edit = EditForm {
            original_title: "Hi".to_owned(),
            title: "Hi".to_owned(),
            content: "edited".to_owned(),
            tags: "y".to_owned(),
            ..EditForm::default()
        };

        let err = service
            .edit(&uploader("bob"), edit.clone())
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());

        service
            .edit(&AuthContext::admin("root"), edit)
            .await
            .expect("admin edit should succeed");

        let page = service
            .view_page(&uploader("bob"), "Hi", None)
            .await
            .expect("view");
        assert_eq!(page.post.content, "edited");
        assert!(!page.can_edit);
        assert_eq!(
            page.post.post_time,
            Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 0).single().expect("valid"),
            "empty time keeps the stored one"
        );
    }

    #[tokio::test]
    async fn test_delete_is_admin_only() {
        let service = service().await;
        let alice = uploader("alice");
        service.publish(&alice, form("Hi", "", "")).await.expect("publish");

        assert!(service.delete(&alice, "Hi").await.unwrap_err().is_unauthorized());
        service
            .delete(&AuthContext::admin("root"), "Hi")
            .await
            .expect("admin delete");
        assert!(
            service
                .view_page(&alice, "Hi", None)
                .await
                .unwrap_err()
                .is_not_found()
        );
    }

    #[tokio::test]
    async fn test_view_page_counts_views_and_follows_tag() {
        let service = service().await;
        let alice = uploader("alice");
        service
            .publish(&alice, form("One", "2024-01-01T00:01", "x"))
            .await
            .expect("publish");
        service
            .publish(&alice, form("Two", "2024-01-01T00:02", "y"))
            .await
            .expect("publish");
        service
            .publish(&alice, form("Three", "2024-01-01T00:03", "x"))
            .await
            .expect("publish");

        let first = service.view_page(&alice, "One", Some("x")).await.expect("view");
        assert_eq!(first.adjacent.next.as_deref(), Some("Three"));
        assert_eq!(first.adjacent.previous, None);
        assert_eq!(first.follow_tag.as_deref(), Some("x"));

        let again = service.view_page(&alice, "One", Some("")).await.expect("view");
        assert_eq!(again.post.views, 1);
        assert_eq!(again.adjacent.next.as_deref(), Some("Two"));
        assert_eq!(again.follow_tag, None);
    }

    #[tokio::test]
    async fn test_home_hides_unlisted_from_readers() {
        let service = service().await;
        let alice = uploader("alice");
        service
            .publish(&alice, form("Public", "2024-01-01T00:01", "x"))
            .await
            .expect("publish");
        let mut hidden = form("Hidden", "2024-01-01T00:02", "y");
        hidden.unlisted = true;
        service.publish(&alice, hidden).await.expect("publish");

        let reader = AuthContext::for_user("reader");
        let home = service.home(&reader, Some("x")).await.expect("home");
        let titles: Vec<_> = home.posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Public"]);
        let tags: Vec<_> = home.tags.iter().map(|t| (t.name.as_str(), t.selected)).collect();
        assert_eq!(tags, vec![("x", true), ("y", false)]);

        let own = service.home(&alice, None).await.expect("home");
        assert_eq!(own.posts.len(), 2);
        assert!(own.tags.iter().all(|t| !t.selected));

        assert!(
            service
                .home(&AuthContext::anonymous(), None)
                .await
                .unwrap_err()
                .is_unauthorized()
        );
    }

    #[tokio::test]
    async fn test_anonymous_comment_has_no_author() {
        let service = service().await;
        let alice = uploader("alice");
        let post_id = service.publish(&alice, form("Hi", "", "")).await.expect("publish");

        service
            .comment(&AuthContext::anonymous(), post_id, "hello")
            .await
            .expect("comment");
        let comments = service.store().comments_for(post_id).await.expect("comments");
        assert_eq!(comments.len(), 1);
        assert!(comments[0].is_anonymous());

        let err = service
            .comment(&AuthContext::anonymous(), post_id, " ")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }
}
