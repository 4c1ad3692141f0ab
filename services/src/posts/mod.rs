//! Post types.

pub mod storage;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::comments::Comment;
use crate::tags::Tag;

/// A post with its tags (ordered by name) and comments (newest first).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub post_time: DateTime<Utc>,
    pub image: Vec<u8>,
    pub thumbnail: Vec<u8>,
    pub uploader: String,
    pub unlisted: bool,
    pub views: i64,
    pub link_post: bool,
    pub url_link: String,
    #[sqlx(skip)]
    pub tags: Vec<Tag>,
    #[sqlx(skip)]
    pub comments: Vec<Comment>,
}

/// Listing row: a post without its body and full-size image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct PostSummary {
    pub id: i64,
    pub title: String,
    pub post_time: DateTime<Utc>,
    pub thumbnail: Vec<u8>,
    pub uploader: String,
    pub unlisted: bool,
    pub views: i64,
    pub link_post: bool,
    pub url_link: String,
    #[sqlx(skip)]
    pub tags: Vec<Tag>,
}

/// Encoded image bytes, always replaced together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostImage {
    pub image: Vec<u8>,
    pub thumbnail: Vec<u8>,
}

impl PostImage {
    pub fn new(image: Vec<u8>, thumbnail: Vec<u8>) -> Self {
        Self { image, thumbnail }
    }
}

/// A post to be created.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub post_time: DateTime<Utc>,
    pub image: PostImage,
    pub uploader: String,
    pub tags: Vec<String>,
    pub unlisted: bool,
    pub link_post: bool,
    pub url_link: String,
}

impl NewPost {
    pub fn new(title: impl Into<String>, uploader: impl Into<String>, image: PostImage) -> Self {
        Self {
            title: title.into(),
            content: String::new(),
            post_time: Utc::now(),
            image,
            uploader: uploader.into(),
            tags: Vec::new(),
            unlisted: false,
            link_post: false,
            url_link: String::new(),
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_post_time(mut self, post_time: DateTime<Utc>) -> Self {
        self.post_time = post_time;
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_unlisted(mut self, unlisted: bool) -> Self {
        self.unlisted = unlisted;
        self
    }

    /// Marks the post as a link post pointing at `url`.
    pub fn with_link(mut self, url: impl Into<String>) -> Self {
        self.link_post = true;
        self.url_link = url.into();
        self
    }
}

/// A full replacement of a post's editable fields.
///
/// `post_time: None` keeps the stored time and `image: None` keeps the
/// stored image and thumbnail. The tag list always replaces the whole set.
#[derive(Debug, Clone)]
pub struct PostEdit {
    pub original_title: String,
    pub new_title: String,
    pub content: String,
    pub post_time: Option<DateTime<Utc>>,
    pub unlisted: bool,
    pub link_post: bool,
    pub url_link: String,
    pub tags: Vec<String>,
    pub image: Option<PostImage>,
}

impl PostEdit {
    pub fn new(original_title: impl Into<String>, new_title: impl Into<String>) -> Self {
        Self {
            original_title: original_title.into(),
            new_title: new_title.into(),
            content: String::new(),
            post_time: None,
            unlisted: false,
            link_post: false,
            url_link: String::new(),
            tags: Vec::new(),
            image: None,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_post_time(mut self, post_time: DateTime<Utc>) -> Self {
        self.post_time = Some(post_time);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_unlisted(mut self, unlisted: bool) -> Self {
        self.unlisted = unlisted;
        self
    }

    pub fn with_link(mut self, url: impl Into<String>) -> Self {
        self.link_post = true;
        self.url_link = url.into();
        self
    }

    pub fn with_image(mut self, image: PostImage) -> Self {
        self.image = Some(image);
        self
    }
}

/// Which posts a listing returns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub tag: Option<String>,
    pub include_unlisted: bool,
}

impl ListFilter {
    pub fn all() -> Self {
        Self {
            tag: None,
            include_unlisted: true,
        }
    }

    pub fn tagged(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            include_unlisted: false,
        }
    }

    pub fn with_unlisted(mut self, include: bool) -> Self {
        self.include_unlisted = include;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_post_defaults() {
        let post = NewPost::new("Hello", "alice", PostImage::default());
        assert!(post.tags.is_empty());
        assert!(!post.unlisted);
        assert!(!post.link_post);
        assert_eq!(post.url_link, "");
    }

    #[test]
    fn test_new_post_builder() {
        let post = NewPost::new("Hello", "alice", PostImage::default())
            .with_tags(["a", "b"])
            .with_link("https://example.org")
            .with_unlisted(true);
        assert_eq!(post.tags, vec!["a", "b"]);
        assert!(post.link_post);
        assert!(post.unlisted);
    }

    #[test]
    fn test_edit_keeps_time_and_image_by_default() {
        let edit = PostEdit::new("old", "new");
        assert!(edit.post_time.is_none());
        assert!(edit.image.is_none());
    }

    #[test]
    fn test_list_filter_constructors() {
        assert!(!ListFilter::default().include_unlisted);
        assert!(ListFilter::all().include_unlisted);
        assert_eq!(ListFilter::tagged("x").tag.as_deref(), Some("x"));
    }
}
