//! Content core of the blog: posts, tags, comments and chronological
//! navigation, kept consistent on SQLite.
//!
//! Writes that touch several tables go through
//! [`database::with_transaction`], which commits only on success. Tags
//! exist only while at least one post references them. Callers pass an
//! explicit [`AuthContext`] into the [`BlogService`] methods that need an
//! identity or a role.

pub mod accounts;
pub mod auth;
pub mod comments;
pub mod config;
pub mod database;
pub mod error;
pub mod navigation;
pub mod posts;
pub mod query;
pub mod service;
pub mod store;
pub mod tags;
pub mod telemetry;
pub mod views;

pub use auth::AuthContext;
pub use error::StoreError;
pub use navigation::Adjacent;
pub use posts::{ListFilter, NewPost, Post, PostEdit, PostImage, PostSummary};
pub use service::{BlogService, EditForm, HomePage, PageView, PublishForm};
pub use store::{ContentStore, SqliteContentStore};
