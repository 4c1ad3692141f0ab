//! Chronological next/previous lookup, optionally scoped to a tag.
//!
//! Posts are ordered by `(post_time, id)`, so posts sharing a timestamp still
//! have a single well-defined neighbour on each side. A tag scope restricts
//! the candidate neighbours only; the current post itself does not need to
//! carry the tag.

use serde::Serialize;
use sqlx::{Executor, QueryBuilder, Sqlite};

use crate::error::{StorageResultExt as _, StoreError};
use crate::query::{normalize_scope, push_tag_scope};

/// Direction of travel along the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards newer posts.
    Next,
    /// Towards older posts.
    Previous,
}

impl Direction {
    fn predicate(self) -> &'static str {
        match self {
            Self::Next => {
                "(p.post_time > cur.post_time OR (p.post_time = cur.post_time AND p.id > cur.id))"
            }
            Self::Previous => {
                "(p.post_time < cur.post_time OR (p.post_time = cur.post_time AND p.id < cur.id))"
            }
        }
    }

    fn ordering(self) -> &'static str {
        match self {
            Self::Next => " ORDER BY p.post_time ASC, p.id ASC LIMIT 1",
            Self::Previous => " ORDER BY p.post_time DESC, p.id DESC LIMIT 1",
        }
    }
}

/// Neighbour titles of a post. `None` marks the end of the timeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Adjacent {
    #[sqlx(rename = "next_title")]
    pub next: Option<String>,
    #[sqlx(rename = "previous_title")]
    pub previous: Option<String>,
}

fn push_neighbour<'a>(
    builder: &mut QueryBuilder<'a, Sqlite>,
    direction: Direction,
    scope: Option<&'a str>,
) {
    builder.push("(SELECT p.title FROM posts p WHERE ");
    builder.push(direction.predicate());
    if let Some(tag) = scope {
        push_tag_scope(builder, "p", tag);
    }
    builder.push(direction.ordering());
    builder.push(")");
}

fn adjacent_query<'a>(title: &'a str, scope: Option<&'a str>) -> QueryBuilder<'a, Sqlite> {
    let scope = normalize_scope(scope);
    let mut builder = QueryBuilder::new("SELECT ");
    push_neighbour(&mut builder, Direction::Next, scope);
    builder.push(" AS next_title, ");
    push_neighbour(&mut builder, Direction::Previous, scope);
    builder.push(" AS previous_title FROM posts cur WHERE cur.title = ");
    builder.push_bind(title);
    builder
}

/// Both neighbours of `title`, read in one statement.
///
/// Fails with `NotFound` only when `title` itself does not exist. An empty
/// `scope` means no scope.
pub async fn adjacent<'c, E>(
    executor: E,
    title: &str,
    scope: Option<&str>,
) -> Result<Adjacent, StoreError>
where
    E: Executor<'c, Database = Sqlite>,
{
    let mut builder = adjacent_query(title, scope);
    builder
        .build_query_as::<Adjacent>()
        .fetch_optional(executor)
        .await
        .during("finding adjacent posts")?
        .ok_or_else(|| StoreError::NotFound(format!("post '{title}'")))
}

pub async fn neighbour<'c, E>(
    executor: E,
    title: &str,
    scope: Option<&str>,
    direction: Direction,
) -> Result<Option<String>, StoreError>
where
    E: Executor<'c, Database = Sqlite>,
{
    let adjacent = adjacent(executor, title, scope).await?;
    Ok(match direction {
        Direction::Next => adjacent.next,
        Direction::Previous => adjacent.previous,
    })
}

pub async fn next<'c, E>(
    executor: E,
    title: &str,
    scope: Option<&str>,
) -> Result<Option<String>, StoreError>
where
    E: Executor<'c, Database = Sqlite>,
{
    neighbour(executor, title, scope, Direction::Next).await
}

pub async fn previous<'c, E>(
    executor: E,
    title: &str,
    scope: Option<&str>,
) -> Result<Option<String>, StoreError>
where
    E: Executor<'c, Database = Sqlite>,
{
    neighbour(executor, title, scope, Direction::Previous).await
}
