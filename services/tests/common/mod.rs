//! Shared helpers for the integration tests.
//!
//! - `memory_store` - a fresh in-memory store with the schema applied
//! - `file_store` - an on-disk store for tests that need several connections
//! - small fixtures for posts and row counts

use blog_services::{NewPost, PostImage, SqliteContentStore, config::Config};
use chrono::{DateTime, TimeZone as _, Utc};
use sqlx::SqlitePool;
use std::path::Path;

pub async fn memory_store() -> SqliteContentStore {
    SqliteContentStore::connect(&Config::new_for_test())
        .await
        .expect("in-memory store should open")
}

/// Opens a pooled store on `dir/blog.db`.
#[allow(dead_code)]
pub async fn file_store(dir: &Path) -> SqliteContentStore {
    let url = format!("sqlite://{}", dir.join("blog.db").display());
    SqliteContentStore::connect(&Config::new_for_test_with_url(url))
        .await
        .expect("file store should open")
}

/// A fixed timestamp `second` seconds into the test day.
pub fn at(second: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, second)
        .single()
        .expect("valid timestamp")
}

pub fn post(title: &str, second: u32, tags: &[&str]) -> NewPost {
    NewPost::new(title, "alice", PostImage::new(vec![0xFF, 0xD8], vec![0x01]))
        .with_content(format!("{title} body"))
        .with_post_time(at(second))
        .with_tags(tags.iter().copied())
}

#[allow(dead_code)]
pub async fn count(pool: &SqlitePool, sql: &str) -> i64 {
    sqlx::query_scalar(sql)
        .fetch_one(pool)
        .await
        .expect("count query should succeed")
}

/// Fails the test if any tag has no association.
#[allow(dead_code)]
pub async fn assert_no_orphan_tags(pool: &SqlitePool) {
    let orphans = count(
        pool,
        "SELECT COUNT(*) FROM tags WHERE id NOT IN (SELECT tag_id FROM post_tags)",
    )
    .await;
    assert_eq!(orphans, 0, "found {orphans} orphan tag(s)");
}

#[allow(dead_code)]
pub async fn tag_names(pool: &SqlitePool) -> Vec<String> {
    sqlx::query_scalar("SELECT name FROM tags ORDER BY name")
        .fetch_all(pool)
        .await
        .expect("tag names should load")
}
