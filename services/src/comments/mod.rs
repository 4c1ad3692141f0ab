pub mod storage;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    /// `None` for anonymous comments and for authors whose account was removed.
    pub username: Option<String>,
    pub content: String,
    pub post_time: DateTime<Utc>,
}

impl Comment {
    pub fn is_anonymous(&self) -> bool {
        self.username.is_none()
    }
}
