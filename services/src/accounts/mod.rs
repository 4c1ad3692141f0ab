//! Account records: identity and roles only.
//!
//! Credentials and sessions live with the authentication layer; this module
//! keeps the rows that comment authors point at and the role flags an
//! [`AuthContext`](crate::auth::AuthContext) is built from.

pub mod storage;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub admin: bool,
    pub uploader: bool,
    pub created: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
}

/// A role flag that can be granted or revoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Uploader,
}

impl Role {
    pub(crate) fn column(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Uploader => "uploader",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column())
    }
}
