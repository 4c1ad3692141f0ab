pub mod storage;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// A tag as offered in a filter list, marked when it is part of the
/// caller's current selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagChoice {
    pub id: i64,
    pub name: String,
    pub selected: bool,
}

/// Splits free-form tag input on commas and whitespace.
///
/// Empty tokens are dropped and repeated names keep only their first
/// occurrence, so `"a,,  ,b,a"` yields `["a", "b"]`.
pub fn parse_tag_input(input: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for token in input.split(|c: char| c == ',' || c.is_whitespace()) {
        if token.is_empty() || tags.iter().any(|t| t == token) {
            continue;
        }
        tags.push(token.to_owned());
    }
    tags
}
