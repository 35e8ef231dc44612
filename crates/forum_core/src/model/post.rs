//! Post and comment models.
//!
//! # Invariants
//! - `like_count` mirrors the size of the liking-user set.
//! - `comment_count` is incremented in the same transaction as the comment
//!   insert.
//! - Tags are trimmed, lowercased and deduplicated before persistence.

use super::user::UserId;
use super::validation::{limit_chars, require_text, ValidationError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub type PostId = i64;
pub type CommentId = i64;

const TITLE_MAX_CHARS: usize = 100;
const TAG_MAX_CHARS: usize = 30;

// ASCII and full-width separators both show up in client input.
static TAG_SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[,，;；、]").expect("valid tag separator regex"));

/// Write model for a new post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub create_user: UserId,
    pub title: Option<String>,
    pub content: String,
    /// Already normalized, see [`normalize_tags`].
    pub tags: Vec<String>,
}

impl NewPost {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("post_content", &self.content)?;
        if let Some(title) = self.title.as_deref() {
            limit_chars("post_title", title, TITLE_MAX_CHARS)?;
        }
        for tag in &self.tags {
            limit_chars("tags", tag, TAG_MAX_CHARS)?;
        }
        Ok(())
    }
}

/// Read model for post list/detail use-cases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: PostId,
    pub title: Option<String>,
    pub content: String,
    pub tags: Vec<String>,
    pub create_user: UserId,
    pub user_name: String,
    pub like_count: i64,
    pub comment_count: i64,
    /// Moderation flag; unchecked posts are hidden from listings.
    pub check_status: bool,
    pub create_time: i64,
    /// Whether the viewer liked this post. `None` for anonymous viewers.
    pub like_status: Option<bool>,
}

/// Write model for a new comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub post_id: PostId,
    pub create_user: UserId,
    pub content: String,
    pub reply_to_user: Option<UserId>,
}

impl NewComment {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("comment_content", &self.content)
    }
}

/// Read model for comment listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub id: CommentId,
    pub post_id: PostId,
    pub create_user: UserId,
    pub user_name: String,
    pub avatar: Option<String>,
    pub content: String,
    pub like_count: i64,
    pub reply_to_user: Option<UserId>,
    pub reply_to_name: Option<String>,
    pub check_status: bool,
    pub create_time: i64,
    pub like_status: Option<bool>,
}

/// Splits a raw separator-delimited tag string and normalizes the parts.
pub fn split_tags(raw: &str) -> Vec<String> {
    let parts = TAG_SEPARATOR_RE
        .split(raw)
        .map(str::to_string)
        .collect::<Vec<_>>();
    normalize_tags(&parts)
}

/// Trims, lowercases and deduplicates tags; blank entries are dropped.
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    tags.iter()
        .map(|tag| tag.trim())
        .filter(|tag| !tag.is_empty())
        .map(str::to_lowercase)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
