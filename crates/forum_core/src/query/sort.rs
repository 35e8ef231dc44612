//! Client sort-token resolution.
//!
//! Tokens: `likeDesc`, `commentDesc`, `timeDesc`, `timeAsc`. A missing,
//! unknown, or unsupported token resolves to the collection's default
//! ordering; it never fails the request.

use log::warn;
use serde::{Deserialize, Serialize};

/// Supported sort keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortKey {
    #[serde(rename = "likeDesc")]
    LikeDesc,
    #[serde(rename = "commentDesc")]
    CommentDesc,
    #[serde(rename = "timeDesc")]
    TimeDesc,
    #[serde(rename = "timeAsc")]
    TimeAsc,
}

impl SortKey {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "likeDesc" => Some(Self::LikeDesc),
            "commentDesc" => Some(Self::CommentDesc),
            "timeDesc" => Some(Self::TimeDesc),
            "timeAsc" => Some(Self::TimeAsc),
            _ => None,
        }
    }

    pub fn as_token(self) -> &'static str {
        match self {
            Self::LikeDesc => "likeDesc",
            Self::CommentDesc => "commentDesc",
            Self::TimeDesc => "timeDesc",
            Self::TimeAsc => "timeAsc",
        }
    }
}

/// Column mapping of one sortable collection.
///
/// Columns are trusted SQL fragments (qualified column names), never user
/// input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortColumns {
    pub id: &'static str,
    pub time: &'static str,
    pub likes: Option<&'static str>,
    pub comments: Option<&'static str>,
    /// Ordering used when the client sends nothing usable.
    pub default: SortKey,
}

impl SortColumns {
    /// Resolves a raw client token for this collection.
    pub fn resolve(&self, token: Option<&str>) -> SortKey {
        let Some(token) = token.map(str::trim).filter(|token| !token.is_empty()) else {
            return self.default;
        };

        match SortKey::from_token(token) {
            Some(key) if self.supports(key) => key,
            Some(key) => {
                warn!(
                    "event=sort_resolve module=query status=fallback reason=unsupported key={} default={}",
                    key.as_token(),
                    self.default.as_token()
                );
                self.default
            }
            None => {
                warn!(
                    "event=sort_resolve module=query status=fallback reason=unknown token_len={} default={}",
                    token.len(),
                    self.default.as_token()
                );
                self.default
            }
        }
    }

    pub fn supports(&self, key: SortKey) -> bool {
        match key {
            SortKey::LikeDesc => self.likes.is_some(),
            SortKey::CommentDesc => self.comments.is_some(),
            SortKey::TimeDesc | SortKey::TimeAsc => true,
        }
    }

    /// Renders the `ORDER BY` body for `key`, tie-broken by id.
    ///
    /// Unsupported keys render the default ordering.
    pub fn order_by(&self, key: SortKey) -> String {
        let key = if self.supports(key) { key } else { self.default };
        let (time, id) = (self.time, self.id);
        match (key, self.likes, self.comments) {
            (SortKey::TimeAsc, _, _) => format!("{time} ASC, {id} ASC"),
            (SortKey::LikeDesc, Some(likes), _) => {
                format!("{likes} DESC, {time} DESC, {id} DESC")
            }
            (SortKey::CommentDesc, _, Some(comments)) => {
                format!("{comments} DESC, {time} DESC, {id} DESC")
            }
            _ => format!("{time} DESC, {id} DESC"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{SortColumns, SortKey};

    const POSTS: SortColumns = SortColumns {
        id: "p.id",
        time: "p.create_time",
        likes: Some("p.like_count"),
        comments: Some("p.comment_count"),
        default: SortKey::TimeDesc,
    };

    const COMMENTS: SortColumns = SortColumns {
        id: "c.id",
        time: "c.create_time",
        likes: Some("c.like_count"),
        comments: None,
        default: SortKey::TimeAsc,
    };

    #[test]
    fn known_tokens_resolve() {
        assert_eq!(POSTS.resolve(Some("likeDesc")), SortKey::LikeDesc);
        assert_eq!(POSTS.resolve(Some(" timeAsc ")), SortKey::TimeAsc);
    }

    #[test]
    fn missing_and_unknown_tokens_fall_back_to_default() {
        assert_eq!(POSTS.resolve(None), SortKey::TimeDesc);
        assert_eq!(POSTS.resolve(Some("")), SortKey::TimeDesc);
        assert_eq!(POSTS.resolve(Some("random")), SortKey::TimeDesc);
        assert_eq!(POSTS.resolve(Some("likedesc")), SortKey::TimeDesc);
    }

    #[test]
    fn unsupported_key_falls_back_to_collection_default() {
        assert_eq!(COMMENTS.resolve(Some("commentDesc")), SortKey::TimeAsc);
        assert_eq!(
            COMMENTS.order_by(SortKey::CommentDesc),
            "c.create_time ASC, c.id ASC"
        );
    }

    #[test]
    fn orderings_end_with_id_tie_break() {
        for key in [
            SortKey::LikeDesc,
            SortKey::CommentDesc,
            SortKey::TimeDesc,
            SortKey::TimeAsc,
        ] {
            let clause = POSTS.order_by(key);
            assert!(clause.ends_with("p.id DESC") || clause.ends_with("p.id ASC"));
        }
    }

    #[test]
    fn time_orderings_are_exact_reverses() {
        assert_eq!(
            POSTS.order_by(SortKey::TimeAsc),
            "p.create_time ASC, p.id ASC"
        );
        assert_eq!(
            POSTS.order_by(SortKey::TimeDesc),
            "p.create_time DESC, p.id DESC"
        );
    }
}
