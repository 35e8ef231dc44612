//! Problem-set models: problems, tags, solutions and curated problem lists.
//!
//! # Invariants
//! - `pass_status` / `star_status` are computed per viewer at read time and
//!   are `None` for anonymous viewers.
//! - `ProblemListRecord::lifecycle` is the source of truth for soft-delete
//!   state; `star_count` mirrors the starring-user set.

use super::lifecycle::Lifecycle;
use super::user::UserId;
use super::validation::{limit_chars, require_text, ValidationError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub type ProblemId = i64;
pub type SolutionId = i64;
pub type TagId = i64;
pub type ProblemListId = i64;

const TITLE_MAX_CHARS: usize = 100;
const SUMMARY_MAX_CHARS: usize = 500;

static MARKDOWN_IMAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[[^\]]*]\([^)]*\)").expect("valid image regex"));
static MARKDOWN_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("valid link regex"));
static CODE_FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```[a-zA-Z0-9_+-]*").expect("valid code fence regex"));
static MARKDOWN_SYMBOL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\*_`#>~]+").expect("valid markdown symbol regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_db(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "easy" => Some(Self::Easy),
            "medium" => Some(Self::Medium),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProblem {
    pub title: String,
    pub content: String,
    pub difficulty: Difficulty,
    pub tag_ids: Vec<TagId>,
}

impl NewProblem {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title)?;
        limit_chars("title", self.title.trim(), TITLE_MAX_CHARS)?;
        require_text("content", &self.content)
    }
}

/// Problem detail read model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemRecord {
    pub id: ProblemId,
    pub title: String,
    pub content: String,
    pub difficulty: Difficulty,
    pub tags: Vec<Tag>,
    pub star_count: i64,
    pub create_time: i64,
    pub pass_status: Option<bool>,
    pub star_status: Option<bool>,
}

/// Compact problem projection used inside lists and "similar" sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemSummary {
    pub id: ProblemId,
    pub title: String,
    pub difficulty: Difficulty,
    pub pass_status: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSolution {
    pub problem_id: ProblemId,
    pub create_user: UserId,
    pub content: String,
    /// Unknown tag ids are dropped at insert time.
    pub tag_ids: Vec<TagId>,
}

impl NewSolution {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("content", &self.content)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolutionRecord {
    pub id: SolutionId,
    pub problem_id: ProblemId,
    pub create_user: UserId,
    pub user_name: String,
    pub content: String,
    pub tags: Vec<Tag>,
    pub like_count: i64,
    pub comment_count: i64,
    pub create_time: i64,
    pub last_update_time: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProblemList {
    pub create_user: UserId,
    pub title: String,
    pub summary: String,
    pub is_public: bool,
}

impl NewProblemList {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title)?;
        limit_chars("title", self.title.trim(), TITLE_MAX_CHARS)?;
        limit_chars("summary", &self.summary, SUMMARY_MAX_CHARS)
    }
}

/// Problem list ("favorites list") read model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemListRecord {
    pub id: ProblemListId,
    pub title: String,
    pub summary: String,
    pub is_public: bool,
    pub create_user: UserId,
    pub user_name: String,
    pub star_count: i64,
    pub problem_count: i64,
    pub lifecycle: Lifecycle,
    pub create_time: i64,
}

/// Derives a plain-text preview of markdown content.
///
/// Images are dropped, links keep their label, markdown symbols and code
/// fences are stripped, whitespace collapses, and the result is cut to
/// `max_chars` characters.
pub fn derive_plain_preview(content: &str, max_chars: usize) -> String {
    let without_images = MARKDOWN_IMAGE_RE.replace_all(content, " ");
    let without_links = MARKDOWN_LINK_RE.replace_all(&without_images, "$1");
    let without_fences = CODE_FENCE_RE.replace_all(&without_links, " ");
    let without_symbols = MARKDOWN_SYMBOL_RE.replace_all(&without_fences, " ");
    let normalized = WHITESPACE_RE.replace_all(&without_symbols, " ");
    normalized.trim().chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::{derive_plain_preview, Difficulty};

    #[test]
    fn preview_strips_markdown_and_keeps_link_labels() {
        let preview = derive_plain_preview(
            "# Idea\n\n![fig](a.png) use [two pointers](https://x.y) **carefully**",
            200,
        );
        assert_eq!(preview, "Idea use two pointers carefully");
    }

    #[test]
    fn preview_is_cut_by_characters() {
        let source = "题".repeat(300);
        assert_eq!(derive_plain_preview(&source, 200).chars().count(), 200);
    }

    #[test]
    fn difficulty_parse_is_case_insensitive() {
        assert_eq!(Difficulty::parse(" Hard "), Some(Difficulty::Hard));
        assert_eq!(Difficulty::parse("extreme"), None);
    }
}
