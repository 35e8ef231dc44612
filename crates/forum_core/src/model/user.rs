//! User identity model.
//!
//! Users are created by registration outside this core; the forum only reads
//! them, except for the bootstrap path used by seeding and tests.

use super::validation::{limit_chars, require_text, ValidationError};
use serde::{Deserialize, Serialize};

/// Stable user identifier.
pub type UserId = i64;

const USERNAME_MAX_CHARS: usize = 20;

/// Account role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    #[default]
    Normal,
    /// May moderate posts and publish problems.
    Admin,
}

impl UserType {
    pub fn as_db(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "normal" => Some(Self::Normal),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// Persisted user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Unique handle.
    pub username: String,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub user_type: UserType,
    /// Epoch milliseconds.
    pub create_time: i64,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.user_type == UserType::Admin
    }
}

/// Write model for user bootstrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub user_type: UserType,
}

impl NewUser {
    /// Normal account with only a handle set.
    pub fn normal(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: None,
            avatar: None,
            user_type: UserType::Normal,
        }
    }

    /// Admin account with only a handle set.
    pub fn admin(username: impl Into<String>) -> Self {
        Self {
            user_type: UserType::Admin,
            ..Self::normal(username)
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("username", &self.username)?;
        limit_chars("username", self.username.trim(), USERNAME_MAX_CHARS)
    }
}
