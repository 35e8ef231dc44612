//! Runtime forum configuration.
//!
//! Values come from `sys_configs`; absent keys keep compiled defaults.

use crate::model::validation::ValidationError;
use crate::query::page::{PageLimits, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::repo::config_repo::ConfigRepository;
use crate::repo::{RepoError, RepoResult};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const PAGE_DEFAULT_SIZE_KEY: &str = "page.default_size";
pub const PAGE_MAX_SIZE_KEY: &str = "page.max_size";
pub const SOLUTION_PREVIEW_CHARS_KEY: &str = "solution.preview_chars";

pub const DEFAULT_SOLUTION_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForumConfig {
    pub page_limits: PageLimits,
    /// Length of plain-text solution previews in listings.
    pub solution_preview_chars: usize,
}

impl Default for ForumConfig {
    fn default() -> Self {
        Self {
            page_limits: PageLimits::default(),
            solution_preview_chars: DEFAULT_SOLUTION_PREVIEW_CHARS,
        }
    }
}

impl ForumConfig {
    /// Reads overrides from storage.
    ///
    /// # Errors
    /// - `Validation` when a stored value is not a positive integer, or the
    ///   default page size exceeds the maximum.
    pub fn load(repo: &impl ConfigRepository) -> RepoResult<Self> {
        let default_size =
            read_positive(repo, PAGE_DEFAULT_SIZE_KEY)?.unwrap_or(u64::from(DEFAULT_PAGE_SIZE));
        let max_size = read_positive(repo, PAGE_MAX_SIZE_KEY)?.unwrap_or(u64::from(MAX_PAGE_SIZE));
        let preview_chars = read_positive(repo, SOLUTION_PREVIEW_CHARS_KEY)?
            .unwrap_or(DEFAULT_SOLUTION_PREVIEW_CHARS as u64);

        if default_size > max_size {
            return Err(RepoError::Validation(ValidationError::Invalid {
                field: PAGE_DEFAULT_SIZE_KEY,
                value: format!("{default_size} > {PAGE_MAX_SIZE_KEY} {max_size}"),
            }));
        }

        let config = Self {
            page_limits: PageLimits {
                default_size: to_u32(PAGE_DEFAULT_SIZE_KEY, default_size)?,
                max_size: to_u32(PAGE_MAX_SIZE_KEY, max_size)?,
            },
            solution_preview_chars: usize::try_from(preview_chars).map_err(|_| {
                RepoError::Validation(ValidationError::Invalid {
                    field: SOLUTION_PREVIEW_CHARS_KEY,
                    value: preview_chars.to_string(),
                })
            })?,
        };
        debug!(
            "event=config_load module=config status=ok default_size={} max_size={} preview_chars={}",
            config.page_limits.default_size,
            config.page_limits.max_size,
            config.solution_preview_chars
        );
        Ok(config)
    }
}

fn read_positive(repo: &impl ConfigRepository, key: &'static str) -> RepoResult<Option<u64>> {
    match repo.get_value(key)? {
        None => Ok(None),
        Some(Value::Number(number)) => match number.as_u64() {
            Some(value) if value > 0 => Ok(Some(value)),
            _ => Err(invalid(key, &Value::Number(number))),
        },
        Some(other) => Err(invalid(key, &other)),
    }
}

fn to_u32(key: &'static str, value: u64) -> RepoResult<u32> {
    u32::try_from(value).map_err(|_| {
        RepoError::Validation(ValidationError::Invalid {
            field: key,
            value: value.to_string(),
        })
    })
}

fn invalid(key: &'static str, value: &Value) -> RepoError {
    RepoError::Validation(ValidationError::Invalid {
        field: key,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::{ForumConfig, PAGE_DEFAULT_SIZE_KEY, PAGE_MAX_SIZE_KEY, SOLUTION_PREVIEW_CHARS_KEY};
    use crate::db::open_db_in_memory;
    use crate::repo::config_repo::{ConfigRepository, SqliteConfigRepository};
    use crate::repo::RepoError;
    use serde_json::json;

    #[test]
    fn empty_store_yields_defaults() {
        let conn = open_db_in_memory().expect("open db");
        let repo = SqliteConfigRepository::try_new(&conn).expect("repo");
        assert_eq!(ForumConfig::load(&repo).expect("load"), ForumConfig::default());
    }

    #[test]
    fn stored_values_override_defaults() {
        let conn = open_db_in_memory().expect("open db");
        let repo = SqliteConfigRepository::try_new(&conn).expect("repo");
        repo.set_value(PAGE_DEFAULT_SIZE_KEY, &json!(20)).expect("set");
        repo.set_value(PAGE_MAX_SIZE_KEY, &json!(40)).expect("set");
        repo.set_value(SOLUTION_PREVIEW_CHARS_KEY, &json!(80)).expect("set");

        let config = ForumConfig::load(&repo).expect("load");
        assert_eq!(config.page_limits.default_size, 20);
        assert_eq!(config.page_limits.max_size, 40);
        assert_eq!(config.solution_preview_chars, 80);
    }

    #[test]
    fn malformed_values_are_rejected() {
        let conn = open_db_in_memory().expect("open db");
        let repo = SqliteConfigRepository::try_new(&conn).expect("repo");
        repo.set_value(PAGE_MAX_SIZE_KEY, &json!("big")).expect("set");
        assert!(matches!(
            ForumConfig::load(&repo),
            Err(RepoError::Validation(_))
        ));

        repo.set_value(PAGE_MAX_SIZE_KEY, &json!(5)).expect("set");
        repo.set_value(PAGE_DEFAULT_SIZE_KEY, &json!(10)).expect("set");
        assert!(matches!(
            ForumConfig::load(&repo),
            Err(RepoError::Validation(_))
        ));
    }
}
