//! Core of the forum and problem-set backend.
//! This crate owns storage, business invariants and the request handlers.

pub mod api;
pub mod config;
pub mod context;
pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod service;

pub use api::{Backend, Envelope};
pub use config::ForumConfig;
pub use context::RequestContext;
pub use db::{open_db, open_db_in_memory, DbError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::user::{NewUser, User, UserId, UserType};
pub use query::page::{PageRequest, Paginated};
pub use query::sort::SortKey;
pub use repo::{RepoError, RepoResult};
pub use service::{ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
