//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Apply authentication, role and ownership guards from the
//!   [`RequestContext`](crate::context::RequestContext).
//! - Keep the handler layer decoupled from storage details.

pub mod error;
pub mod forum_service;
pub mod problem_list_service;
pub mod problem_service;

pub use error::{ServiceError, ServiceResult};
