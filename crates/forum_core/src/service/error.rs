//! Use-case error taxonomy shared by all services.

use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug)]
pub enum ServiceError {
    /// Anonymous caller hit a guarded operation.
    AuthenticationRequired,
    /// Caller is known but lacks the role or ownership for `action`.
    PermissionDenied(&'static str),
    /// Target entity is missing or hidden.
    NotFound { kind: &'static str, id: i64 },
    /// Request input rejected before any mutation.
    ValidationFailed(String),
    /// Operation conflicts with current state.
    Conflict(&'static str),
    /// Storage failure.
    Repo(RepoError),
}

impl ServiceError {
    /// Storage failures whose details stay in the log.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Repo(_))
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationRequired => write!(f, "authentication required"),
            Self::PermissionDenied(action) => write!(f, "permission denied: {action}"),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::ValidationFailed(message) => write!(f, "{message}"),
            Self::Conflict(message) => write!(f, "{message}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { kind, id } => Self::NotFound { kind, id },
            RepoError::Validation(err) => Self::ValidationFailed(err.to_string()),
            other => Self::Repo(other),
        }
    }
}
