//! Per-request caller context.
//!
//! Authentication happens outside this crate. Callers resolve the session to
//! a [`User`] (or none) and pass it explicitly to every handler.

use crate::model::user::{User, UserId};
use crate::service::ServiceError;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Authenticated caller, `None` for anonymous requests.
    pub user: Option<User>,
    /// Correlates log events of one request.
    pub request_id: Uuid,
}

impl RequestContext {
    pub fn anonymous() -> Self {
        Self {
            user: None,
            request_id: Uuid::new_v4(),
        }
    }

    pub fn authenticated(user: User) -> Self {
        Self {
            user: Some(user),
            request_id: Uuid::new_v4(),
        }
    }

    /// Caller id, if any. Used for per-viewer status flags.
    pub fn viewer(&self) -> Option<UserId> {
        self.user.as_ref().map(|user| user.id)
    }

    /// # Errors
    /// - `AuthenticationRequired` for anonymous callers.
    pub fn require_user(&self) -> Result<&User, ServiceError> {
        self.user.as_ref().ok_or(ServiceError::AuthenticationRequired)
    }

    /// # Errors
    /// - `AuthenticationRequired` for anonymous callers.
    /// - `PermissionDenied` for non-admin callers.
    pub fn require_admin(&self, action: &'static str) -> Result<&User, ServiceError> {
        let user = self.require_user()?;
        if !user.is_admin() {
            return Err(ServiceError::PermissionDenied(action));
        }
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::RequestContext;
    use crate::model::user::{User, UserType};
    use crate::service::ServiceError;

    fn user(user_type: UserType) -> User {
        User {
            id: 7,
            username: "ada".to_string(),
            email: None,
            avatar: None,
            user_type,
            create_time: 0,
        }
    }

    #[test]
    fn anonymous_context_has_no_viewer() {
        let ctx = RequestContext::anonymous();
        assert_eq!(ctx.viewer(), None);
        assert!(matches!(
            ctx.require_user(),
            Err(ServiceError::AuthenticationRequired)
        ));
    }

    #[test]
    fn admin_gate_rejects_normal_users() {
        let ctx = RequestContext::authenticated(user(UserType::Normal));
        assert_eq!(ctx.viewer(), Some(7));
        assert!(matches!(
            ctx.require_admin("post_check"),
            Err(ServiceError::PermissionDenied("post_check"))
        ));

        let admin = RequestContext::authenticated(user(UserType::Admin));
        assert!(admin.require_admin("post_check").is_ok());
    }

    #[test]
    fn each_context_gets_its_own_request_id() {
        assert_ne!(
            RequestContext::anonymous().request_id,
            RequestContext::anonymous().request_id
        );
    }
}
