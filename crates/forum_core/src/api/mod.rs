//! Request handlers and the response envelope.
//!
//! # Responsibility
//! - Expose one handler per client operation on [`Backend`].
//! - Map service results into the `{data, err}` envelope.
//! - Log handler outcomes with the request id; never log user content.
//!
//! # Invariants
//! - Handlers never panic; every failure becomes `err`.
//! - Success carries `err = null`, failure carries `data = null`.
//! - Storage failures are logged at `error` and surface a generic message.

use crate::config::ForumConfig;
use crate::context::RequestContext;
use crate::repo::config_repo::SqliteConfigRepository;
use crate::repo::RepoResult;
use crate::service::ServiceError;
use log::{debug, error, info};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

pub mod forum;
pub mod problem;
pub mod problem_list;

const INTERNAL_ERROR_MESSAGE: &str = "internal error, please retry later";

/// Uniform response shape: exactly one of `data` / `err` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: Option<T>,
    pub err: Option<String>,
}

impl<T> Envelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            err: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            data: None,
            err: Some(message.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.err.is_none()
    }
}

impl<T: Serialize> Envelope<T> {
    /// Renders the envelope as a JSON value.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|err| {
            error!("event=envelope_encode module=api status=error error={err}");
            serde_json::json!({ "data": null, "err": INTERNAL_ERROR_MESSAGE })
        })
    }
}

/// Empty success payload for mutations without a result body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {}

/// Handler entry point bound to one migrated connection.
pub struct Backend<'conn> {
    conn: &'conn Connection,
    config: ForumConfig,
}

impl<'conn> Backend<'conn> {
    /// Binds handlers to `conn` and loads configuration from `sys_configs`.
    pub fn new(conn: &'conn Connection) -> RepoResult<Self> {
        let config = ForumConfig::load(&SqliteConfigRepository::try_new(conn)?)?;
        Ok(Self { conn, config })
    }

    pub fn with_config(conn: &'conn Connection, config: ForumConfig) -> Self {
        Self { conn, config }
    }

    pub fn config(&self) -> &ForumConfig {
        &self.config
    }

    pub(crate) fn conn(&self) -> &'conn Connection {
        self.conn
    }
}

/// Converts a handler result into an envelope and logs the outcome.
pub(crate) fn respond<T>(
    handler: &'static str,
    ctx: &RequestContext,
    result: Result<T, ServiceError>,
) -> Envelope<T> {
    match result {
        Ok(data) => {
            debug!(
                "event=handler module=api status=ok handler={handler} request_id={}",
                ctx.request_id
            );
            Envelope::success(data)
        }
        Err(err) if err.is_internal() => {
            error!(
                "event=handler module=api status=error handler={handler} request_id={} error={err}",
                ctx.request_id
            );
            Envelope::failure(INTERNAL_ERROR_MESSAGE)
        }
        Err(err) => {
            info!(
                "event=handler module=api status=rejected handler={handler} request_id={} reason={}",
                ctx.request_id,
                rejection_kind(&err)
            );
            Envelope::failure(err.to_string())
        }
    }
}

fn rejection_kind(err: &ServiceError) -> &'static str {
    match err {
        ServiceError::AuthenticationRequired => "authentication_required",
        ServiceError::PermissionDenied(_) => "permission_denied",
        ServiceError::NotFound { .. } => "not_found",
        ServiceError::ValidationFailed(_) => "validation_failed",
        ServiceError::Conflict(_) => "conflict",
        ServiceError::Repo(_) => "internal",
    }
}

#[cfg(test)]
mod tests {
    use super::{respond, Envelope, INTERNAL_ERROR_MESSAGE};
    use crate::context::RequestContext;
    use crate::repo::RepoError;
    use crate::service::ServiceError;
    use serde_json::json;

    #[test]
    fn success_envelope_has_null_err() {
        let envelope = Envelope::success(json!({ "post_id": 1 }));
        assert_eq!(
            envelope.to_json(),
            json!({ "data": { "post_id": 1 }, "err": null })
        );
    }

    #[test]
    fn failure_envelope_has_null_data() {
        let envelope: Envelope<u32> = respond(
            "post_good",
            &RequestContext::anonymous(),
            Err(ServiceError::AuthenticationRequired),
        );
        assert_eq!(
            envelope.to_json(),
            json!({ "data": null, "err": "authentication required" })
        );
    }

    #[test]
    fn storage_errors_are_masked() {
        let envelope: Envelope<u32> = respond(
            "post_list",
            &RequestContext::anonymous(),
            Err(ServiceError::Repo(RepoError::InvalidData(
                "secret detail".to_string(),
            ))),
        );
        assert_eq!(envelope.err.as_deref(), Some(INTERNAL_ERROR_MESSAGE));
    }
}
