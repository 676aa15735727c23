//! The per-operation request template.
//!
//! Handlers resolve identity and decode their command through extractors,
//! then hand everything else to a [`Dispatch`]:
//!
//! ```text
//! begin ─> (decode/validate) ─> invoke: authorize ─> Service(scope, tenant, command)
//!       ─> classify failure ─> shape payload ─> finish: encode + one log line
//! ```
//!
//! The Service closure receives the tenant from the dispatcher itself, so no
//! code path reaches a Service without a resolved tenant.

mod scope;

pub use scope::Scope;

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use axum::response::{IntoResponse, Response};
use tokio_util::sync::DropGuard;

use crate::error::ApiError;
use crate::middleware::identity::{RequestIdentity, UserIdentity};
use crate::services::{RbacService, ServiceError};
use crate::state::AppState;
use crate::types::{TenantId, UserId};

/// Static description of one endpoint operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    /// Dotted operation name used in logs, e.g. `leads.score.get`.
    pub operation: &'static str,
    /// Generic phrase shown to clients on internal failure.
    pub failure: &'static str,
    /// RBAC permission code required before the Service is called.
    pub permission: Option<&'static str>,
}

impl Endpoint {
    pub const fn new(operation: &'static str, failure: &'static str) -> Self {
        Self {
            operation,
            failure,
            permission: None,
        }
    }

    pub const fn guarded(self, permission: &'static str) -> Self {
        Self {
            permission: Some(permission),
            ..self
        }
    }
}

/// Who is calling, as resolved by the identity extractors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub tenant: TenantId,
    pub user: Option<UserId>,
}

impl From<&RequestIdentity> for Caller {
    fn from(identity: &RequestIdentity) -> Self {
        Self {
            tenant: identity.tenant.clone(),
            user: identity.user,
        }
    }
}

impl From<&UserIdentity> for Caller {
    fn from(identity: &UserIdentity) -> Self {
        Self {
            tenant: identity.tenant.clone(),
            user: Some(identity.user),
        }
    }
}

/// Owns the request scope for the duration of one handler invocation.
pub struct Dispatch {
    endpoint: Endpoint,
    caller: Caller,
    scope: Scope,
    rbac: Arc<dyn RbacService>,
    authorized: AtomicBool,
    started: Instant,
    _scope_guard: DropGuard,
}

impl Dispatch {
    pub fn begin(state: &AppState, endpoint: Endpoint, caller: impl Into<Caller>) -> Self {
        let (scope, guard) = Scope::open();
        Self {
            endpoint,
            caller: caller.into(),
            scope,
            rbac: state.services.rbac.clone(),
            authorized: AtomicBool::new(false),
            started: Instant::now(),
            _scope_guard: guard,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn tenant(&self) -> &TenantId {
        &self.caller.tenant
    }

    pub fn user(&self) -> Option<UserId> {
        self.caller.user
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Secondary tenant validation for resources keyed by numeric tenant.
    pub fn numeric_tenant(&self) -> Result<i64, ApiError> {
        self.caller
            .tenant
            .numeric()
            .ok_or_else(|| ApiError::bad_request("tenant id must be numeric"))
    }

    /// RBAC precheck; runs at most once per request.
    pub async fn authorize(&self) -> Result<(), ApiError> {
        let Some(permission) = self.endpoint.permission else {
            return Ok(());
        };
        if self.authorized.load(Ordering::Acquire) {
            return Ok(());
        }

        let user = self.caller.user.ok_or_else(ApiError::unauthorized)?;
        let allowed = self
            .scope
            .run(self.rbac.has_permission(&self.scope, &self.caller.tenant, user, permission))
            .await
            .map_err(|e| ApiError::from_service(e, self.endpoint.operation, "failed to check permission"))?;

        if !allowed {
            tracing::warn!(
                tenant = %self.caller.tenant,
                user = user.0,
                permission,
                operation = self.endpoint.operation,
                "permission denied"
            );
            return Err(ApiError::forbidden("forbidden"));
        }

        self.authorized.store(true, Ordering::Release);
        Ok(())
    }

    /// Authorize, then run the Service call inside the request scope and
    /// classify its failure.
    pub async fn invoke<T, F, Fut>(&self, call: F) -> Result<T, ApiError>
    where
        F: FnOnce(Scope, TenantId) -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        self.authorize().await?;
        self.scope
            .run(call(self.scope.clone(), self.caller.tenant.clone()))
            .await
            .map_err(|e| ApiError::from_service(e, self.endpoint.operation, self.endpoint.failure))
    }

    /// Like [`invoke`](Self::invoke) for lookup endpoints: an empty result
    /// becomes a 404 with `not_found` as the message.
    pub async fn lookup<T, F, Fut>(&self, not_found: &str, call: F) -> Result<T, ApiError>
    where
        F: FnOnce(Scope, TenantId) -> Fut,
        Fut: Future<Output = Result<Option<T>, ServiceError>>,
    {
        self.invoke(call).await?.ok_or_else(|| ApiError::not_found(not_found))
    }

    /// Encode the outcome and record the single access line for this
    /// operation. Consumes the dispatch, which closes the scope.
    pub fn finish<R: IntoResponse>(self, outcome: Result<R, ApiError>) -> Response {
        let response = match outcome {
            Ok(success) => success.into_response(),
            Err(err) => err.into_response(),
        };

        let status = response.status();
        let duration_ms = self.started.elapsed().as_millis() as u64;
        let outcome = if status.is_success() {
            "ok"
        } else if status.is_server_error() {
            "error"
        } else {
            "rejected"
        };

        tracing::info!(
            tenant = %self.caller.tenant,
            user = self.caller.user.map(|u| u.0),
            operation = self.endpoint.operation,
            status = status.as_u16(),
            outcome,
            duration_ms,
            "dispatched"
        );

        response
    }
}
