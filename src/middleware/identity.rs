//! Who is calling: tenant and user resolution for every handler.
//!
//! The canonical source is the request context populated by the
//! authentication and tenant-resolution middlewares (`UserId`, `TenantId`
//! extensions). The `X-Tenant-ID` / `X-User-ID` headers are only consulted on
//! routes carrying the [`HeaderIdentity`] marker, and never override context.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::auth::AuthUser;
use crate::error::ApiError;
use crate::types::{TenantId, UserId};

pub const TENANT_HEADER: &str = "x-tenant-id";
pub const USER_HEADER: &str = "x-user-id";

/// Marks a router as part of the internal API where header identity is
/// accepted. Installed with `Extension(HeaderIdentity)` on the route group.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderIdentity;

fn accepts_headers(parts: &Parts) -> bool {
    parts.extensions.get::<HeaderIdentity>().is_some()
}

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Resolve the tenant or fail with 400 `tenant id not found`.
pub fn tenant_of(parts: &Parts) -> Result<TenantId, ApiError> {
    if let Some(tenant) = parts.extensions.get::<TenantId>() {
        return Ok(tenant.clone());
    }

    if accepts_headers(parts) {
        if let Some(tenant) = header(parts, TENANT_HEADER).and_then(TenantId::new) {
            return Ok(tenant);
        }
    }

    Err(ApiError::missing_tenant())
}

/// Resolve the user or fail with 401. An unparsable header counts as absent.
pub fn user_of(parts: &Parts) -> Result<UserId, ApiError> {
    if let Some(user) = parts.extensions.get::<UserId>() {
        return Ok(*user);
    }

    if accepts_headers(parts) {
        if let Some(user) = header(parts, USER_HEADER).and_then(|raw| raw.parse::<i64>().ok()) {
            return Ok(UserId(user));
        }
    }

    Err(ApiError::unauthorized())
}

fn roles_of(parts: &Parts) -> Vec<String> {
    parts
        .extensions
        .get::<AuthUser>()
        .map(|user| user.roles.clone())
        .unwrap_or_default()
}

/// Tenant required, user optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestIdentity {
    pub tenant: TenantId,
    pub user: Option<UserId>,
    pub roles: Vec<String>,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for RequestIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let tenant = tenant_of(parts)?;
        Ok(Self {
            tenant,
            user: user_of(parts).ok(),
            roles: roles_of(parts),
        })
    }
}

/// Tenant and user both required. The tenant is checked first, so a
/// request lacking both is a 400.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub tenant: TenantId,
    pub user: UserId,
    pub roles: Vec<String>,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for UserIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let tenant = tenant_of(parts)?;
        let user = user_of(parts)?;
        Ok(Self {
            tenant,
            user,
            roles: roles_of(parts),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(headers: &[(&str, &str)], internal: bool) -> Parts {
        let mut builder = Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        if internal {
            parts.extensions.insert(HeaderIdentity);
        }
        parts
    }

    #[test]
    fn context_identity_is_used() {
        let mut p = parts(&[], false);
        p.extensions.insert(TenantId::new("t1").unwrap());
        p.extensions.insert(UserId(42));
        assert_eq!(tenant_of(&p).unwrap().as_str(), "t1");
        assert_eq!(user_of(&p).unwrap(), UserId(42));
    }

    #[test]
    fn headers_ignored_outside_internal_routes() {
        let p = parts(&[("X-Tenant-ID", "t1"), ("X-User-ID", "5")], false);
        assert_eq!(tenant_of(&p).unwrap_err(), ApiError::missing_tenant());
        assert_eq!(user_of(&p).unwrap_err(), ApiError::unauthorized());
    }

    #[test]
    fn headers_accepted_on_internal_routes() {
        let p = parts(&[("X-Tenant-ID", "17"), ("X-User-ID", "5")], true);
        assert_eq!(tenant_of(&p).unwrap().as_str(), "17");
        assert_eq!(user_of(&p).unwrap(), UserId(5));
    }

    #[test]
    fn context_wins_over_headers() {
        let mut p = parts(&[("X-Tenant-ID", "spoofed"), ("X-User-ID", "1")], true);
        p.extensions.insert(TenantId::new("t1").unwrap());
        p.extensions.insert(UserId(42));
        assert_eq!(tenant_of(&p).unwrap().as_str(), "t1");
        assert_eq!(user_of(&p).unwrap(), UserId(42));
    }

    #[test]
    fn malformed_user_header_counts_as_missing() {
        let p = parts(&[("X-Tenant-ID", "t1"), ("X-User-ID", "abc")], true);
        assert_eq!(user_of(&p).unwrap_err(), ApiError::unauthorized());
    }

    #[test]
    fn blank_tenant_header_is_missing() {
        let p = parts(&[("X-Tenant-ID", "  ")], true);
        assert_eq!(tenant_of(&p).unwrap_err(), ApiError::missing_tenant());
    }
}
