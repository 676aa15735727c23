use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::{verify_token, Claims};
use crate::error::ApiError;
use crate::state::AppState;
use crate::types::UserId;

/// Authenticated caller extracted from the bearer token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: UserId,
    /// Raw tenant claim; resolved into `TenantId` by the tenant middleware.
    pub tenant: String,
    pub roles: Vec<String>,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: UserId(claims.sub),
            tenant: claims.tenant_id,
            roles: claims.roles,
        }
    }
}

/// JWT authentication. A request without credentials passes through
/// anonymous; a request with credentials must present a valid token.
pub async fn authenticate(State(state): State<AppState>, mut request: Request, next: Next) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())?.map(str::to_owned);
    let Some(token) = token else {
        return Ok(next.run(request).await);
    };

    let claims = verify_token(&state.config.security.jwt_secret, &token).map_err(|e| {
        tracing::debug!(error = %e, "rejected bearer token");
        ApiError::unauthorized()
    })?;

    let user = AuthUser::from(claims);
    request.extensions_mut().insert(user.user_id);
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// `Ok(None)` when no Authorization header is present.
fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, ApiError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let token = value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            tracing::debug!("malformed Authorization header");
            ApiError::unauthorized()
        })?;

    Ok(Some(token))
}
