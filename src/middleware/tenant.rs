use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use super::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;
use crate::types::TenantId;

/// Bind the authenticated tenant to the request context once the
/// directory confirms it is active. Anonymous requests pass through; the
/// identity extractors decide whether they may proceed.
pub async fn resolve_tenant(State(state): State<AppState>, mut request: Request, next: Next) -> Result<Response, ApiError> {
    let claim = request.extensions().get::<AuthUser>().map(|user| user.tenant.clone());
    let Some(tenant) = claim.and_then(TenantId::new) else {
        return Ok(next.run(request).await);
    };

    match state.services.tenants.is_active(&tenant).await {
        Ok(true) => {}
        Ok(false) => {
            tracing::warn!(tenant = %tenant, "request for inactive tenant");
            return Err(ApiError::forbidden("tenant is not active"));
        }
        Err(e) => {
            tracing::error!(tenant = %tenant, error = %e, "tenant directory lookup failed");
            return Err(ApiError::internal("failed to resolve tenant"));
        }
    }

    request.extensions_mut().insert(tenant);
    Ok(next.run(request).await)
}
