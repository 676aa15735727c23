//! WebSocket push. The upgrade handler moves the socket into the hub and
//! returns; it keeps no reference to the connection.

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, WebSocketUpgrade},
        State,
    },
    http::{header::ORIGIN, HeaderMap},
    response::Response,
    routing::get,
    Router,
};

use crate::dispatch::{Dispatch, Endpoint};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, RequestIdentity, UserIdentity};
use crate::services::{ClientInfo, HubStats};
use crate::state::AppState;

const CONNECT: Endpoint = Endpoint::new("ws.connect", "failed to open websocket");
const STATS: Endpoint = Endpoint::new("ws.stats", "failed to get websocket stats");

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(connect))
        .route("/ws/stats", get(stats))
}

/// GET /api/v1/ws
async fn connect(
    State(state): State<AppState>,
    identity: UserIdentity,
    headers: HeaderMap,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let dispatch = Dispatch::begin(&state, CONNECT, &identity);

    let outcome: Result<Response, ApiError> = (|| {
        let origin = headers.get(ORIGIN).and_then(|v| v.to_str().ok());
        if !state.config.security.websocket_origin_allowed(origin) {
            tracing::warn!(tenant = %identity.tenant, origin = origin.unwrap_or("-"), "websocket origin rejected");
            return Err(ApiError::forbidden("origin not allowed"));
        }

        let upgrade = upgrade.map_err(|rejection| {
            tracing::debug!(error = %rejection, "websocket upgrade rejected");
            ApiError::bad_request("websocket upgrade required")
        })?;

        let hub = state.services.hub.clone();
        let client = ClientInfo::new(identity.tenant.clone(), identity.user);
        Ok(upgrade.on_upgrade(move |socket| async move { hub.attach(socket, client).await }))
    })();

    dispatch.finish(outcome)
}

/// GET /api/v1/ws/stats
async fn stats(State(state): State<AppState>, identity: RequestIdentity) -> Response {
    let dispatch = Dispatch::begin(&state, STATS, &identity);
    let services = &state.services;

    let outcome: ApiResult<HubStats> = async {
        let stats = dispatch
            .invoke(|scope, tenant| async move { services.hub.stats(&scope, &tenant).await })
            .await?;
        Ok(ApiResponse::ok(stats))
    }
    .await;

    dispatch.finish(outcome)
}
