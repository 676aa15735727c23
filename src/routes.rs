//! URL surface and the fixed middleware chain.

use axum::{
    extract::{DefaultBodyLimit, Request},
    http::{HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::handlers;
use crate::middleware::{authenticate, panic_response, resolve_tenant};
use crate::state::AppState;

/// Build the application router.
///
/// Middleware, outer to inner: CORS, request id, panic recovery, access
/// log, body limit, authentication, tenant resolution. The access log is
/// left out when `api.enable_request_logging` is off. RBAC runs per
/// endpoint inside the dispatcher.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(handlers::ai::routes())
        .merge(handlers::analytics::routes())
        .merge(handlers::civil::routes())
        .merge(handlers::leads::routes())
        .merge(handlers::calls::routes())
        .merge(handlers::ws::routes())
        .merge(handlers::resources::routes());

    let outer = ServiceBuilder::new()
        .layer(cors_layer(&state.config.security))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(CatchPanicLayer::custom(panic_response));

    let inner = ServiceBuilder::new()
        .layer(DefaultBodyLimit::max(state.config.api.max_request_size_bytes))
        .layer(from_fn_with_state(state.clone(), authenticate))
        .layer(from_fn_with_state(state.clone(), resolve_tenant));

    let mut router = Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .nest("/api/v1", api)
        .fallback(handlers::not_found)
        .layer(inner);

    if state.config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-");
            tracing::info_span!(
                "http",
                method = %request.method(),
                uri = %request.uri(),
                request_id,
            )
        }));
    }

    router.layer(outer).with_state(state)
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }
    if security.cors_origins.is_empty() || security.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
}
