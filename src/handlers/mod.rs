pub mod ai;
pub mod analytics;
pub mod calls;
pub mod civil;
pub mod leads;
pub mod resources;
pub mod ws;

use axum::response::Json;
use serde_json::{json, Value};

use crate::error::ApiError;

/// GET /
pub async fn index() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "name": "VyomTech API",
        "version": version,
        "endpoints": {
            "health": "/health (public)",
            "ai": "/api/v1/ai/query, /api/v1/ai/providers",
            "analytics": "/api/v1/analytics/{reports,trends,export,metrics}",
            "civil": "/api/v1/civil/* (internal)",
            "leads": "/api/v1/leads/* (internal)",
            "calls": "/api/v1/calls[/:id]",
            "ws": "/api/v1/ws, /api/v1/ws/stats",
            "resources": "/api/v1/{role-templates,config/task-statuses,possessions,hr/employees,gl/accounts,purchase/vendors,sales/customers}",
        }
    }))
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
    }))
}

/// Unmatched routes still answer in the error envelope.
pub async fn not_found() -> ApiError {
    ApiError::not_found("route not found")
}
