//! Civil-engineering site tracking (internal API: header identity accepted).
//!
//! Only the dashboard is backed by a Service. Site, incident, compliance and
//! permit endpoints keep their documented shapes but are placeholders,
//! flagged with `X-Unimplemented: true`.

use axum::{
    extract::State,
    response::Response,
    routing::{get, post, put},
    Extension, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dispatch::{Dispatch, Endpoint};
use crate::error::ApiError;
use crate::extract::{required_text, Payload, PathParams, QueryParams};
use crate::middleware::{ApiResponse, ApiResult, HeaderIdentity, Page, RequestIdentity};
use crate::state::AppState;

const DASHBOARD: Endpoint = Endpoint::new("civil.dashboard", "failed to get dashboard metrics");
const SITE_CREATE: Endpoint = Endpoint::new("civil.sites.create", "failed to create site");
const SITE_LIST: Endpoint = Endpoint::new("civil.sites.list", "failed to list sites");
const SITE_GET: Endpoint = Endpoint::new("civil.sites.get", "failed to get site");
const SITE_UPDATE: Endpoint = Endpoint::new("civil.sites.update", "failed to update site");
const SITE_DELETE: Endpoint = Endpoint::new("civil.sites.delete", "failed to delete site");
const INCIDENT_CREATE: Endpoint = Endpoint::new("civil.incidents.create", "failed to report incident");
const INCIDENT_LIST: Endpoint = Endpoint::new("civil.incidents.list", "failed to list incidents");
const INCIDENT_STATUS: Endpoint = Endpoint::new("civil.incidents.status", "failed to update incident status");
const COMPLIANCE_LIST: Endpoint = Endpoint::new("civil.compliance.list", "failed to list compliance records");
const COMPLIANCE_STATUS: Endpoint = Endpoint::new("civil.compliance.status", "failed to update compliance status");
const PERMIT_CREATE: Endpoint = Endpoint::new("civil.permits.create", "failed to create permit");
const PERMIT_LIST: Endpoint = Endpoint::new("civil.permits.list", "failed to list permits");
const PERMIT_STATUS: Endpoint = Endpoint::new("civil.permits.status", "failed to update permit status");

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/civil/dashboard", get(dashboard))
        .route("/civil/sites", get(list_sites).post(create_site))
        .route("/civil/sites/:siteId/incidents", get(list_incidents))
        .route("/civil/sites/:siteId/compliance", get(list_compliance))
        .route("/civil/sites/:siteId/permits", get(list_permits))
        .route("/civil/sites/:siteId", get(get_site).put(update_site).delete(delete_site))
        .route("/civil/incidents", post(report_incident))
        .route("/civil/incidents/:id/status", put(update_incident_status))
        .route("/civil/compliance/:id/status", put(update_compliance_status))
        .route("/civil/permits", post(create_permit))
        .route("/civil/permits/:id/status", put(update_permit_status))
        .layer(Extension(HeaderIdentity))
}

#[derive(Debug, Serialize)]
pub struct Message {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct StatusUpdated {
    pub status: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    #[serde(default)]
    pub status: Option<String>,
}

/// GET /api/v1/civil/dashboard
async fn dashboard(State(state): State<AppState>, identity: RequestIdentity) -> Response {
    let dispatch = Dispatch::begin(&state, DASHBOARD, &identity);
    let services = &state.services;

    let outcome: ApiResult<Value> = async {
        let metrics = dispatch
            .invoke(|scope, tenant| async move { services.civil.dashboard(&scope, &tenant).await })
            .await?;
        Ok(ApiResponse::ok(metrics))
    }
    .await;

    dispatch.finish(outcome)
}

fn create_placeholder(state: &AppState, endpoint: Endpoint, identity: &RequestIdentity, body: Result<Payload<Value>, ApiError>, message: &'static str) -> Response {
    let dispatch = Dispatch::begin(state, endpoint, identity);
    let outcome = body.map(|_| ApiResponse::created(Message { message }).placeholder());
    dispatch.finish(outcome)
}

fn list_placeholder(state: &AppState, endpoint: Endpoint, identity: &RequestIdentity, site: Option<&PathParams>, query: &QueryParams) -> Response {
    let dispatch = Dispatch::begin(state, endpoint, identity);
    let outcome = (|| -> ApiResult<Page<Value>> {
        if let Some(params) = site {
            params.int("siteId", "site ID")?;
        }
        let page = query.page()?;
        Ok(ApiResponse::ok(Page::empty(&page)).placeholder())
    })();
    dispatch.finish(outcome)
}

fn status_placeholder(
    state: &AppState,
    endpoint: Endpoint,
    identity: &RequestIdentity,
    params: &PathParams,
    label: &str,
    body: Result<Payload<StatusBody>, ApiError>,
) -> Response {
    let dispatch = Dispatch::begin(state, endpoint, identity);
    let outcome = (|| -> ApiResult<StatusUpdated> {
        params.int("id", label)?;
        let Payload(body) = body?;
        required_text("status", body.status.as_deref())?;
        Ok(ApiResponse::ok(StatusUpdated { status: "updated" }).placeholder())
    })();
    dispatch.finish(outcome)
}

/// POST /api/v1/civil/sites
async fn create_site(State(state): State<AppState>, identity: RequestIdentity, body: Result<Payload<Value>, ApiError>) -> Response {
    create_placeholder(&state, SITE_CREATE, &identity, body, "Site created")
}

/// GET /api/v1/civil/sites
async fn list_sites(State(state): State<AppState>, identity: RequestIdentity, query: QueryParams) -> Response {
    list_placeholder(&state, SITE_LIST, &identity, None, &query)
}

/// GET /api/v1/civil/sites/{siteId}
async fn get_site(State(state): State<AppState>, identity: RequestIdentity, params: PathParams) -> Response {
    let dispatch = Dispatch::begin(&state, SITE_GET, &identity);
    let outcome = params
        .int("siteId", "site ID")
        .map(|_| ApiResponse::ok(Message { message: "Site details" }).placeholder());
    dispatch.finish(outcome)
}

/// PUT /api/v1/civil/sites/{siteId}
async fn update_site(
    State(state): State<AppState>,
    identity: RequestIdentity,
    params: PathParams,
    body: Result<Payload<Value>, ApiError>,
) -> Response {
    let dispatch = Dispatch::begin(&state, SITE_UPDATE, &identity);
    let outcome = (|| -> ApiResult<Message> {
        params.int("siteId", "site ID")?;
        body?;
        Ok(ApiResponse::ok(Message { message: "Site updated" }).placeholder())
    })();
    dispatch.finish(outcome)
}

/// DELETE /api/v1/civil/sites/{siteId}
async fn delete_site(State(state): State<AppState>, identity: RequestIdentity, params: PathParams) -> Response {
    let dispatch = Dispatch::begin(&state, SITE_DELETE, &identity);
    let outcome = params
        .int("siteId", "site ID")
        .map(|_| ApiResponse::no_content().placeholder());
    dispatch.finish(outcome)
}

/// POST /api/v1/civil/incidents
async fn report_incident(State(state): State<AppState>, identity: RequestIdentity, body: Result<Payload<Value>, ApiError>) -> Response {
    create_placeholder(&state, INCIDENT_CREATE, &identity, body, "Incident reported")
}

/// GET /api/v1/civil/sites/{siteId}/incidents
async fn list_incidents(State(state): State<AppState>, identity: RequestIdentity, params: PathParams, query: QueryParams) -> Response {
    list_placeholder(&state, INCIDENT_LIST, &identity, Some(&params), &query)
}

/// PUT /api/v1/civil/incidents/{id}/status
async fn update_incident_status(
    State(state): State<AppState>,
    identity: RequestIdentity,
    params: PathParams,
    body: Result<Payload<StatusBody>, ApiError>,
) -> Response {
    status_placeholder(&state, INCIDENT_STATUS, &identity, &params, "incident ID", body)
}

/// GET /api/v1/civil/sites/{siteId}/compliance
async fn list_compliance(State(state): State<AppState>, identity: RequestIdentity, params: PathParams, query: QueryParams) -> Response {
    list_placeholder(&state, COMPLIANCE_LIST, &identity, Some(&params), &query)
}

/// PUT /api/v1/civil/compliance/{id}/status
async fn update_compliance_status(
    State(state): State<AppState>,
    identity: RequestIdentity,
    params: PathParams,
    body: Result<Payload<StatusBody>, ApiError>,
) -> Response {
    status_placeholder(&state, COMPLIANCE_STATUS, &identity, &params, "compliance ID", body)
}

/// POST /api/v1/civil/permits
async fn create_permit(State(state): State<AppState>, identity: RequestIdentity, body: Result<Payload<Value>, ApiError>) -> Response {
    create_placeholder(&state, PERMIT_CREATE, &identity, body, "Permit created")
}

/// GET /api/v1/civil/sites/{siteId}/permits
async fn list_permits(State(state): State<AppState>, identity: RequestIdentity, params: PathParams, query: QueryParams) -> Response {
    list_placeholder(&state, PERMIT_LIST, &identity, Some(&params), &query)
}

/// PUT /api/v1/civil/permits/{id}/status
async fn update_permit_status(
    State(state): State<AppState>,
    identity: RequestIdentity,
    params: PathParams,
    body: Result<Payload<StatusBody>, ApiError>,
) -> Response {
    status_placeholder(&state, PERMIT_STATUS, &identity, &params, "permit ID", body)
}
