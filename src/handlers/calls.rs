use axum::{
    extract::State,
    response::Response,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};

use crate::dispatch::{Dispatch, Endpoint};
use crate::error::ApiError;
use crate::extract::{parse_tag, required_text, Payload, PathParams, QueryParams};
use crate::middleware::{ApiResponse, ApiResult, Page, RequestIdentity, UserIdentity};
use crate::services::{Call, CallFilter, CallType, EndCall, NewCall};
use crate::state::AppState;
use crate::types::TenantId;

const PING: Endpoint = Endpoint::new("calls.ping", "failed to ping");
const LIST: Endpoint = Endpoint::new("calls.list", "failed to get calls");
const GET: Endpoint = Endpoint::new("calls.get", "failed to get call");
const CREATE: Endpoint = Endpoint::new("calls.create", "failed to create call");
const END: Endpoint = Endpoint::new("calls.end", "failed to end call");

const DEFAULT_STATUS: &str = "initiated";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/calls/ping", get(ping))
        .route("/calls", get(list_calls).post(create_call))
        .route("/calls/:id", get(get_call))
        .route("/calls/:id/end", post(end_call))
}

#[derive(Debug, Deserialize)]
pub struct CreateCallBody {
    #[serde(default)]
    pub lead_id: Option<i64>,
    #[serde(default)]
    pub agent_id: Option<i64>,
    #[serde(default)]
    pub call_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub recording_url: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EndCallBody {
    #[serde(default)]
    pub outcome: Option<String>,
    #[serde(default)]
    pub duration_secs: i64,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Pong {
    pub status: &'static str,
    pub tenant_id: TenantId,
}

/// GET /api/v1/calls/ping
async fn ping(State(state): State<AppState>, identity: RequestIdentity) -> Response {
    let dispatch = Dispatch::begin(&state, PING, &identity);
    let outcome: ApiResult<Pong> = Ok(ApiResponse::ok(Pong {
        status: "ok",
        tenant_id: dispatch.tenant().clone(),
    }));
    dispatch.finish(outcome)
}

/// GET /api/v1/calls?status&outcome&call_type&offset&limit
async fn list_calls(State(state): State<AppState>, identity: RequestIdentity, query: QueryParams) -> Response {
    let dispatch = Dispatch::begin(&state, LIST, &identity);
    let services = &state.services;

    let outcome: ApiResult<Page<Call>> = async {
        let filter = CallFilter {
            status: query.get("status").map(str::to_string),
            outcome: query.get("outcome").map(str::to_string),
            call_type: query.get("call_type").map(parse_tag::<CallType>).transpose()?,
            page: query.page()?,
        };

        let (calls, total) = dispatch
            .invoke(|scope, tenant| {
                let filter = &filter;
                async move { services.calls.list(&scope, &tenant, filter).await }
            })
            .await?;
        Ok(ApiResponse::ok(Page::new(calls, total, &filter.page)))
    }
    .await;

    dispatch.finish(outcome)
}

/// GET /api/v1/calls/{id}
async fn get_call(State(state): State<AppState>, identity: RequestIdentity, params: PathParams) -> Response {
    let dispatch = Dispatch::begin(&state, GET, &identity);
    let services = &state.services;

    let outcome: ApiResult<Call> = async {
        let id = params.int("id", "call ID")?;
        let call = dispatch
            .lookup("call not found", |scope, tenant| async move { services.calls.get(&scope, &tenant, id).await })
            .await?;
        Ok(ApiResponse::ok(call))
    }
    .await;

    dispatch.finish(outcome)
}

/// POST /api/v1/calls
async fn create_call(State(state): State<AppState>, identity: UserIdentity, body: Result<Payload<CreateCallBody>, ApiError>) -> Response {
    let dispatch = Dispatch::begin(&state, CREATE, &identity);
    let services = &state.services;

    let outcome: ApiResult<Call> = async {
        let Payload(body) = body?;
        let (Some(lead_id), Some(agent_id)) = (body.lead_id.filter(|id| *id > 0), body.agent_id.filter(|id| *id > 0)) else {
            return Err(ApiError::bad_request("lead_id and agent_id are required"));
        };
        let call_type = match body.call_type.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            Some(raw) => parse_tag::<CallType>(raw)?,
            None => CallType::default(),
        };

        let call = NewCall {
            lead_id,
            agent_id,
            call_type,
            status: body
                .status
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_STATUS.to_string()),
            recording_url: body.recording_url,
            notes: body.notes,
            created_by: identity.user,
        };

        let created = dispatch
            .invoke(|scope, tenant| async move { services.calls.create(&scope, &tenant, call).await })
            .await?;
        Ok(ApiResponse::created(created))
    }
    .await;

    dispatch.finish(outcome)
}

/// POST /api/v1/calls/{id}/end
async fn end_call(
    State(state): State<AppState>,
    identity: UserIdentity,
    params: PathParams,
    body: Result<Payload<EndCallBody>, ApiError>,
) -> Response {
    let dispatch = Dispatch::begin(&state, END, &identity);
    let services = &state.services;

    let outcome: ApiResult<Call> = async {
        let id = params.int("id", "call ID")?;
        let Payload(body) = body?;
        let call_outcome = required_text("outcome", body.outcome.as_deref())?.to_string();
        if body.duration_secs < 0 {
            return Err(ApiError::bad_request("duration_secs must not be negative"));
        }

        let end = EndCall {
            outcome: call_outcome,
            duration_secs: body.duration_secs,
            notes: body.notes,
            ended_by: identity.user,
        };

        let ended = dispatch
            .invoke(|scope, tenant| async move { services.calls.end(&scope, &tenant, id, end).await })
            .await?;
        Ok(ApiResponse::ok(ended))
    }
    .await;

    dispatch.finish(outcome)
}
