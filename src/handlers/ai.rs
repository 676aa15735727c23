use axum::{
    extract::State,
    response::Response,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dispatch::{Dispatch, Endpoint};
use crate::error::ApiError;
use crate::extract::{required_text, Payload};
use crate::middleware::{ApiResponse, ApiResult, RequestIdentity, UserIdentity};
use crate::services::{AiAnswer, AiRequest, ProviderInfo};
use crate::state::AppState;

const QUERY: Endpoint = Endpoint::new("ai.query", "failed to process query");
const PROVIDERS: Endpoint = Endpoint::new("ai.providers", "failed to list providers");

const DEFAULT_PRIORITY: &str = "medium";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ai/query", post(query))
        .route("/ai/providers", get(providers))
}

#[derive(Debug, Deserialize)]
pub struct QueryBody {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub context: Option<Value>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct QueryAnswer {
    pub response: String,
    pub provider: String,
    pub tokens: u64,
}

impl From<AiAnswer> for QueryAnswer {
    fn from(answer: AiAnswer) -> Self {
        Self {
            response: answer.response,
            provider: answer.provider,
            tokens: answer.tokens_used,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProviderList {
    pub providers: Vec<ProviderInfo>,
}

/// POST /api/v1/ai/query
async fn query(State(state): State<AppState>, identity: UserIdentity, body: Result<Payload<QueryBody>, ApiError>) -> Response {
    let dispatch = Dispatch::begin(&state, QUERY, &identity);
    let services = &state.services;

    let outcome: ApiResult<QueryAnswer> = async {
        let Payload(body) = body?;
        let query = required_text("query", body.query.as_deref())?.to_string();
        let priority = body
            .priority
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PRIORITY.to_string());

        let request = AiRequest {
            tenant_id: dispatch.tenant().clone(),
            user_id: identity.user,
            query,
            context: body.context,
            priority,
            max_tokens: body.max_tokens,
        };

        let answer = dispatch
            .invoke(|scope, tenant| async move { services.ai.process_query(&scope, &tenant, request).await })
            .await?;

        Ok(ApiResponse::ok(QueryAnswer::from(answer)))
    }
    .await;

    dispatch.finish(outcome)
}

/// GET /api/v1/ai/providers
async fn providers(State(state): State<AppState>, identity: RequestIdentity) -> Response {
    let dispatch = Dispatch::begin(&state, PROVIDERS, &identity);
    let services = &state.services;

    let outcome: ApiResult<ProviderList> = async {
        let providers = dispatch
            .invoke(|scope, tenant| async move { services.ai.providers(&scope, &tenant).await })
            .await?;
        Ok(ApiResponse::ok(ProviderList { providers }))
    }
    .await;

    dispatch.finish(outcome)
}
