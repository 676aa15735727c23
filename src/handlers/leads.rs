//! Lead scoring (internal API: header identity accepted).

use axum::{
    extract::State,
    response::Response,
    routing::{get, post},
    Extension, Router,
};
use serde::Serialize;

use crate::dispatch::{Dispatch, Endpoint};
use crate::extract::{parse_tag, PathParams, QueryParams};
use crate::middleware::{ApiResponse, ApiResult, HeaderIdentity, RequestIdentity};
use crate::services::{LeadScore, ScoreCategory};
use crate::state::AppState;

const SCORE_GET: Endpoint = Endpoint::new("leads.score.get", "failed to get lead score");
const SCORE_CALCULATE: Endpoint = Endpoint::new("leads.score.calculate", "failed to calculate lead score");
const SCORES_BY_CATEGORY: Endpoint = Endpoint::new("leads.scores.category", "failed to get leads by category");
const SCORES_BATCH: Endpoint = Endpoint::new("leads.scores.batch", "failed to start batch calculation");

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/leads/scores/category/:category", get(scores_by_category))
        .route("/leads/scores/batch-calculate", post(batch_calculate))
        .route("/leads/:id/score", get(get_score))
        .route("/leads/:id/score/calculate", post(calculate_score))
        .layer(Extension(HeaderIdentity))
}

#[derive(Debug, Serialize)]
pub struct Calculated {
    pub message: &'static str,
    pub score: LeadScore,
}

#[derive(Debug, Serialize)]
pub struct CategoryLeads {
    pub category: ScoreCategory,
    pub count: usize,
    pub leads: Vec<LeadScore>,
}

#[derive(Debug, Serialize)]
pub struct BatchStarted {
    pub message: &'static str,
    pub status: &'static str,
}

/// GET /api/v1/leads/{id}/score
async fn get_score(State(state): State<AppState>, identity: RequestIdentity, params: PathParams) -> Response {
    let dispatch = Dispatch::begin(&state, SCORE_GET, &identity);
    let services = &state.services;

    let outcome: ApiResult<LeadScore> = async {
        let lead_id = params.int("id", "lead ID")?;
        let score = dispatch
            .lookup("lead score not found", |scope, tenant| async move {
                services.leads.score(&scope, &tenant, lead_id).await
            })
            .await?;
        Ok(ApiResponse::ok(score))
    }
    .await;

    dispatch.finish(outcome)
}

/// POST /api/v1/leads/{id}/score/calculate
async fn calculate_score(State(state): State<AppState>, identity: RequestIdentity, params: PathParams) -> Response {
    let dispatch = Dispatch::begin(&state, SCORE_CALCULATE, &identity);
    let services = &state.services;

    let outcome: ApiResult<Calculated> = async {
        let lead_id = params.int("id", "lead ID")?;
        let score = dispatch
            .invoke(|scope, tenant| async move { services.leads.calculate(&scope, &tenant, lead_id).await })
            .await?;
        Ok(ApiResponse::ok(Calculated {
            message: "Lead score calculated successfully",
            score,
        }))
    }
    .await;

    dispatch.finish(outcome)
}

/// GET /api/v1/leads/scores/category/{category}?limit
async fn scores_by_category(State(state): State<AppState>, identity: RequestIdentity, params: PathParams, query: QueryParams) -> Response {
    let dispatch = Dispatch::begin(&state, SCORES_BY_CATEGORY, &identity);
    let services = &state.services;

    let outcome: ApiResult<CategoryLeads> = async {
        let category = parse_tag::<ScoreCategory>(params.text("category")?)?;
        let limit = query.page()?.limit;

        let leads = dispatch
            .invoke(|scope, tenant| async move { services.leads.by_category(&scope, &tenant, category, limit).await })
            .await?;
        Ok(ApiResponse::ok(CategoryLeads {
            category,
            count: leads.len(),
            leads,
        }))
    }
    .await;

    dispatch.finish(outcome)
}

/// POST /api/v1/leads/scores/batch-calculate
///
/// Enqueues only; the scoring Service runs the batch on its own workers.
async fn batch_calculate(State(state): State<AppState>, identity: RequestIdentity) -> Response {
    let dispatch = Dispatch::begin(&state, SCORES_BATCH, &identity);
    let services = &state.services;

    let outcome: ApiResult<BatchStarted> = async {
        dispatch
            .invoke(|scope, tenant| async move { services.leads.enqueue_batch(&scope, &tenant).await })
            .await?;
        Ok(ApiResponse::ok(BatchStarted {
            message: "Batch score calculation started",
            status: "processing",
        }))
    }
    .await;

    dispatch.finish(outcome)
}
