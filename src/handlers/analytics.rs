use axum::{
    extract::State,
    http::Method,
    response::Response,
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::dispatch::{Dispatch, Endpoint};
use crate::error::ApiError;
use crate::extract::{parse_date, parse_tag, prefer, required_text, Payload, QueryParams};
use crate::middleware::{ApiResponse, ApiResult, Attachment, RequestIdentity};
use crate::services::{ReportFormat, ReportRequest, TrendPoint};
use crate::state::AppState;

const REPORT: Endpoint = Endpoint::new("analytics.report", "failed to generate report");
const TRENDS: Endpoint = Endpoint::new("analytics.trends", "failed to get trends");
const EXPORT: Endpoint = Endpoint::new("analytics.export", "failed to export report");
const METRICS: Endpoint = Endpoint::new("analytics.metrics", "failed to get metrics");

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/analytics/reports", post(generate_report))
        .route("/analytics/trends", get(trends))
        .route("/analytics/export", post(export_report))
        .route("/analytics/metrics", get(metrics))
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportBody {
    #[serde(rename = "type", default)]
    pub report_type: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub filters: Option<Map<String, Value>>,
    #[serde(default)]
    pub format: Option<String>,
}

impl ReportBody {
    /// Validate into a report request. `query` supplies a competing
    /// `format` value; the body wins on POST.
    fn into_request(self, method: &Method, query: &QueryParams) -> Result<ReportRequest, ApiError> {
        let report_type = required_text("type", self.report_type.as_deref())?.to_string();
        let start_date = parse_date("start_date", required_text("start_date", self.start_date.as_deref())?)?;
        let end_date = parse_date("end_date", required_text("end_date", self.end_date.as_deref())?)?;
        check_range(start_date, end_date)?;

        let body_format = self.format.as_deref().map(str::trim).filter(|f| !f.is_empty());
        let format = match prefer(method, query.get("format"), body_format) {
            Some(raw) => parse_tag::<ReportFormat>(raw)?,
            None => ReportFormat::default(),
        };

        Ok(ReportRequest {
            report_type,
            start_date,
            end_date,
            filters: self.filters.unwrap_or_default(),
            format,
        })
    }
}

fn check_range(start: NaiveDate, end: NaiveDate) -> Result<(), ApiError> {
    if end < start {
        return Err(ApiError::bad_request("end_date must not be before start_date"));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct TrendSeries {
    pub metric: String,
    pub data: Vec<TrendPoint>,
}

/// POST /api/v1/analytics/reports
async fn generate_report(
    State(state): State<AppState>,
    identity: RequestIdentity,
    method: Method,
    query: QueryParams,
    body: Result<Payload<ReportBody>, ApiError>,
) -> Response {
    let dispatch = Dispatch::begin(&state, REPORT, &identity);
    let services = &state.services;

    let outcome: ApiResult<Value> = async {
        let Payload(body) = body?;
        let request = body.into_request(&method, &query)?;

        let report = dispatch
            .invoke(|scope, tenant| async move { services.analytics.generate_report(&scope, &tenant, &request).await })
            .await?;
        Ok(ApiResponse::ok(report))
    }
    .await;

    dispatch.finish(outcome)
}

/// GET /api/v1/analytics/trends?metric&start_date&end_date
async fn trends(State(state): State<AppState>, identity: RequestIdentity, query: QueryParams) -> Response {
    let dispatch = Dispatch::begin(&state, TRENDS, &identity);
    let services = &state.services;

    let outcome: ApiResult<TrendSeries> = async {
        let metric = query.required("metric", "metric parameter required")?.to_string();
        let start = query.date("start_date")?;
        let end = query.date("end_date")?;
        check_range(start, end)?;

        let data = dispatch
            .invoke(|scope, tenant| {
                let metric = metric.clone();
                async move { services.analytics.trends(&scope, &tenant, &metric, start, end).await }
            })
            .await?;
        Ok(ApiResponse::ok(TrendSeries { metric, data }))
    }
    .await;

    dispatch.finish(outcome)
}

/// POST /api/v1/analytics/export
async fn export_report(
    State(state): State<AppState>,
    identity: RequestIdentity,
    method: Method,
    query: QueryParams,
    body: Result<Payload<ReportBody>, ApiError>,
) -> Response {
    let dispatch = Dispatch::begin(&state, EXPORT, &identity);
    let services = &state.services;

    let outcome: Result<Attachment, ApiError> = async {
        let Payload(body) = body?;
        let request = body.into_request(&method, &query)?;
        let format = request.format;

        let report = dispatch
            .invoke(|scope, tenant| async move { services.analytics.generate_report(&scope, &tenant, &request).await })
            .await?;
        let bytes = dispatch
            .invoke(|scope, tenant| async move { services.analytics.export(&scope, &tenant, &report, format).await })
            .await?;

        Ok(Attachment::new(bytes, format))
    }
    .await;

    dispatch.finish(outcome)
}

/// GET /api/v1/analytics/metrics?metric
async fn metrics(State(state): State<AppState>, identity: RequestIdentity, query: QueryParams) -> Response {
    let dispatch = Dispatch::begin(&state, METRICS, &identity);
    let services = &state.services;

    let outcome: ApiResult<Value> = async {
        let metric = query.required("metric", "metric parameter required")?.to_string();
        let document = dispatch
            .invoke(|scope, tenant| async move { services.analytics.metrics(&scope, &tenant, &metric).await })
            .await?;
        Ok(ApiResponse::ok(document))
    }
    .await;

    dispatch.finish(outcome)
}
