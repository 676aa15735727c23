#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{Extension, Router};
use chrono::NaiveDate;
use reqwest::{RequestBuilder, Response};
use serde_json::{json, Value};

use vyomtech_api::auth::{issue_token, Claims};
use vyomtech_api::config::AppConfig;
use vyomtech_api::dispatch::Scope;
use vyomtech_api::services::{
    AiAnswer, AiOrchestrator, AiRequest, AnalyticsService, CivilService, LeadScore, LeadScoringService, ProviderInfo,
    ReportFormat, ReportRequest, ScoreCategory, ServiceError, Services, TrendPoint,
};
use vyomtech_api::types::TenantId;
use vyomtech_api::{app, AppState};

pub const JWT_SECRET: &str = "test-secret";

/// A router served on a real local port.
pub struct TestServer {
    pub base_url: String,
    pub client: reqwest::Client,
    secret: String,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Bearer token for `user` in `tenant`, signed with the server's secret.
    pub fn token(&self, tenant: &str, user: i64) -> String {
        let claims = Claims::new(user, tenant, vec!["member".to_string()], 1).expect("invalid test claims");
        issue_token(&self.secret, &claims).expect("failed to sign test token")
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path))
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path))
    }

    pub fn put(&self, path: &str) -> RequestBuilder {
        self.client.put(self.url(path))
    }

    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.client.delete(self.url(path))
    }

    pub fn as_user(&self, builder: RequestBuilder, tenant: &str, user: i64) -> RequestBuilder {
        builder.bearer_auth(self.token(tenant, user))
    }
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.security.jwt_secret = JWT_SECRET.to_string();
    config
}

pub async fn spawn(config: AppConfig, services: Services) -> Result<TestServer> {
    let secret = config.security.jwt_secret.clone();
    serve(app(AppState::new(config, services)), secret).await
}

/// Serve with `tenant` already bound in the request context, as an upstream
/// gateway would, and no user.
pub async fn spawn_with_context_tenant(config: AppConfig, services: Services, tenant: &str) -> Result<TestServer> {
    let secret = config.security.jwt_secret.clone();
    let tenant = TenantId::new(tenant).context("empty tenant")?;
    let router = app(AppState::new(config, services)).layer(Extension(tenant));
    serve(router, secret).await
}

async fn serve(router: Router, secret: String) -> Result<TestServer> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("failed to bind port {port}"))?;

    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    Ok(TestServer {
        base_url: format!("http://127.0.0.1:{port}"),
        client: reqwest::Client::new(),
        secret,
    })
}

/// Development config with the default in-memory Services.
pub async fn spawn_default() -> Result<TestServer> {
    let config = test_config();
    let services = Services::in_memory(&config);
    spawn(config, services).await
}

/// Every non-2xx response carries a non-empty `{"error"}` JSON body.
pub async fn expect_error(response: Response, status: u16) -> Result<String> {
    assert_eq!(response.status().as_u16(), status, "unexpected status");
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("application/json"), "content-type was {content_type}");

    let body: Value = response.json().await?;
    let message = body["error"].as_str().context("missing error field")?.to_string();
    assert!(!message.is_empty());
    Ok(message)
}

// Recording fakes

#[derive(Default)]
pub struct RecordingAi {
    pub calls: Mutex<Vec<AiRequest>>,
}

#[async_trait]
impl AiOrchestrator for RecordingAi {
    async fn process_query(&self, _scope: &Scope, _tenant: &TenantId, request: AiRequest) -> Result<AiAnswer, ServiceError> {
        self.calls.lock().unwrap().push(request);
        Ok(AiAnswer {
            response: "ok".to_string(),
            provider: "openai".to_string(),
            tokens_used: 7,
        })
    }

    async fn providers(&self, _scope: &Scope, _tenant: &TenantId) -> Result<Vec<ProviderInfo>, ServiceError> {
        Ok(vec![ProviderInfo {
            name: "openai".to_string(),
            model: "gpt-4".to_string(),
            available: true,
        }])
    }
}

pub type TrendCall = (TenantId, String, NaiveDate, NaiveDate);

#[derive(Default)]
pub struct RecordingAnalytics {
    pub trend_calls: Mutex<Vec<TrendCall>>,
    pub reports: Mutex<Vec<ReportRequest>>,
    pub exports: Mutex<Vec<ReportFormat>>,
}

impl RecordingAnalytics {
    pub fn trend_count(&self) -> usize {
        self.trend_calls.lock().unwrap().len()
    }
}

#[async_trait]
impl AnalyticsService for RecordingAnalytics {
    async fn generate_report(&self, _scope: &Scope, _tenant: &TenantId, request: &ReportRequest) -> Result<Value, ServiceError> {
        self.reports.lock().unwrap().push(request.clone());
        Ok(json!({"report_type": request.report_type, "rows": [[1, 2]]}))
    }

    async fn trends(
        &self,
        _scope: &Scope,
        tenant: &TenantId,
        metric: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TrendPoint>, ServiceError> {
        self.trend_calls.lock().unwrap().push((tenant.clone(), metric.to_string(), start, end));
        Ok(vec![
            TrendPoint {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                value: 3.0,
            },
            TrendPoint {
                date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                value: 5.5,
            },
        ])
    }

    async fn export(&self, _scope: &Scope, _tenant: &TenantId, _report: &Value, format: ReportFormat) -> Result<Vec<u8>, ServiceError> {
        self.exports.lock().unwrap().push(format);
        Ok(b"a,b\n1,2\n".to_vec())
    }

    async fn metrics(&self, _scope: &Scope, _tenant: &TenantId, metric: &str) -> Result<Value, ServiceError> {
        Ok(json!({"metric": metric, "value": 42}))
    }
}

pub struct FixedCivil;

#[async_trait]
impl CivilService for FixedCivil {
    async fn dashboard(&self, _scope: &Scope, tenant: &TenantId) -> Result<Value, ServiceError> {
        Ok(json!({"tenant": tenant, "active_sites": 3}))
    }
}

/// Civil service whose dashboard panics mid-request.
pub struct PanickingCivil;

#[async_trait]
impl CivilService for PanickingCivil {
    async fn dashboard(&self, _scope: &Scope, _tenant: &TenantId) -> Result<Value, ServiceError> {
        panic!("dashboard backend exploded")
    }
}

#[derive(Default)]
pub struct RecordingLeads {
    pub category_calls: Mutex<Vec<(TenantId, ScoreCategory, i64)>>,
    pub batches: Mutex<Vec<TenantId>>,
}

impl RecordingLeads {
    pub fn call_count(&self) -> usize {
        self.category_calls.lock().unwrap().len()
    }
}

#[async_trait]
impl LeadScoringService for RecordingLeads {
    async fn score(&self, _scope: &Scope, _tenant: &TenantId, _lead_id: i64) -> Result<Option<LeadScore>, ServiceError> {
        Ok(None)
    }

    async fn calculate(&self, _scope: &Scope, _tenant: &TenantId, _lead_id: i64) -> Result<LeadScore, ServiceError> {
        Err(ServiceError::NotFound("lead not found".to_string()))
    }

    async fn by_category(&self, _scope: &Scope, tenant: &TenantId, category: ScoreCategory, limit: i64) -> Result<Vec<LeadScore>, ServiceError> {
        self.category_calls.lock().unwrap().push((tenant.clone(), category, limit));
        Ok(Vec::new())
    }

    async fn enqueue_batch(&self, _scope: &Scope, tenant: &TenantId) -> Result<(), ServiceError> {
        self.batches.lock().unwrap().push(tenant.clone());
        Ok(())
    }
}

/// Default Services with the recording fakes swapped in.
pub struct Fakes {
    pub ai: Arc<RecordingAi>,
    pub analytics: Arc<RecordingAnalytics>,
    pub leads: Arc<RecordingLeads>,
}

pub fn with_fakes(config: &AppConfig) -> (Services, Fakes) {
    let fakes = Fakes {
        ai: Arc::new(RecordingAi::default()),
        analytics: Arc::new(RecordingAnalytics::default()),
        leads: Arc::new(RecordingLeads::default()),
    };

    let mut services = Services::in_memory(config);
    services.ai = fakes.ai.clone();
    services.analytics = fakes.analytics.clone();
    services.leads = fakes.leads.clone();
    services.civil = Arc::new(FixedCivil);
    (services, fakes)
}

pub async fn spawn_with_fakes() -> Result<(TestServer, Fakes)> {
    let config = test_config();
    let (services, fakes) = with_fakes(&config);
    let server = spawn(config, services).await?;
    Ok((server, fakes))
}
