use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ServiceError;
use crate::dispatch::Scope;
use crate::extract::Tag;
use crate::types::TenantId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Json,
    Csv,
    Pdf,
}

impl Tag for ReportFormat {
    const FIELD: &'static str = "format";
    const ALLOWED: &'static [Self] = &[ReportFormat::Json, ReportFormat::Csv, ReportFormat::Pdf];

    fn as_tag(&self) -> &'static str {
        self.extension()
    }
}

impl ReportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ReportFormat::Json => "application/json",
            ReportFormat::Csv => "text/csv",
            ReportFormat::Pdf => "application/pdf",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Json => "json",
            ReportFormat::Csv => "csv",
            ReportFormat::Pdf => "pdf",
        }
    }
}

/// Report parameters passed opaquely to the analytics engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRequest {
    /// Opaque report type tag; the engine validates it.
    pub report_type: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub filters: Map<String, Value>,
    pub format: ReportFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[async_trait]
pub trait AnalyticsService: Send + Sync {
    async fn generate_report(&self, scope: &Scope, tenant: &TenantId, request: &ReportRequest) -> Result<Value, ServiceError>;

    async fn trends(
        &self,
        scope: &Scope,
        tenant: &TenantId,
        metric: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TrendPoint>, ServiceError>;

    /// Render a generated report into the requested file format.
    async fn export(&self, scope: &Scope, tenant: &TenantId, report: &Value, format: ReportFormat) -> Result<Vec<u8>, ServiceError>;

    async fn metrics(&self, scope: &Scope, tenant: &TenantId, metric: &str) -> Result<Value, ServiceError>;
}
