//! Stand-ins for Services whose backends are deployed separately. Every
//! call answers `Unavailable`, which the handler layer renders as 503.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;

use super::{AiAnswer, AiOrchestrator, AiRequest, AnalyticsService, CivilService, ProviderInfo, ReportFormat, ReportRequest, ServiceError, TrendPoint};
use crate::dispatch::Scope;
use crate::types::TenantId;

#[derive(Debug, Clone, Copy, Default)]
pub struct Unconfigured {
    backend: &'static str,
}

impl Unconfigured {
    pub const fn new(backend: &'static str) -> Self {
        Self { backend }
    }

    fn unavailable(&self) -> ServiceError {
        ServiceError::Unavailable(format!("{} backend is not configured", self.backend))
    }
}

#[async_trait]
impl AiOrchestrator for Unconfigured {
    async fn process_query(&self, _scope: &Scope, _tenant: &TenantId, _request: AiRequest) -> Result<AiAnswer, ServiceError> {
        Err(self.unavailable())
    }

    async fn providers(&self, _scope: &Scope, _tenant: &TenantId) -> Result<Vec<ProviderInfo>, ServiceError> {
        Ok(Vec::new())
    }
}

#[async_trait]
impl AnalyticsService for Unconfigured {
    async fn generate_report(&self, _scope: &Scope, _tenant: &TenantId, _request: &ReportRequest) -> Result<Value, ServiceError> {
        Err(self.unavailable())
    }

    async fn trends(
        &self,
        _scope: &Scope,
        _tenant: &TenantId,
        _metric: &str,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<Vec<TrendPoint>, ServiceError> {
        Err(self.unavailable())
    }

    async fn export(&self, _scope: &Scope, _tenant: &TenantId, _report: &Value, _format: ReportFormat) -> Result<Vec<u8>, ServiceError> {
        Err(self.unavailable())
    }

    async fn metrics(&self, _scope: &Scope, _tenant: &TenantId, _metric: &str) -> Result<Value, ServiceError> {
        Err(self.unavailable())
    }
}

#[async_trait]
impl CivilService for Unconfigured {
    async fn dashboard(&self, _scope: &Scope, _tenant: &TenantId) -> Result<Value, ServiceError> {
        Err(self.unavailable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn answers_unavailable() {
        let ai = Unconfigured::new("ai");
        let tenant = TenantId::new("t1").unwrap();
        let providers = ai.providers(&Scope::detached(), &tenant).await.unwrap();
        assert!(providers.is_empty());

        let civil = Unconfigured::new("civil");
        let err = civil.dashboard(&Scope::detached(), &tenant).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unavailable(_)));
    }
}
