use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ServiceError;
use crate::dispatch::Scope;
use crate::types::{TenantId, UserId};

/// Query routed to whichever AI provider the orchestrator selects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AiRequest {
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub query: String,
    pub context: Option<Value>,
    pub priority: String,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiAnswer {
    pub response: String,
    pub provider: String,
    pub tokens_used: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub name: String,
    pub model: String,
    pub available: bool,
}

#[async_trait]
pub trait AiOrchestrator: Send + Sync {
    async fn process_query(&self, scope: &Scope, tenant: &TenantId, request: AiRequest) -> Result<AiAnswer, ServiceError>;

    async fn providers(&self, scope: &Scope, tenant: &TenantId) -> Result<Vec<ProviderInfo>, ServiceError>;
}
