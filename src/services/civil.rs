use async_trait::async_trait;
use serde_json::Value;

use super::ServiceError;
use crate::dispatch::Scope;
use crate::types::TenantId;

/// Civil-engineering site tracking. Only the dashboard is backed by a
/// Service today; the remaining site, incident, compliance and permit
/// endpoints are placeholders in the handler layer.
#[async_trait]
pub trait CivilService: Send + Sync {
    async fn dashboard(&self, scope: &Scope, tenant: &TenantId) -> Result<Value, ServiceError>;
}
