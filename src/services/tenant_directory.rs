use std::collections::HashSet;

use async_trait::async_trait;

use super::ServiceError;
use crate::types::TenantId;

/// Answers whether a tenant may currently use the API.
#[async_trait]
pub trait TenantDirectory: Send + Sync {
    async fn is_active(&self, tenant: &TenantId) -> Result<bool, ServiceError>;
}

/// Every tenant is active unless explicitly disabled.
#[derive(Debug, Clone, Default)]
pub struct StaticTenantDirectory {
    disabled: HashSet<String>,
}

impl StaticTenantDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_disabled<I, S>(disabled: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            disabled: disabled.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl TenantDirectory for StaticTenantDirectory {
    async fn is_active(&self, tenant: &TenantId) -> Result<bool, ServiceError> {
        Ok(!self.disabled.contains(tenant.as_str()))
    }
}
