use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::ServiceError;
use crate::dispatch::Scope;
use crate::types::{TenantId, UserId};

/// Permission predicate `(user, tenant, permission-code) -> allow/deny`.
#[async_trait]
pub trait RbacService: Send + Sync {
    async fn has_permission(&self, scope: &Scope, tenant: &TenantId, user: UserId, permission: &str) -> Result<bool, ServiceError>;
}

/// Grant table held in memory. A permissive table allows everything and is
/// only wired in development.
#[derive(Debug, Default)]
pub struct MemoryRbac {
    permissive: bool,
    grants: RwLock<HashMap<(TenantId, UserId), HashSet<String>>>,
}

impl MemoryRbac {
    pub fn strict() -> Self {
        Self::default()
    }

    pub fn permissive() -> Self {
        Self {
            permissive: true,
            ..Self::default()
        }
    }

    pub fn with_grant(mut self, tenant: TenantId, user: UserId, permission: impl Into<String>) -> Self {
        self.grants
            .get_mut()
            .entry((tenant, user))
            .or_default()
            .insert(permission.into());
        self
    }

    pub async fn grant(&self, tenant: TenantId, user: UserId, permission: impl Into<String>) {
        self.grants
            .write()
            .await
            .entry((tenant, user))
            .or_default()
            .insert(permission.into());
    }
}

#[async_trait]
impl RbacService for MemoryRbac {
    async fn has_permission(&self, _scope: &Scope, tenant: &TenantId, user: UserId, permission: &str) -> Result<bool, ServiceError> {
        if self.permissive {
            return Ok(true);
        }

        let grants = self.grants.read().await;
        Ok(grants
            .get(&(tenant.clone(), user))
            .is_some_and(|codes| codes.contains(permission)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn grants_are_per_tenant() {
        let t1 = TenantId::new("t1").unwrap();
        let t2 = TenantId::new("t2").unwrap();
        let rbac = MemoryRbac::strict().with_grant(t1.clone(), UserId(7), "gl.manage");
        let scope = Scope::detached();

        assert!(rbac.has_permission(&scope, &t1, UserId(7), "gl.manage").await.unwrap());
        assert!(!rbac.has_permission(&scope, &t2, UserId(7), "gl.manage").await.unwrap());
        assert!(!rbac.has_permission(&scope, &t1, UserId(8), "gl.manage").await.unwrap());

        rbac.grant(t2.clone(), UserId(7), "gl.manage").await;
        assert!(rbac.has_permission(&scope, &t2, UserId(7), "gl.manage").await.unwrap());
    }

    #[tokio::test]
    async fn permissive_allows_everything() {
        let rbac = MemoryRbac::permissive();
        let allowed = rbac
            .has_permission(&Scope::detached(), &TenantId::new("t1").unwrap(), UserId(1), "roles.manage")
            .await
            .unwrap();
        assert!(allowed);
    }
}
