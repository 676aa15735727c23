//! Storage seam shared by the template resources.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::ServiceError;
use crate::dispatch::Scope;
use crate::extract::PageRequest;
use crate::resource::{Resource, ResourceKey};
use crate::types::{TenantId, UserId};

#[async_trait]
pub trait ResourceStore<R: Resource>: Send + Sync {
    async fn list(&self, scope: &Scope, tenant: &TenantId, page: PageRequest) -> Result<(Vec<R::Record>, i64), ServiceError>;

    async fn get(&self, scope: &Scope, tenant: &TenantId, key: &R::Key) -> Result<Option<R::Record>, ServiceError>;

    async fn create(&self, scope: &Scope, tenant: &TenantId, actor: Option<UserId>, input: R::Create) -> Result<R::Record, ServiceError>;

    async fn update(&self, scope: &Scope, tenant: &TenantId, key: &R::Key, input: R::Update) -> Result<Option<R::Record>, ServiceError>;

    /// Returns whether a record was removed.
    async fn delete(&self, scope: &Scope, tenant: &TenantId, key: &R::Key) -> Result<bool, ServiceError>;
}

/// Insertion-ordered in-memory store, partitioned by tenant.
pub struct MemoryStore<R: Resource> {
    rows: RwLock<HashMap<TenantId, Vec<(R::Key, R::Record)>>>,
    sequence: AtomicI64,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> Default for MemoryStore<R> {
    fn default() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            sequence: AtomicI64::new(0),
            _resource: PhantomData,
        }
    }
}

impl<R: Resource> MemoryStore<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<dyn ResourceStore<R>> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl<R: Resource> ResourceStore<R> for MemoryStore<R> {
    async fn list(&self, _scope: &Scope, tenant: &TenantId, page: PageRequest) -> Result<(Vec<R::Record>, i64), ServiceError> {
        let rows = self.rows.read().await;
        let records: Vec<R::Record> = rows
            .get(tenant)
            .map(|list| list.iter().map(|(_, record)| record.clone()).collect())
            .unwrap_or_default();

        let total = records.len() as i64;
        Ok((page.slice(&records), total))
    }

    async fn get(&self, _scope: &Scope, tenant: &TenantId, key: &R::Key) -> Result<Option<R::Record>, ServiceError> {
        let rows = self.rows.read().await;
        Ok(rows
            .get(tenant)
            .and_then(|list| list.iter().find(|(k, _)| k == key))
            .map(|(_, record)| record.clone()))
    }

    async fn create(&self, _scope: &Scope, tenant: &TenantId, actor: Option<UserId>, input: R::Create) -> Result<R::Record, ServiceError> {
        let mut rows = self.rows.write().await;
        let list = rows.entry(tenant.clone()).or_default();

        let key = match R::supplied_key(&input) {
            Some(key) => {
                if list.iter().any(|(k, _)| k == &key) {
                    return Err(ServiceError::Conflict(format!("{} {} already exists", R::NOUN, key)));
                }
                key
            }
            None => {
                let next = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
                R::Key::from_sequence(next).ok_or_else(|| ServiceError::Invalid(format!("{} key is required", R::NOUN)))?
            }
        };

        let record = R::build(key.clone(), tenant, actor, input);
        list.push((key, record.clone()));
        Ok(record)
    }

    async fn update(&self, _scope: &Scope, tenant: &TenantId, key: &R::Key, input: R::Update) -> Result<Option<R::Record>, ServiceError> {
        let mut rows = self.rows.write().await;
        let Some((_, record)) = rows.get_mut(tenant).and_then(|list| list.iter_mut().find(|(k, _)| k == key)) else {
            return Ok(None);
        };

        R::apply(record, input);
        Ok(Some(record.clone()))
    }

    async fn delete(&self, _scope: &Scope, tenant: &TenantId, key: &R::Key) -> Result<bool, ServiceError> {
        let mut rows = self.rows.write().await;
        let Some(list) = rows.get_mut(tenant) else {
            return Ok(false);
        };

        let before = list.len();
        list.retain(|(k, _)| k != key);
        Ok(list.len() != before)
    }
}
