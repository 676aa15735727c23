use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::ServiceError;
use crate::dispatch::Scope;
use crate::extract::{PageRequest, Tag};
use crate::types::{TenantId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallType {
    Inbound,
    #[default]
    Outbound,
}

impl Tag for CallType {
    const FIELD: &'static str = "call_type";
    const ALLOWED: &'static [Self] = &[CallType::Inbound, CallType::Outbound];

    fn as_tag(&self) -> &'static str {
        match self {
            CallType::Inbound => "inbound",
            CallType::Outbound => "outbound",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    pub id: i64,
    pub tenant_id: TenantId,
    pub lead_id: i64,
    pub agent_id: i64,
    pub call_type: CallType,
    pub status: String,
    pub outcome: Option<String>,
    pub duration_secs: Option<i64>,
    pub recording_url: Option<String>,
    pub notes: Option<String>,
    pub created_by: UserId,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCall {
    pub lead_id: i64,
    pub agent_id: i64,
    pub call_type: CallType,
    pub status: String,
    pub recording_url: Option<String>,
    pub notes: Option<String>,
    pub created_by: UserId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EndCall {
    pub outcome: String,
    pub duration_secs: i64,
    pub notes: Option<String>,
    pub ended_by: UserId,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CallFilter {
    pub status: Option<String>,
    pub outcome: Option<String>,
    pub call_type: Option<CallType>,
    pub page: PageRequest,
}

impl CallFilter {
    fn matches(&self, call: &Call) -> bool {
        self.status.as_deref().map_or(true, |s| call.status == s)
            && self.outcome.as_deref().map_or(true, |o| call.outcome.as_deref() == Some(o))
            && self.call_type.map_or(true, |t| call.call_type == t)
    }
}

#[async_trait]
pub trait CallService: Send + Sync {
    /// One page of calls plus the total matching the filter.
    async fn list(&self, scope: &Scope, tenant: &TenantId, filter: &CallFilter) -> Result<(Vec<Call>, i64), ServiceError>;

    async fn get(&self, scope: &Scope, tenant: &TenantId, id: i64) -> Result<Option<Call>, ServiceError>;

    async fn create(&self, scope: &Scope, tenant: &TenantId, call: NewCall) -> Result<Call, ServiceError>;

    /// Close a call. Ending an already ended call is a conflict.
    async fn end(&self, scope: &Scope, tenant: &TenantId, id: i64, end: EndCall) -> Result<Call, ServiceError>;
}

/// Process-local call log partitioned by tenant.
#[derive(Debug, Default)]
pub struct MemoryCalls {
    calls: RwLock<HashMap<TenantId, Vec<Call>>>,
    next_id: AtomicI64,
}

impl MemoryCalls {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CallService for MemoryCalls {
    async fn list(&self, _scope: &Scope, tenant: &TenantId, filter: &CallFilter) -> Result<(Vec<Call>, i64), ServiceError> {
        let calls = self.calls.read().await;
        let matching: Vec<Call> = calls
            .get(tenant)
            .map(|list| list.iter().filter(|c| filter.matches(c)).cloned().collect())
            .unwrap_or_default();

        let total = matching.len() as i64;
        Ok((filter.page.slice(&matching), total))
    }

    async fn get(&self, _scope: &Scope, tenant: &TenantId, id: i64) -> Result<Option<Call>, ServiceError> {
        let calls = self.calls.read().await;
        Ok(calls.get(tenant).and_then(|list| list.iter().find(|c| c.id == id).cloned()))
    }

    async fn create(&self, _scope: &Scope, tenant: &TenantId, call: NewCall) -> Result<Call, ServiceError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let record = Call {
            id,
            tenant_id: tenant.clone(),
            lead_id: call.lead_id,
            agent_id: call.agent_id,
            call_type: call.call_type,
            status: call.status,
            outcome: None,
            duration_secs: None,
            recording_url: call.recording_url,
            notes: call.notes,
            created_by: call.created_by,
            started_at: Utc::now(),
            ended_at: None,
        };

        self.calls.write().await.entry(tenant.clone()).or_default().push(record.clone());
        Ok(record)
    }

    async fn end(&self, _scope: &Scope, tenant: &TenantId, id: i64, end: EndCall) -> Result<Call, ServiceError> {
        let mut calls = self.calls.write().await;
        let call = calls
            .get_mut(tenant)
            .and_then(|list| list.iter_mut().find(|c| c.id == id))
            .ok_or_else(|| ServiceError::NotFound("call not found".into()))?;

        if call.ended_at.is_some() {
            return Err(ServiceError::Conflict("call already ended".into()));
        }

        call.status = "completed".to_string();
        call.outcome = Some(end.outcome);
        call.duration_secs = Some(end.duration_secs);
        if end.notes.is_some() {
            call.notes = end.notes;
        }
        call.ended_at = Some(Utc::now());
        Ok(call.clone())
    }
}
