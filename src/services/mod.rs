//! Interfaces of the domain Services consumed by the handler layer.
//!
//! The Services own their concurrency, persistence and retries. Every call
//! receives the request [`Scope`](crate::dispatch::Scope) and the resolved
//! tenant; none of them ever sees a response handle.

pub mod ai;
pub mod analytics;
pub mod calls;
pub mod civil;
pub mod hub;
pub mod lead_scoring;
pub mod rbac;
pub mod resources;
pub mod tenant_directory;
pub mod unconfigured;

use std::sync::Arc;

use thiserror::Error;

pub use ai::{AiAnswer, AiOrchestrator, AiRequest, ProviderInfo};
pub use analytics::{AnalyticsService, ReportFormat, ReportRequest, TrendPoint};
pub use calls::{Call, CallFilter, CallService, CallType, EndCall, MemoryCalls, NewCall};
pub use civil::CivilService;
pub use hub::{ClientInfo, HubMessage, HubStats, MemoryHub, PushHub};
pub use lead_scoring::{BatchJob, BatchQueue, LeadScore, LeadScoringService, LeadSignals, ScoreBook, ScoreCategory};
pub use rbac::{MemoryRbac, RbacService};
pub use resources::{MemoryStore, ResourceStore};
pub use tenant_directory::{StaticTenantDirectory, TenantDirectory};
pub use unconfigured::Unconfigured;

use crate::config::{AppConfig, Environment};
use crate::resource::{Customer, Employee, GlAccount, Possession, RoleTemplate, TaskStatus, Vendor};

/// Failure reported by a Service. The handler layer classifies it into an
/// HTTP status; see [`ApiError::from_service`](crate::error::ApiError::from_service).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid input: {0}")]
    Invalid(String),

    #[error("downstream unavailable: {0}")]
    Unavailable(String),

    #[error("request scope cancelled")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn internal(err: impl std::fmt::Display) -> Self {
        ServiceError::Internal(err.to_string())
    }
}

/// Every Service the routers can reach, shared across requests.
#[derive(Clone)]
pub struct Services {
    pub ai: Arc<dyn AiOrchestrator>,
    pub analytics: Arc<dyn AnalyticsService>,
    pub civil: Arc<dyn CivilService>,
    pub leads: Arc<dyn LeadScoringService>,
    pub calls: Arc<dyn CallService>,
    pub rbac: Arc<dyn RbacService>,
    pub tenants: Arc<dyn TenantDirectory>,
    pub hub: Arc<dyn PushHub>,
    pub role_templates: Arc<dyn ResourceStore<RoleTemplate>>,
    pub task_statuses: Arc<dyn ResourceStore<TaskStatus>>,
    pub possessions: Arc<dyn ResourceStore<Possession>>,
    pub employees: Arc<dyn ResourceStore<Employee>>,
    pub gl_accounts: Arc<dyn ResourceStore<GlAccount>>,
    pub vendors: Arc<dyn ResourceStore<Vendor>>,
    pub customers: Arc<dyn ResourceStore<Customer>>,
}

impl Services {
    /// Process-local wiring: in-memory stores, the memory hub and score
    /// book, and `Unconfigured` stand-ins for the externally deployed
    /// AI, analytics and civil backends. Spawns the scoring workers.
    pub fn in_memory(config: &AppConfig) -> Self {
        let rbac = if config.environment == Environment::Development {
            MemoryRbac::permissive()
        } else {
            MemoryRbac::strict()
        };

        Self {
            ai: Arc::new(Unconfigured::new("ai")),
            analytics: Arc::new(Unconfigured::new("analytics")),
            civil: Arc::new(Unconfigured::new("civil")),
            leads: Arc::new(ScoreBook::start(&config.scoring)),
            calls: Arc::new(MemoryCalls::new()),
            rbac: Arc::new(rbac),
            tenants: Arc::new(StaticTenantDirectory::new()),
            hub: Arc::new(MemoryHub::new()),
            role_templates: MemoryStore::shared(),
            task_statuses: MemoryStore::shared(),
            possessions: MemoryStore::shared(),
            employees: MemoryStore::shared(),
            gl_accounts: MemoryStore::shared(),
            vendors: MemoryStore::shared(),
            customers: MemoryStore::shared(),
        }
    }
}
