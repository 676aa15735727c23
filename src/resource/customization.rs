use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Endpoints, Resource};
use crate::dispatch::Endpoint;
use crate::error::ApiError;
use crate::extract::required_text;
use crate::services::{ResourceStore, Services};
use crate::types::{TenantId, UserId};

/// Tenant-defined task status, addressed by its own code.
pub struct TaskStatus;

#[derive(Debug, Clone, Serialize)]
pub struct TaskStatusRecord {
    pub status_code: String,
    pub tenant_id: TenantId,
    pub status_name: String,
    pub description: Option<String>,
    pub color_code: Option<String>,
    pub display_order: i32,
    pub is_final: bool,
    pub is_active: bool,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskStatus {
    #[serde(default)]
    pub status_code: Option<String>,
    #[serde(default)]
    pub status_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color_code: Option<String>,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default)]
    pub is_final: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskStatus {
    #[serde(default)]
    pub status_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color_code: Option<String>,
    #[serde(default)]
    pub display_order: Option<i32>,
    #[serde(default)]
    pub is_final: Option<bool>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl Resource for TaskStatus {
    const PATH: &'static str = "config/task-statuses";
    const PARAM: &'static str = "statusCode";
    const NOUN: &'static str = "task status";
    const KEY_LABEL: &'static str = "status code";
    const ENDPOINTS: Endpoints = Endpoints {
        list: Endpoint::new("customization.task_statuses.list", "failed to get task statuses"),
        get: Endpoint::new("customization.task_statuses.get", "failed to get task status"),
        create: Endpoint::new("customization.task_statuses.create", "failed to create task status"),
        update: Endpoint::new("customization.task_statuses.update", "failed to update task status"),
        delete: Endpoint::new("customization.task_statuses.delete", "failed to delete task status"),
    };

    type Key = String;
    type Record = TaskStatusRecord;
    type Create = CreateTaskStatus;
    type Update = UpdateTaskStatus;

    fn validate(input: &CreateTaskStatus) -> Result<(), ApiError> {
        required_text("status_code", input.status_code.as_deref())?;
        required_text("status_name", input.status_name.as_deref())?;
        Ok(())
    }

    fn supplied_key(input: &CreateTaskStatus) -> Option<String> {
        input
            .status_code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(str::to_string)
    }

    fn build(status_code: String, tenant: &TenantId, actor: Option<UserId>, input: CreateTaskStatus) -> TaskStatusRecord {
        let now = Utc::now();
        TaskStatusRecord {
            status_code,
            tenant_id: tenant.clone(),
            status_name: input.status_name.unwrap_or_default().trim().to_string(),
            description: input.description,
            color_code: input.color_code,
            display_order: input.display_order,
            is_final: input.is_final,
            is_active: true,
            created_by: actor,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply(record: &mut TaskStatusRecord, input: UpdateTaskStatus) {
        if let Some(name) = input.status_name.filter(|n| !n.trim().is_empty()) {
            record.status_name = name.trim().to_string();
        }
        if input.description.is_some() {
            record.description = input.description;
        }
        if input.color_code.is_some() {
            record.color_code = input.color_code;
        }
        if let Some(order) = input.display_order {
            record.display_order = order;
        }
        if let Some(is_final) = input.is_final {
            record.is_final = is_final;
        }
        if let Some(is_active) = input.is_active {
            record.is_active = is_active;
        }
        record.updated_at = Utc::now();
    }

    fn store(services: &Services) -> Arc<dyn ResourceStore<Self>> {
        services.task_statuses.clone()
    }
}
