use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Endpoints, Resource};
use crate::dispatch::Endpoint;
use crate::error::ApiError;
use crate::extract::required_text;
use crate::services::{ResourceStore, Services};
use crate::types::{TenantId, UserId};

const MANAGE: &str = "roles.manage";

/// Reusable bundle of permissions a tenant admin can instantiate as a role.
pub struct RoleTemplate;

#[derive(Debug, Clone, Serialize)]
pub struct RoleTemplateRecord {
    pub id: i64,
    pub tenant_id: TenantId,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub is_system_template: bool,
    pub permission_ids: Vec<i64>,
    pub metadata: Map<String, Value>,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRoleTemplate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub is_system_template: bool,
    #[serde(default)]
    pub permission_ids: Vec<i64>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleTemplate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub permission_ids: Option<Vec<i64>>,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

impl Resource for RoleTemplate {
    const PATH: &'static str = "role-templates";
    const PARAM: &'static str = "id";
    const NOUN: &'static str = "role template";
    const KEY_LABEL: &'static str = "role template ID";
    // Reads stay open to every tenant member; changes need roles.manage.
    const ENDPOINTS: Endpoints = Endpoints {
        list: Endpoint::new("role_templates.list", "failed to get role templates"),
        get: Endpoint::new("role_templates.get", "failed to get role template"),
        create: Endpoint::new("role_templates.create", "failed to create role template").guarded(MANAGE),
        update: Endpoint::new("role_templates.update", "failed to update role template").guarded(MANAGE),
        delete: Endpoint::new("role_templates.delete", "failed to delete role template").guarded(MANAGE),
    };

    type Key = i64;
    type Record = RoleTemplateRecord;
    type Create = CreateRoleTemplate;
    type Update = UpdateRoleTemplate;

    fn validate(input: &CreateRoleTemplate) -> Result<(), ApiError> {
        required_text("name", input.name.as_deref())?;
        Ok(())
    }

    fn validate_update(input: &UpdateRoleTemplate) -> Result<(), ApiError> {
        if input.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            return Err(ApiError::bad_request("name must not be empty"));
        }
        Ok(())
    }

    fn build(id: i64, tenant: &TenantId, actor: Option<UserId>, input: CreateRoleTemplate) -> RoleTemplateRecord {
        let now = Utc::now();
        RoleTemplateRecord {
            id,
            tenant_id: tenant.clone(),
            name: input.name.unwrap_or_default().trim().to_string(),
            description: input.description,
            category: input.category,
            is_system_template: input.is_system_template,
            permission_ids: input.permission_ids,
            metadata: input.metadata,
            created_by: actor,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply(record: &mut RoleTemplateRecord, input: UpdateRoleTemplate) {
        if let Some(name) = input.name {
            record.name = name.trim().to_string();
        }
        if input.description.is_some() {
            record.description = input.description;
        }
        if input.category.is_some() {
            record.category = input.category;
        }
        if let Some(permission_ids) = input.permission_ids {
            record.permission_ids = permission_ids;
        }
        if let Some(metadata) = input.metadata {
            record.metadata = metadata;
        }
        record.updated_at = Utc::now();
    }

    fn store(services: &Services) -> Arc<dyn ResourceStore<Self>> {
        services.role_templates.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Scope;
    use crate::extract::PageRequest;
    use crate::services::MemoryStore;
    use serde_json::json;

    fn create(body: Value) -> CreateRoleTemplate {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn name_is_required() {
        let err = RoleTemplate::validate(&create(json!({"description": "x"}))).unwrap_err();
        assert_eq!(err.message(), "name is required");
        assert!(RoleTemplate::validate(&create(json!({"name": "Site Engineer"}))).is_ok());
    }

    #[test]
    fn writes_are_guarded_and_reads_are_not() {
        assert_eq!(RoleTemplate::ENDPOINTS.list.permission, None);
        assert_eq!(RoleTemplate::ENDPOINTS.create.permission, Some(MANAGE));
        assert_eq!(RoleTemplate::ENDPOINTS.delete.permission, Some(MANAGE));
    }

    #[tokio::test]
    async fn store_assigns_sequence_ids_per_create() {
        let store = MemoryStore::<RoleTemplate>::new();
        let scope = Scope::detached();
        let tenant = TenantId::new("t1").unwrap();

        let first = store
            .create(&scope, &tenant, Some(UserId(5)), create(json!({"name": "A", "permission_ids": [1, 2]})))
            .await
            .unwrap();
        let second = store.create(&scope, &tenant, None, create(json!({"name": "B"}))).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.created_by, Some(UserId(5)));
        assert_eq!(first.permission_ids, vec![1, 2]);

        let (rows, total) = store.list(&scope, &tenant, PageRequest::default()).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(rows[0].name, "A");
    }

    #[tokio::test]
    async fn update_touches_only_supplied_fields() {
        let store = MemoryStore::<RoleTemplate>::new();
        let scope = Scope::detached();
        let tenant = TenantId::new("t1").unwrap();
        store
            .create(&scope, &tenant, None, create(json!({"name": "A", "category": "site"})))
            .await
            .unwrap();

        let update: UpdateRoleTemplate = serde_json::from_value(json!({"name": "Renamed"})).unwrap();
        let updated = store.update(&scope, &tenant, &1, update).await.unwrap().unwrap();
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.category.as_deref(), Some("site"));

        let missing: UpdateRoleTemplate = serde_json::from_value(json!({})).unwrap();
        assert!(store.update(&scope, &tenant, &99, missing).await.unwrap().is_none());
    }
}
