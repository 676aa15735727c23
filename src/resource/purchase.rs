use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Endpoints, Resource};
use crate::dispatch::Endpoint;
use crate::error::ApiError;
use crate::extract::required_text;
use crate::services::{ResourceStore, Services};
use crate::types::{TenantId, UserId};

pub struct Vendor;

#[derive(Debug, Clone, Serialize)]
pub struct VendorRecord {
    pub id: i64,
    pub tenant_id: TenantId,
    pub vendor_code: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub tax_id: Option<String>,
    pub payment_terms: Option<String>,
    pub vendor_type: Option<String>,
    pub is_active: bool,
    pub is_blocked: bool,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateVendor {
    #[serde(default)]
    pub vendor_code: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub tax_id: Option<String>,
    #[serde(default)]
    pub payment_terms: Option<String>,
    #[serde(default)]
    pub vendor_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateVendor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub payment_terms: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub is_blocked: Option<bool>,
}

impl Resource for Vendor {
    const PATH: &'static str = "purchase/vendors";
    const PARAM: &'static str = "id";
    const NOUN: &'static str = "vendor";
    const KEY_LABEL: &'static str = "vendor ID";
    const ENDPOINTS: Endpoints = Endpoints {
        list: Endpoint::new("purchase.vendors.list", "failed to get vendors"),
        get: Endpoint::new("purchase.vendors.get", "failed to get vendor"),
        create: Endpoint::new("purchase.vendors.create", "failed to create vendor"),
        update: Endpoint::new("purchase.vendors.update", "failed to update vendor"),
        delete: Endpoint::new("purchase.vendors.delete", "failed to delete vendor"),
    };

    type Key = i64;
    type Record = VendorRecord;
    type Create = CreateVendor;
    type Update = UpdateVendor;

    fn validate(input: &CreateVendor) -> Result<(), ApiError> {
        required_text("vendor_code", input.vendor_code.as_deref())?;
        required_text("name", input.name.as_deref())?;
        Ok(())
    }

    fn build(id: i64, tenant: &TenantId, actor: Option<UserId>, input: CreateVendor) -> VendorRecord {
        let now = Utc::now();
        VendorRecord {
            id,
            tenant_id: tenant.clone(),
            vendor_code: input.vendor_code.unwrap_or_default().trim().to_string(),
            name: input.name.unwrap_or_default().trim().to_string(),
            email: input.email,
            phone: input.phone,
            address: input.address,
            tax_id: input.tax_id,
            payment_terms: input.payment_terms,
            vendor_type: input.vendor_type,
            is_active: true,
            is_blocked: false,
            created_by: actor,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply(record: &mut VendorRecord, input: UpdateVendor) {
        if let Some(name) = input.name.filter(|n| !n.trim().is_empty()) {
            record.name = name.trim().to_string();
        }
        if input.email.is_some() {
            record.email = input.email;
        }
        if input.phone.is_some() {
            record.phone = input.phone;
        }
        if input.address.is_some() {
            record.address = input.address;
        }
        if input.payment_terms.is_some() {
            record.payment_terms = input.payment_terms;
        }
        if let Some(is_active) = input.is_active {
            record.is_active = is_active;
        }
        if let Some(is_blocked) = input.is_blocked {
            record.is_blocked = is_blocked;
        }
        record.updated_at = Utc::now();
    }

    fn store(services: &Services) -> Arc<dyn ResourceStore<Self>> {
        services.vendors.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Scope;
    use crate::extract::PageRequest;
    use crate::services::MemoryStore;
    use serde_json::json;

    fn create(name: &str) -> CreateVendor {
        serde_json::from_value(json!({"vendor_code": format!("V-{name}"), "name": name})).unwrap()
    }

    #[test]
    fn code_is_required() {
        let input: CreateVendor = serde_json::from_value(json!({"name": "Acme"})).unwrap();
        assert_eq!(Vendor::validate(&input).unwrap_err().message(), "vendor_code is required");
    }

    #[tokio::test]
    async fn listing_is_paged_and_tenant_scoped() {
        let store = MemoryStore::<Vendor>::new();
        let scope = Scope::detached();
        let t1 = TenantId::new("t1").unwrap();
        let t2 = TenantId::new("t2").unwrap();

        for name in ["a", "b", "c"] {
            store.create(&scope, &t1, None, create(name)).await.unwrap();
        }
        store.create(&scope, &t2, None, create("z")).await.unwrap();

        let page = PageRequest::from_query(Some("1"), Some("1")).unwrap();
        let (rows, total) = store.list(&scope, &t1, page).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "b");

        let (rows, total) = store.list(&scope, &t2, PageRequest::default()).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0].name, "z");
    }

    #[tokio::test]
    async fn other_tenants_cannot_see_a_record() {
        let store = MemoryStore::<Vendor>::new();
        let scope = Scope::detached();
        let t1 = TenantId::new("t1").unwrap();
        let t2 = TenantId::new("t2").unwrap();

        let created = store.create(&scope, &t1, None, create("a")).await.unwrap();
        assert!(store.get(&scope, &t2, &created.id).await.unwrap().is_none());
        assert!(!store.delete(&scope, &t2, &created.id).await.unwrap());
        assert!(store.get(&scope, &t1, &created.id).await.unwrap().is_some());
    }
}
