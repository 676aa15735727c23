use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Endpoints, Resource};
use crate::dispatch::Endpoint;
use crate::error::ApiError;
use crate::extract::required_text;
use crate::services::{ResourceStore, Services};
use crate::types::{TenantId, UserId};

pub struct Customer;

#[derive(Debug, Clone, Serialize)]
pub struct CustomerRecord {
    pub id: i64,
    pub tenant_id: TenantId,
    pub customer_code: Option<String>,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub billing_address: Option<String>,
    pub credit_limit: Decimal,
    pub status: String,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCustomer {
    #[serde(default)]
    pub customer_code: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub billing_address: Option<String>,
    #[serde(default)]
    pub credit_limit: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCustomer {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub billing_address: Option<String>,
    #[serde(default)]
    pub credit_limit: Option<Decimal>,
    #[serde(default)]
    pub status: Option<String>,
}

impl Resource for Customer {
    const PATH: &'static str = "sales/customers";
    const PARAM: &'static str = "id";
    const NOUN: &'static str = "customer";
    const KEY_LABEL: &'static str = "customer ID";
    const ENDPOINTS: Endpoints = Endpoints {
        list: Endpoint::new("sales.customers.list", "failed to get customers"),
        get: Endpoint::new("sales.customers.get", "failed to get customer"),
        create: Endpoint::new("sales.customers.create", "failed to create customer"),
        update: Endpoint::new("sales.customers.update", "failed to update customer"),
        delete: Endpoint::new("sales.customers.delete", "failed to delete customer"),
    };

    type Key = i64;
    type Record = CustomerRecord;
    type Create = CreateCustomer;
    type Update = UpdateCustomer;

    fn validate(input: &CreateCustomer) -> Result<(), ApiError> {
        required_text("name", input.name.as_deref())?;
        if input.credit_limit.is_sign_negative() {
            return Err(ApiError::bad_request("credit_limit must not be negative"));
        }
        Ok(())
    }

    fn validate_update(input: &UpdateCustomer) -> Result<(), ApiError> {
        if input.credit_limit.is_some_and(|limit| limit.is_sign_negative()) {
            return Err(ApiError::bad_request("credit_limit must not be negative"));
        }
        Ok(())
    }

    fn build(id: i64, tenant: &TenantId, actor: Option<UserId>, input: CreateCustomer) -> CustomerRecord {
        let now = Utc::now();
        CustomerRecord {
            id,
            tenant_id: tenant.clone(),
            customer_code: input.customer_code,
            name: input.name.unwrap_or_default().trim().to_string(),
            email: input.email,
            phone: input.phone,
            company: input.company,
            billing_address: input.billing_address,
            credit_limit: input.credit_limit,
            status: "active".to_string(),
            created_by: actor,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply(record: &mut CustomerRecord, input: UpdateCustomer) {
        if let Some(name) = input.name.filter(|n| !n.trim().is_empty()) {
            record.name = name.trim().to_string();
        }
        if input.email.is_some() {
            record.email = input.email;
        }
        if input.phone.is_some() {
            record.phone = input.phone;
        }
        if input.billing_address.is_some() {
            record.billing_address = input.billing_address;
        }
        if let Some(limit) = input.credit_limit {
            record.credit_limit = limit;
        }
        if let Some(status) = input.status.filter(|s| !s.trim().is_empty()) {
            record.status = status;
        }
        record.updated_at = Utc::now();
    }

    fn store(services: &Services) -> Arc<dyn ResourceStore<Self>> {
        services.customers.clone()
    }
}
