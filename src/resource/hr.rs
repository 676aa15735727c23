use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{Endpoints, Resource};
use crate::dispatch::Endpoint;
use crate::error::ApiError;
use crate::extract::{parse_date, required_text};
use crate::services::{ResourceStore, Services};
use crate::types::{TenantId, UserId};

pub struct Employee;

#[derive(Debug, Clone, Serialize)]
pub struct EmployeeRecord {
    pub id: i64,
    pub tenant_id: TenantId,
    pub employee_code: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub designation: Option<String>,
    pub department: Option<String>,
    pub employment_type: String,
    pub joining_date: Option<NaiveDate>,
    pub status: String,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateEmployee {
    #[serde(default)]
    pub employee_code: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub designation: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub employment_type: Option<String>,
    #[serde(default)]
    pub joining_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateEmployee {
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub designation: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl Resource for Employee {
    const PATH: &'static str = "hr/employees";
    const PARAM: &'static str = "id";
    const NOUN: &'static str = "employee";
    const KEY_LABEL: &'static str = "employee ID";
    const ENDPOINTS: Endpoints = Endpoints {
        list: Endpoint::new("hr.employees.list", "failed to get employees"),
        get: Endpoint::new("hr.employees.get", "failed to get employee"),
        create: Endpoint::new("hr.employees.create", "failed to create employee"),
        update: Endpoint::new("hr.employees.update", "failed to update employee"),
        delete: Endpoint::new("hr.employees.delete", "failed to delete employee"),
    };

    type Key = i64;
    type Record = EmployeeRecord;
    type Create = CreateEmployee;
    type Update = UpdateEmployee;

    fn validate(input: &CreateEmployee) -> Result<(), ApiError> {
        required_text("first_name", input.first_name.as_deref())?;
        required_text("last_name", input.last_name.as_deref())?;
        let email = required_text("email", input.email.as_deref())?;
        if !email.contains('@') {
            return Err(ApiError::bad_request("invalid email"));
        }
        if let Some(raw) = input.joining_date.as_deref() {
            parse_date("joining_date", raw)?;
        }
        Ok(())
    }

    fn build(id: i64, tenant: &TenantId, actor: Option<UserId>, input: CreateEmployee) -> EmployeeRecord {
        let now = Utc::now();
        EmployeeRecord {
            id,
            tenant_id: tenant.clone(),
            employee_code: input.employee_code,
            first_name: input.first_name.unwrap_or_default().trim().to_string(),
            last_name: input.last_name.unwrap_or_default().trim().to_string(),
            email: input.email.unwrap_or_default().trim().to_string(),
            phone: input.phone,
            designation: input.designation,
            department: input.department,
            employment_type: input.employment_type.unwrap_or_else(|| "full_time".to_string()),
            joining_date: input.joining_date.as_deref().and_then(|raw| parse_date("joining_date", raw).ok()),
            status: "active".to_string(),
            created_by: actor,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply(record: &mut EmployeeRecord, input: UpdateEmployee) {
        if input.phone.is_some() {
            record.phone = input.phone;
        }
        if input.designation.is_some() {
            record.designation = input.designation;
        }
        if input.department.is_some() {
            record.department = input.department;
        }
        if let Some(status) = input.status.filter(|s| !s.trim().is_empty()) {
            record.status = status;
        }
        record.updated_at = Utc::now();
    }

    fn store(services: &Services) -> Arc<dyn ResourceStore<Self>> {
        services.employees.clone()
    }
}
