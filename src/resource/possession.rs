//! Unit possession tracking. Served on the internal API, and persisted
//! against the numeric tenant key.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{Endpoints, Resource};
use crate::dispatch::Endpoint;
use crate::error::ApiError;
use crate::extract::{parse_date, parse_tag, Tag};
use crate::services::{ResourceStore, Services};
use crate::types::{TenantId, UserId};

pub struct Possession;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PossessionStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl Tag for PossessionStatus {
    const FIELD: &'static str = "status";
    const ALLOWED: &'static [Self] = &[
        PossessionStatus::Pending,
        PossessionStatus::InProgress,
        PossessionStatus::Completed,
        PossessionStatus::Cancelled,
    ];

    fn as_tag(&self) -> &'static str {
        match self {
            PossessionStatus::Pending => "pending",
            PossessionStatus::InProgress => "in_progress",
            PossessionStatus::Completed => "completed",
            PossessionStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PossessionRecord {
    pub id: i64,
    pub tenant_id: i64,
    pub booking_id: i64,
    pub status: PossessionStatus,
    pub possession_date: Option<NaiveDate>,
    pub estimated_possession_date: Option<NaiveDate>,
    pub possession_type: String,
    pub is_complete: bool,
    pub notes: Option<String>,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePossession {
    #[serde(default)]
    pub booking_id: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub possession_date: Option<String>,
    #[serde(default)]
    pub estimated_possession_date: Option<String>,
    #[serde(default)]
    pub possession_type: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePossession {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub possession_date: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

fn date(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>, ApiError> {
    value.map(|raw| parse_date(field, raw)).transpose()
}

fn status(value: Option<&str>) -> Result<Option<PossessionStatus>, ApiError> {
    value.map(parse_tag::<PossessionStatus>).transpose()
}

impl Resource for Possession {
    const PATH: &'static str = "possessions";
    const PARAM: &'static str = "id";
    const NOUN: &'static str = "possession";
    const KEY_LABEL: &'static str = "possession ID";
    const ENDPOINTS: Endpoints = Endpoints {
        list: Endpoint::new("possessions.list", "failed to get possessions"),
        get: Endpoint::new("possessions.get", "failed to get possession"),
        create: Endpoint::new("possessions.create", "failed to create possession"),
        update: Endpoint::new("possessions.update", "failed to update possession"),
        delete: Endpoint::new("possessions.delete", "failed to delete possession"),
    };
    const NUMERIC_TENANT: bool = true;
    const HEADER_IDENTITY: bool = true;

    type Key = i64;
    type Record = PossessionRecord;
    type Create = CreatePossession;
    type Update = UpdatePossession;

    fn validate(input: &CreatePossession) -> Result<(), ApiError> {
        if !input.booking_id.is_some_and(|id| id > 0) {
            return Err(ApiError::bad_request("booking_id is required"));
        }
        status(input.status.as_deref())?;
        date("possession_date", input.possession_date.as_deref())?;
        date("estimated_possession_date", input.estimated_possession_date.as_deref())?;
        Ok(())
    }

    fn validate_update(input: &UpdatePossession) -> Result<(), ApiError> {
        status(input.status.as_deref())?;
        date("possession_date", input.possession_date.as_deref())?;
        Ok(())
    }

    fn build(id: i64, tenant: &TenantId, actor: Option<UserId>, input: CreatePossession) -> PossessionRecord {
        let now = Utc::now();
        let initial = status(input.status.as_deref()).ok().flatten().unwrap_or_default();
        PossessionRecord {
            id,
            tenant_id: tenant.numeric().unwrap_or_default(),
            booking_id: input.booking_id.unwrap_or_default(),
            status: initial,
            possession_date: date("possession_date", input.possession_date.as_deref()).ok().flatten(),
            estimated_possession_date: date("estimated_possession_date", input.estimated_possession_date.as_deref())
                .ok()
                .flatten(),
            possession_type: input.possession_type.unwrap_or_else(|| "normal".to_string()),
            is_complete: initial == PossessionStatus::Completed,
            notes: input.notes,
            created_by: actor,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply(record: &mut PossessionRecord, input: UpdatePossession) {
        if let Ok(Some(next)) = status(input.status.as_deref()) {
            record.status = next;
            record.is_complete = next == PossessionStatus::Completed;
        }
        if let Ok(Some(day)) = date("possession_date", input.possession_date.as_deref()) {
            record.possession_date = Some(day);
        }
        if input.notes.is_some() {
            record.notes = input.notes;
        }
        record.updated_at = Utc::now();
    }

    fn store(services: &Services) -> Arc<dyn ResourceStore<Self>> {
        services.possessions.clone()
    }
}
