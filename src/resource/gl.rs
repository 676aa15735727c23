//! Chart of accounts. Balances are exact decimals.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Endpoints, Resource};
use crate::dispatch::Endpoint;
use crate::error::ApiError;
use crate::extract::{parse_tag, required_text, Tag};
use crate::services::{ResourceStore, Services};
use crate::types::{TenantId, UserId};

const MANAGE: &str = "gl.manage";
const DEFAULT_CURRENCY: &str = "INR";

pub struct GlAccount;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
}

impl Tag for AccountType {
    const FIELD: &'static str = "account_type";
    const ALLOWED: &'static [Self] = &[
        AccountType::Asset,
        AccountType::Liability,
        AccountType::Equity,
        AccountType::Revenue,
        AccountType::Expense,
    ];

    fn as_tag(&self) -> &'static str {
        match self {
            AccountType::Asset => "asset",
            AccountType::Liability => "liability",
            AccountType::Equity => "equity",
            AccountType::Revenue => "revenue",
            AccountType::Expense => "expense",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GlAccountRecord {
    pub id: i64,
    pub tenant_id: TenantId,
    pub account_code: String,
    pub account_name: String,
    pub account_type: AccountType,
    pub parent_account_id: Option<i64>,
    pub description: Option<String>,
    pub opening_balance: Decimal,
    pub current_balance: Decimal,
    pub currency: String,
    pub is_active: bool,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateGlAccount {
    #[serde(default)]
    pub account_code: Option<String>,
    #[serde(default)]
    pub account_name: Option<String>,
    #[serde(default)]
    pub account_type: Option<String>,
    #[serde(default)]
    pub parent_account_id: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub opening_balance: Decimal,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateGlAccount {
    #[serde(default)]
    pub account_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub current_balance: Option<Decimal>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl Resource for GlAccount {
    const PATH: &'static str = "gl/accounts";
    const PARAM: &'static str = "id";
    const NOUN: &'static str = "account";
    const KEY_LABEL: &'static str = "account ID";
    const ENDPOINTS: Endpoints = Endpoints {
        list: Endpoint::new("gl.accounts.list", "failed to get accounts").guarded(MANAGE),
        get: Endpoint::new("gl.accounts.get", "failed to get account").guarded(MANAGE),
        create: Endpoint::new("gl.accounts.create", "failed to create account").guarded(MANAGE),
        update: Endpoint::new("gl.accounts.update", "failed to update account").guarded(MANAGE),
        delete: Endpoint::new("gl.accounts.delete", "failed to delete account").guarded(MANAGE),
    };

    type Key = i64;
    type Record = GlAccountRecord;
    type Create = CreateGlAccount;
    type Update = UpdateGlAccount;

    fn validate(input: &CreateGlAccount) -> Result<(), ApiError> {
        required_text("account_code", input.account_code.as_deref())?;
        required_text("account_name", input.account_name.as_deref())?;
        parse_tag::<AccountType>(required_text("account_type", input.account_type.as_deref())?)?;
        Ok(())
    }

    fn build(id: i64, tenant: &TenantId, actor: Option<UserId>, input: CreateGlAccount) -> GlAccountRecord {
        let now = Utc::now();
        let account_type = input
            .account_type
            .as_deref()
            .and_then(|raw| AccountType::from_tag(raw.trim()))
            .unwrap_or(AccountType::Asset);

        GlAccountRecord {
            id,
            tenant_id: tenant.clone(),
            account_code: input.account_code.unwrap_or_default().trim().to_string(),
            account_name: input.account_name.unwrap_or_default().trim().to_string(),
            account_type,
            parent_account_id: input.parent_account_id,
            description: input.description,
            opening_balance: input.opening_balance,
            current_balance: input.opening_balance,
            currency: input.currency.unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            is_active: true,
            created_by: actor,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply(record: &mut GlAccountRecord, input: UpdateGlAccount) {
        if let Some(name) = input.account_name.filter(|n| !n.trim().is_empty()) {
            record.account_name = name.trim().to_string();
        }
        if input.description.is_some() {
            record.description = input.description;
        }
        if let Some(balance) = input.current_balance {
            record.current_balance = balance;
        }
        if let Some(is_active) = input.is_active {
            record.is_active = is_active;
        }
        record.updated_at = Utc::now();
    }

    fn store(services: &Services) -> Arc<dyn ResourceStore<Self>> {
        services.gl_accounts.clone()
    }
}
