//! Tenant-scoped CRUD resources.
//!
//! A [`Resource`] describes its path, key, and record shapes once. The
//! generic HTTP handlers in `handlers::resources` and the
//! [`ResourceStore`](crate::services::ResourceStore) Service both work from
//! that description.

mod customization;
mod gl;
mod hr;
mod possession;
mod purchase;
mod roles;
mod sales;

pub use customization::TaskStatus;
pub use gl::{AccountType, GlAccount};
pub use hr::Employee;
pub use possession::Possession;
pub use purchase::Vendor;
pub use roles::RoleTemplate;
pub use sales::Customer;

use std::fmt::Display;
use std::hash::Hash;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};

use crate::dispatch::Endpoint;
use crate::error::ApiError;
use crate::services::{ResourceStore, Services};
use crate::types::{TenantId, UserId};

/// Key type of a resource's path variable.
pub trait ResourceKey: Clone + Eq + Hash + Display + Send + Sync + 'static {
    fn parse(raw: &str) -> Option<Self>;

    /// Store-assigned key for the `next` row, when the key is generated.
    fn from_sequence(_next: i64) -> Option<Self> {
        None
    }
}

impl ResourceKey for i64 {
    fn parse(raw: &str) -> Option<Self> {
        raw.trim().parse().ok().filter(|id| *id > 0)
    }

    fn from_sequence(next: i64) -> Option<Self> {
        Some(next)
    }
}

impl ResourceKey for String {
    fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        (!raw.is_empty()).then(|| raw.to_string())
    }
}

/// The five operations of one resource.
#[derive(Debug, Clone, Copy)]
pub struct Endpoints {
    pub list: Endpoint,
    pub get: Endpoint,
    pub create: Endpoint,
    pub update: Endpoint,
    pub delete: Endpoint,
}

pub trait Resource: Send + Sync + Sized + 'static {
    /// Collection path under `/api/v1`, without a leading slash.
    const PATH: &'static str;
    /// Name of the item path variable.
    const PARAM: &'static str;
    /// Singular noun used in messages, e.g. `vendor`.
    const NOUN: &'static str;
    /// Used in `Invalid <KEY_LABEL>` when the path variable does not parse.
    const KEY_LABEL: &'static str;
    const ENDPOINTS: Endpoints;
    /// Reject tenants whose identifier is not an integer.
    const NUMERIC_TENANT: bool = false;
    /// Accept `X-Tenant-ID` / `X-User-ID` on these routes.
    const HEADER_IDENTITY: bool = false;

    type Key: ResourceKey;
    type Record: Serialize + Clone + Send + Sync + 'static;
    type Create: DeserializeOwned + Send + 'static;
    type Update: DeserializeOwned + Send + 'static;

    fn validate(_input: &Self::Create) -> Result<(), ApiError> {
        Ok(())
    }

    fn validate_update(_input: &Self::Update) -> Result<(), ApiError> {
        Ok(())
    }

    /// Key carried in the create body, for resources not keyed by sequence.
    fn supplied_key(_input: &Self::Create) -> Option<Self::Key> {
        None
    }

    fn build(key: Self::Key, tenant: &TenantId, actor: Option<UserId>, input: Self::Create) -> Self::Record;

    fn apply(record: &mut Self::Record, input: Self::Update);

    fn store(services: &Services) -> Arc<dyn ResourceStore<Self>>;
}
