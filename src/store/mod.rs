//! Repository interfaces for devices, punch events and the employee directory.

pub mod memory;
pub mod mysql;

use crate::model::device::{Device, DevicePatch, NewDevice};
use crate::model::employee::{EmployeeIdentity, EmployeeUpdate};
use crate::model::punch::RawPunchEvent;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("{0} not found")]
    NotFound(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait DeviceRegistry: Send + Sync {
    async fn list(&self) -> StoreResult<Vec<Device>>;

    async fn get(&self, id: &str) -> StoreResult<Option<Device>>;

    /// Inserts or replaces name/address/key of a device. The cursor of an existing device is kept.
    async fn register(&self, device: NewDevice) -> StoreResult<Device>;

    /// Field-wise update; the cursor can only move forward.
    async fn update(&self, id: &str, patch: DevicePatch) -> StoreResult<Device>;

    /// Returns `false` when nothing was deleted.
    async fn delete(&self, id: &str) -> StoreResult<bool>;
}

#[async_trait]
pub trait PunchStore: Send + Sync {
    /// Persists the whole batch or nothing. Events whose
    /// `(device_id, device_user_id, timestamp)` is already stored are skipped.
    /// Returns the number of events actually inserted.
    async fn append(&self, events: Vec<RawPunchEvent>) -> StoreResult<usize>;

    /// Events with `from <= timestamp < to`, oldest first.
    async fn list_between(&self, from: NaiveDateTime, to: NaiveDateTime) -> StoreResult<Vec<RawPunchEvent>>;

    /// Most recently received events first.
    async fn list_recent(&self, limit: u32) -> StoreResult<Vec<RawPunchEvent>>;
}

#[async_trait]
pub trait DirectoryStore: Send + Sync {
    /// Merges each update into the directory (see [`EmployeeIdentity::merge`]).
    /// Returns the number of identities written.
    async fn upsert(&self, updates: Vec<EmployeeUpdate>) -> StoreResult<usize>;

    async fn list(&self) -> StoreResult<Vec<EmployeeIdentity>>;

    async fn get(&self, id: &str) -> StoreResult<Option<EmployeeIdentity>>;
}

/// Resolves the id and access key of a registration request.
pub(crate) fn resolve_new_device(device: &NewDevice) -> (String, String) {
    let id = device
        .id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .unwrap_or_else(crate::model::device::generate_device_id);
    let key = device
        .access_key
        .clone()
        .unwrap_or_else(crate::model::device::generate_access_key);
    (id, key)
}
