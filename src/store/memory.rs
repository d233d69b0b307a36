//! In-memory repositories. Used when no `DATABASE_URL` is configured and by tests.

use super::{DeviceRegistry, DirectoryStore, PunchStore, StoreError, StoreResult, resolve_new_device};
use crate::model::device::{Device, DevicePatch, NewDevice};
use crate::model::employee::{EmployeeIdentity, EmployeeUpdate};
use crate::model::punch::{PunchKey, RawPunchEvent};
use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use futures::lock::Mutex;
use std::collections::{BTreeMap, HashSet};

#[derive(Default)]
pub struct MemoryDeviceRegistry {
    devices: Mutex<BTreeMap<String, Device>>,
}

impl MemoryDeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_devices(devices: impl IntoIterator<Item = Device>) -> Self {
        Self {
            devices: Mutex::new(devices.into_iter().map(|d| (d.id.clone(), d)).collect()),
        }
    }
}

#[async_trait]
impl DeviceRegistry for MemoryDeviceRegistry {
    async fn list(&self) -> StoreResult<Vec<Device>> {
        Ok(self.devices.lock().await.values().cloned().collect())
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Device>> {
        Ok(self.devices.lock().await.get(id).cloned())
    }

    async fn register(&self, device: NewDevice) -> StoreResult<Device> {
        let (id, access_key) = resolve_new_device(&device);
        let mut devices = self.devices.lock().await;
        let entry = devices.entry(id.clone()).or_insert_with(|| Device {
            id: id.clone(),
            name: String::new(),
            network_address: None,
            access_key: String::new(),
            cursor: 0,
            last_synced_at: None,
        });
        entry.name = device.name;
        entry.network_address = device.network_address;
        entry.access_key = access_key;
        Ok(entry.clone())
    }

    async fn update(&self, id: &str, patch: DevicePatch) -> StoreResult<Device> {
        let mut devices = self.devices.lock().await;
        let device = devices
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("device {id}")))?;
        patch.apply(device);
        Ok(device.clone())
    }

    async fn delete(&self, id: &str) -> StoreResult<bool> {
        Ok(self.devices.lock().await.remove(id).is_some())
    }
}

#[derive(Default)]
pub struct MemoryPunchStore {
    inner: Mutex<PunchLog>,
}

#[derive(Default)]
struct PunchLog {
    events: Vec<RawPunchEvent>,
    keys: HashSet<PunchKey>,
}

impl MemoryPunchStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.events.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl PunchStore for MemoryPunchStore {
    async fn append(&self, events: Vec<RawPunchEvent>) -> StoreResult<usize> {
        // holding the lock for the whole batch makes it all-or-nothing for readers
        let mut log = self.inner.lock().await;
        let mut inserted = 0;
        for event in events {
            if log.keys.insert(event.key()) {
                log.events.push(event);
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    async fn list_between(&self, from: NaiveDateTime, to: NaiveDateTime) -> StoreResult<Vec<RawPunchEvent>> {
        let log = self.inner.lock().await;
        let mut events: Vec<_> = log
            .events
            .iter()
            .filter(|e| e.timestamp >= from && e.timestamp < to)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.timestamp);
        Ok(events)
    }

    async fn list_recent(&self, limit: u32) -> StoreResult<Vec<RawPunchEvent>> {
        let log = self.inner.lock().await;
        let mut events = log.events.clone();
        events.sort_by(|a, b| b.received_at.cmp(&a.received_at));
        events.truncate(limit as usize);
        Ok(events)
    }
}

#[derive(Default)]
pub struct MemoryDirectoryStore {
    employees: Mutex<BTreeMap<String, EmployeeIdentity>>,
}

impl MemoryDirectoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DirectoryStore for MemoryDirectoryStore {
    async fn upsert(&self, updates: Vec<EmployeeUpdate>) -> StoreResult<usize> {
        let now = Utc::now();
        let mut employees = self.employees.lock().await;
        let mut written = 0;
        for update in updates.iter().filter(|u| !u.id.trim().is_empty()) {
            let existing = employees.remove(update.id.trim());
            let merged = EmployeeIdentity::merge(existing, update, now);
            employees.insert(merged.id.clone(), merged);
            written += 1;
        }
        Ok(written)
    }

    async fn list(&self) -> StoreResult<Vec<EmployeeIdentity>> {
        Ok(self.employees.lock().await.values().cloned().collect())
    }

    async fn get(&self, id: &str) -> StoreResult<Option<EmployeeIdentity>> {
        Ok(self.employees.lock().await.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn punch(device: &str, user: &str, h: u32, m: u32) -> RawPunchEvent {
        RawPunchEvent {
            id: uuid::Uuid::new_v4().to_string(),
            device_id: device.into(),
            device_user_id: user.into(),
            timestamp: NaiveDate::from_ymd_opt(2026, 1, 5)
                .unwrap()
                .and_hms_opt(h, m, 0)
                .unwrap(),
            received_at: Utc::now(),
            source_payload: json!({}),
        }
    }

    #[actix_web::test]
    async fn append_skips_known_identities() {
        let store = MemoryPunchStore::new();
        assert_eq!(
            store
                .append(vec![punch("d1", "1", 8, 0), punch("d1", "2", 8, 5)])
                .await
                .unwrap(),
            2
        );
        // same identity, fresh id
        assert_eq!(store.append(vec![punch("d1", "1", 8, 0)]).await.unwrap(), 0);
        // same user and time on another terminal is a different punch
        assert_eq!(store.append(vec![punch("d2", "1", 8, 0)]).await.unwrap(), 1);
        assert_eq!(store.len().await, 3);
    }

    #[actix_web::test]
    async fn register_keeps_cursor_and_empty_key() {
        let registry = MemoryDeviceRegistry::new();
        let created = registry
            .register(NewDevice {
                id: Some("gate".into()),
                name: "Gate".into(),
                network_address: Some("10.0.0.2".into()),
                access_key: Some(String::new()),
            })
            .await
            .unwrap();
        assert_eq!(created.access_key, "");

        registry
            .update("gate", DevicePatch::advance_cursor(12, Utc::now()))
            .await
            .unwrap();
        let renamed = registry
            .register(NewDevice {
                id: Some("gate".into()),
                name: "Main Gate".into(),
                network_address: Some("10.0.0.2".into()),
                access_key: None,
            })
            .await
            .unwrap();
        assert_eq!(renamed.cursor, 12);
        assert!(renamed.access_key.starts_with("ACT-"));
    }

    #[actix_web::test]
    async fn update_unknown_device_is_not_found() {
        let registry = MemoryDeviceRegistry::new();
        let err = registry
            .update("nope", DevicePatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[actix_web::test]
    async fn padded_ids_merge_into_the_same_employee() {
        let directory = MemoryDirectoryStore::new();
        directory
            .upsert(vec![EmployeeUpdate {
                id: "42".into(),
                name: Some("Somchai".into()),
                department: Some("Warehouse".into()),
                position: None,
            }])
            .await
            .unwrap();
        directory
            .upsert(vec![EmployeeUpdate {
                id: " 42 ".into(),
                position: Some("Driver".into()),
                ..Default::default()
            }])
            .await
            .unwrap();

        let employees = directory.list().await.unwrap();
        assert_eq!(employees.len(), 1);
        assert_eq!(employees[0].id, "42");
        assert_eq!(employees[0].name, "Somchai");
        assert_eq!(employees[0].department.as_deref(), Some("Warehouse"));
        assert_eq!(employees[0].position.as_deref(), Some("Driver"));
    }
}
