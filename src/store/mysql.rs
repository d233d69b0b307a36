use super::{DeviceRegistry, DirectoryStore, PunchStore, StoreError, StoreResult, resolve_new_device};
use crate::model::device::{Device, DevicePatch, NewDevice};
use crate::model::employee::{EmployeeIdentity, EmployeeUpdate};
use crate::model::punch::RawPunchEvent;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;
use sqlx::MySqlPool;
use sqlx::types::Json;
use tracing::{debug, error};

const DEVICE_COLUMNS: &str =
    "id, name, network_address, access_key, log_cursor, last_synced_at";

/// Re-delivered punches collide on `uq_punch_identity`; any other failure,
/// including other unique keys, is a real error.
fn is_identity_conflict(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db) => db.is_unique_violation() && db.message().contains("uq_punch_identity"),
        _ => false,
    }
}

#[derive(Clone)]
pub struct MySqlDeviceRegistry {
    pool: MySqlPool,
}

impl MySqlDeviceRegistry {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeviceRegistry for MySqlDeviceRegistry {
    async fn list(&self) -> StoreResult<Vec<Device>> {
        let sql = format!("SELECT {DEVICE_COLUMNS} FROM devices ORDER BY id");
        let devices = sqlx::query_as::<_, Device>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(devices)
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Device>> {
        let sql = format!("SELECT {DEVICE_COLUMNS} FROM devices WHERE id = ?");
        let device = sqlx::query_as::<_, Device>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(device)
    }

    async fn register(&self, device: NewDevice) -> StoreResult<Device> {
        let (id, access_key) = resolve_new_device(&device);

        sqlx::query(
            r#"
            INSERT INTO devices (id, name, network_address, access_key)
            VALUES (?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                name = VALUES(name),
                network_address = VALUES(network_address),
                access_key = VALUES(access_key)
            "#,
        )
        .bind(&id)
        .bind(&device.name)
        .bind(&device.network_address)
        .bind(&access_key)
        .execute(&self.pool)
        .await?;

        self.get(&id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("device {id}")))
    }

    async fn update(&self, id: &str, patch: DevicePatch) -> StoreResult<Device> {
        // GREATEST keeps the cursor monotonic even if two writers race
        sqlx::query(
            r#"
            UPDATE devices SET
                name = COALESCE(?, name),
                network_address = COALESCE(?, network_address),
                access_key = COALESCE(?, access_key),
                log_cursor = GREATEST(log_cursor, COALESCE(?, log_cursor)),
                last_synced_at = COALESCE(?, last_synced_at)
            WHERE id = ?
            "#,
        )
        .bind(&patch.name)
        .bind(&patch.network_address)
        .bind(&patch.access_key)
        .bind(patch.cursor)
        .bind(patch.last_synced_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.get(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("device {id}")))
    }

    async fn delete(&self, id: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM devices WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(sqlx::FromRow)]
struct PunchRow {
    id: String,
    device_id: String,
    device_user_id: String,
    punched_at: NaiveDateTime,
    received_at: DateTime<Utc>,
    source_payload: Json<Value>,
}

impl From<PunchRow> for RawPunchEvent {
    fn from(row: PunchRow) -> Self {
        RawPunchEvent {
            id: row.id,
            device_id: row.device_id,
            device_user_id: row.device_user_id,
            timestamp: row.punched_at,
            received_at: row.received_at,
            source_payload: row.source_payload.0,
        }
    }
}

const PUNCH_COLUMNS: &str =
    "id, device_id, device_user_id, punched_at, received_at, source_payload";

#[derive(Clone)]
pub struct MySqlPunchStore {
    pool: MySqlPool,
}

impl MySqlPunchStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PunchStore for MySqlPunchStore {
    async fn append(&self, events: Vec<RawPunchEvent>) -> StoreResult<usize> {
        if events.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0usize;

        for event in &events {
            let result = sqlx::query(
                r#"
                INSERT INTO punch_events
                (id, device_id, device_user_id, punched_at, received_at, source_payload)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&event.id)
            .bind(&event.device_id)
            .bind(&event.device_user_id)
            .bind(event.timestamp)
            .bind(event.received_at)
            .bind(Json(&event.source_payload))
            .execute(&mut *tx)
            .await;

            match result {
                Ok(r) => inserted += r.rows_affected() as usize,
                Err(e) if is_identity_conflict(&e) => {
                    debug!(device_id = %event.device_id, user = %event.device_user_id, "Punch already stored");
                }
                Err(e) => {
                    error!(error = %e, device_id = %event.device_id, "Punch insert failed, rolling back batch");
                    tx.rollback().await?;
                    return Err(e.into());
                }
            }
        }

        tx.commit().await?;
        debug!(batch = events.len(), inserted, "Punch batch committed");
        Ok(inserted)
    }

    async fn list_between(&self, from: NaiveDateTime, to: NaiveDateTime) -> StoreResult<Vec<RawPunchEvent>> {
        let sql = format!(
            "SELECT {PUNCH_COLUMNS} FROM punch_events \
             WHERE punched_at >= ? AND punched_at < ? ORDER BY punched_at"
        );
        let rows = sqlx::query_as::<_, PunchRow>(&sql)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(RawPunchEvent::from).collect())
    }

    async fn list_recent(&self, limit: u32) -> StoreResult<Vec<RawPunchEvent>> {
        let sql = format!(
            "SELECT {PUNCH_COLUMNS} FROM punch_events ORDER BY received_at DESC, punched_at DESC LIMIT ?"
        );
        let rows = sqlx::query_as::<_, PunchRow>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(RawPunchEvent::from).collect())
    }
}

#[derive(Clone)]
pub struct MySqlDirectoryStore {
    pool: MySqlPool,
}

impl MySqlDirectoryStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DirectoryStore for MySqlDirectoryStore {
    async fn upsert(&self, updates: Vec<EmployeeUpdate>) -> StoreResult<usize> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let mut written = 0usize;

        for update in updates.iter().filter(|u| !u.id.trim().is_empty()) {
            // empty strings never overwrite, same as EmployeeIdentity::merge
            sqlx::query(
                r#"
                INSERT INTO employees (id, name, department, position, last_synced_at)
                VALUES (?, ?, NULLIF(?, ''), NULLIF(?, ''), ?)
                ON DUPLICATE KEY UPDATE
                    name = COALESCE(NULLIF(VALUES(name), ''), name),
                    department = COALESCE(VALUES(department), department),
                    position = COALESCE(VALUES(position), position),
                    last_synced_at = VALUES(last_synced_at)
                "#,
            )
            .bind(update.id.trim())
            .bind(update.name.as_deref().map(str::trim).unwrap_or_default())
            .bind(update.department.as_deref().map(str::trim))
            .bind(update.position.as_deref().map(str::trim))
            .bind(now)
            .execute(&mut *tx)
            .await?;
            written += 1;
        }

        tx.commit().await?;
        Ok(written)
    }

    async fn list(&self) -> StoreResult<Vec<EmployeeIdentity>> {
        let employees = sqlx::query_as::<_, EmployeeIdentity>(
            "SELECT id, name, department, position, last_synced_at FROM employees ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(employees)
    }

    async fn get(&self, id: &str) -> StoreResult<Option<EmployeeIdentity>> {
        let employee = sqlx::query_as::<_, EmployeeIdentity>(
            "SELECT id, name, department, position, last_synced_at FROM employees WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(employee)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::error::Error as StdError;

    #[derive(Debug, thiserror::Error)]
    #[error("{message}")]
    struct FakeDbError {
        message: String,
        unique: bool,
    }

    impl DatabaseError for FakeDbError {
        fn message(&self) -> &str {
            &self.message
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            if self.unique {
                ErrorKind::UniqueViolation
            } else {
                ErrorKind::Other
            }
        }
    }

    fn db_error(message: &str, unique: bool) -> sqlx::Error {
        sqlx::Error::Database(Box::new(FakeDbError {
            message: message.to_string(),
            unique,
        }))
    }

    #[test]
    fn only_the_punch_identity_key_is_a_duplicate() {
        let duplicate = db_error(
            "Duplicate entry 'gate-7-2026-01-05 08:00:00' for key 'punch_events.uq_punch_identity'",
            true,
        );
        assert!(is_identity_conflict(&duplicate));

        let primary = db_error(
            "Duplicate entry 'abc' for key 'punch_events.PRIMARY'",
            true,
        );
        assert!(!is_identity_conflict(&primary));

        let truncated = db_error(
            "Data too long for column 'device_user_id' at row 1",
            false,
        );
        assert!(!is_identity_conflict(&truncated));

        assert!(!is_identity_conflict(&sqlx::Error::PoolTimedOut));
    }
}
