use super::{DeviceFailure, SyncError};
use crate::device::{DeviceClient, DeviceReply};
use crate::model::device::Device;
use crate::model::employee::EmployeeUpdate;
use crate::store::{DeviceRegistry, DirectoryStore, StoreError};
use futures::future::join_all;
use futures::lock::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct DirectorySyncOutcome {
    /// Identifiers listed by the terminal
    pub listed: usize,
    /// Identities resolved and merged into the directory
    pub employee_count: usize,
    /// Identifiers that could not be resolved
    pub skipped: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct DirectorySyncReport {
    pub devices_total: usize,
    pub devices_synced: usize,
    pub devices_skipped: usize,
    pub devices_failed: usize,
    pub employee_count: usize,
    pub failures: Vec<DeviceFailure>,
}

/// Copies user identities from terminals into the employee directory.
pub struct DirectorySynchronizer {
    client: DeviceClient,
    devices: Arc<dyn DeviceRegistry>,
    directory: Arc<dyn DirectoryStore>,
    batch_width: usize,
    running: Mutex<()>,
}

impl DirectorySynchronizer {
    pub fn new(
        client: DeviceClient,
        devices: Arc<dyn DeviceRegistry>,
        directory: Arc<dyn DirectoryStore>,
        batch_width: usize,
    ) -> Self {
        Self {
            client,
            devices,
            directory,
            batch_width: batch_width.max(1),
            running: Mutex::new(()),
        }
    }

    /// Lists the terminal's users, resolves them `batch_width` at a time and
    /// merges what resolved. Unresolvable users are skipped.
    pub async fn sync_directory(&self, device: &Device) -> Result<DirectorySyncOutcome, SyncError> {
        let response = self.client.get_user_id_list(device, 0).await?;
        let user_ids = match response.reply {
            DeviceReply::UserIdList { user_ids } => user_ids,
            other => {
                return Err(SyncError::UnexpectedReply {
                    result: other.tag().to_string(),
                });
            }
        };

        let mut resolved: Vec<EmployeeUpdate> = Vec::with_capacity(user_ids.len());
        let mut skipped = 0usize;

        for batch in user_ids.chunks(self.batch_width) {
            let replies = join_all(batch.iter().map(|id| self.client.get_user_info(device, id))).await;

            for (id, reply) in batch.iter().zip(replies) {
                match reply {
                    Ok(response) => match response.reply {
                        DeviceReply::UserInfo(user) => resolved.push(user.into()),
                        other => {
                            debug!(device_id = %device.id, user_id = %id, reply = other.tag(), "User not resolved");
                            skipped += 1;
                        }
                    },
                    Err(e) => {
                        debug!(device_id = %device.id, user_id = %id, error = %e, "User lookup failed");
                        skipped += 1;
                    }
                }
            }
        }

        let employee_count = if resolved.is_empty() {
            0
        } else {
            self.directory.upsert(resolved).await?
        };

        info!(
            device_id = %device.id,
            listed = user_ids.len(),
            employee_count,
            skipped,
            "Directory sync complete"
        );

        Ok(DirectorySyncOutcome {
            listed: user_ids.len(),
            employee_count,
            skipped,
        })
    }

    pub async fn sync_all(&self) -> Result<DirectorySyncReport, StoreError> {
        let _guard = self.running.lock().await;
        self.run_fleet().await
    }

    pub async fn try_sync_all(&self) -> Result<DirectorySyncReport, SyncError> {
        let _guard = self.running.try_lock().ok_or(SyncError::Busy)?;
        Ok(self.run_fleet().await?)
    }

    async fn run_fleet(&self) -> Result<DirectorySyncReport, StoreError> {
        let devices = self.devices.list().await?;
        let mut report = DirectorySyncReport {
            devices_total: devices.len(),
            ..Default::default()
        };

        for device in &devices {
            if device.address().is_none() {
                report.devices_skipped += 1;
                continue;
            }
            match self.sync_directory(device).await {
                Ok(outcome) => {
                    report.devices_synced += 1;
                    report.employee_count += outcome.employee_count;
                }
                Err(e) => {
                    warn!(device_id = %device.id, error = %e, "Directory sync failed");
                    report.devices_failed += 1;
                    report.failures.push(DeviceFailure {
                        device_id: device.id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
        Ok(report)
    }
}
