use super::{DeviceFailure, LogIngestor, SyncError};
use crate::device::{DeviceClient, DeviceReply};
use crate::model::device::{Device, DevicePatch};
use crate::store::{DeviceRegistry, PunchStore, StoreError};
use chrono::Utc;
use futures::lock::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct DeviceSyncOutcome {
    /// Log entries returned by the terminal
    pub fetched: usize,
    /// Punch events newly persisted
    pub new_records: usize,
    /// Cursor after the run
    pub cursor: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct LogSyncReport {
    pub devices_total: usize,
    pub devices_synced: usize,
    pub devices_skipped: usize,
    pub devices_failed: usize,
    pub new_records: usize,
    pub failures: Vec<DeviceFailure>,
}

/// Incremental punch pull, one terminal at a time.
///
/// Each terminal's cursor is advanced only after the ingestor confirmed the
/// batch, so a failed run re-fetches the same window next time and the
/// store's de-duplication absorbs the overlap.
pub struct LogSynchronizer {
    client: DeviceClient,
    devices: Arc<dyn DeviceRegistry>,
    ingestor: LogIngestor,
    running: Mutex<()>,
}

impl LogSynchronizer {
    pub fn new(client: DeviceClient, devices: Arc<dyn DeviceRegistry>, punches: Arc<dyn PunchStore>) -> Self {
        Self {
            client,
            devices,
            ingestor: LogIngestor::new(punches),
            running: Mutex::new(()),
        }
    }

    /// Pulls everything after `device.cursor`. Not re-entrant per device: use
    /// [`sync_all`](Self::sync_all) / [`try_sync_device`](Self::try_sync_device)
    /// which serialize runs.
    #[instrument(skip(self, device), fields(device_id = %device.id, cursor = device.cursor))]
    pub async fn sync_device(&self, device: &Device) -> Result<DeviceSyncOutcome, SyncError> {
        let cursor = device.cursor;
        let response = self.client.get_attend_log(device, cursor).await?;

        let logs = match response.reply {
            DeviceReply::AttendLog { logs } => logs,
            other => {
                return Err(SyncError::UnexpectedReply {
                    result: other.tag().to_string(),
                });
            }
        };

        if logs.is_empty() {
            debug!("No new punches");
            return Ok(DeviceSyncOutcome {
                fetched: 0,
                new_records: 0,
                cursor,
            });
        }

        let outcome = self.ingestor.ingest(&device.id, &logs).await?;

        let next = cursor + logs.len() as u64;
        let updated = self
            .devices
            .update(&device.id, DevicePatch::advance_cursor(next, Utc::now()))
            .await?;

        info!(
            fetched = logs.len(),
            inserted = outcome.inserted,
            cursor = updated.cursor,
            "Device log sync complete"
        );

        Ok(DeviceSyncOutcome {
            fetched: logs.len(),
            new_records: outcome.inserted,
            cursor: updated.cursor,
        })
    }

    /// Syncs every registered device in turn. One device failing never stops the rest.
    pub async fn sync_all(&self) -> Result<LogSyncReport, StoreError> {
        let _guard = self.running.lock().await;
        self.run_fleet().await
    }

    /// Like [`sync_all`](Self::sync_all) but refuses to queue behind a running sync.
    pub async fn try_sync_all(&self) -> Result<LogSyncReport, SyncError> {
        let _guard = self.running.try_lock().ok_or(SyncError::Busy)?;
        Ok(self.run_fleet().await?)
    }

    pub async fn try_sync_device(&self, device_id: &str) -> Result<DeviceSyncOutcome, SyncError> {
        let _guard = self.running.try_lock().ok_or(SyncError::Busy)?;
        let device = self
            .devices
            .get(device_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("device {device_id}")))?;
        self.sync_device(&device).await
    }

    async fn run_fleet(&self) -> Result<LogSyncReport, StoreError> {
        let devices = self.devices.list().await?;
        let mut report = LogSyncReport {
            devices_total: devices.len(),
            ..Default::default()
        };

        for device in &devices {
            if device.address().is_none() {
                debug!(device_id = %device.id, "Skipping device without network address");
                report.devices_skipped += 1;
                continue;
            }

            match self.sync_device(device).await {
                Ok(outcome) => {
                    report.devices_synced += 1;
                    report.new_records += outcome.new_records;
                }
                Err(e) => {
                    warn!(device_id = %device.id, error = %e, "Device log sync failed");
                    report.devices_failed += 1;
                    report.failures.push(DeviceFailure {
                        device_id: device.id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            devices = report.devices_total,
            failed = report.devices_failed,
            new_records = report.new_records,
            "Log sync run finished"
        );
        Ok(report)
    }
}
