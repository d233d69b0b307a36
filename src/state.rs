use crate::attendance::AttendanceReports;
use crate::config::Config;
use crate::device::{DeviceClient, ProtocolResult};
use crate::store::memory::{MemoryDeviceRegistry, MemoryDirectoryStore, MemoryPunchStore};
use crate::store::mysql::{MySqlDeviceRegistry, MySqlDirectoryStore, MySqlPunchStore};
use crate::store::{DeviceRegistry, DirectoryStore, PunchStore};
use crate::sync::{DirectorySynchronizer, LogIngestor, LogSynchronizer};
use sqlx::MySqlPool;
use std::sync::Arc;

/// Everything the handlers and background tasks share.
#[derive(Clone)]
pub struct AppState {
    pub devices: Arc<dyn DeviceRegistry>,
    pub punches: Arc<dyn PunchStore>,
    pub directory: Arc<dyn DirectoryStore>,
    pub client: DeviceClient,
    pub ingestor: Arc<LogIngestor>,
    pub log_sync: Arc<LogSynchronizer>,
    pub directory_sync: Arc<DirectorySynchronizer>,
    pub reports: Arc<AttendanceReports>,
}

impl AppState {
    pub fn new(
        config: &Config,
        devices: Arc<dyn DeviceRegistry>,
        punches: Arc<dyn PunchStore>,
        directory: Arc<dyn DirectoryStore>,
        client: DeviceClient,
    ) -> Self {
        Self {
            ingestor: Arc::new(LogIngestor::new(punches.clone())),
            log_sync: Arc::new(LogSynchronizer::new(
                client.clone(),
                devices.clone(),
                punches.clone(),
            )),
            directory_sync: Arc::new(DirectorySynchronizer::new(
                client.clone(),
                devices.clone(),
                directory.clone(),
                config.user_info_batch_width,
            )),
            reports: Arc::new(AttendanceReports::new(
                punches.clone(),
                directory.clone(),
                config.shift,
            )),
            devices,
            punches,
            directory,
            client,
        }
    }

    pub fn with_mysql(config: &Config, pool: MySqlPool) -> ProtocolResult<Self> {
        Ok(Self::new(
            config,
            Arc::new(MySqlDeviceRegistry::new(pool.clone())),
            Arc::new(MySqlPunchStore::new(pool.clone())),
            Arc::new(MySqlDirectoryStore::new(pool)),
            DeviceClient::new(config.device_timeout)?,
        ))
    }

    pub fn in_memory(config: &Config) -> ProtocolResult<Self> {
        Ok(Self::new(
            config,
            Arc::new(MemoryDeviceRegistry::new()),
            Arc::new(MemoryPunchStore::new()),
            Arc::new(MemoryDirectoryStore::new()),
            DeviceClient::new(config.device_timeout)?,
        ))
    }
}
