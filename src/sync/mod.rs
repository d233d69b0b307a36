//! Pulling punches and identities from terminals.

pub mod directory_sync;
pub mod ingest;
pub mod log_sync;
pub mod scheduler;

pub use directory_sync::{DirectorySyncOutcome, DirectorySyncReport, DirectorySynchronizer};
pub use ingest::{IngestOutcome, LogIngestor};
pub use log_sync::{DeviceSyncOutcome, LogSyncReport, LogSynchronizer};

use crate::device::ProtocolError;
use crate::store::StoreError;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Well-formed reply that does not answer the command (including "unknown command").
    #[error("unexpected reply `{result}`")]
    UnexpectedReply { result: String },
    #[error("a sync run is already in progress")]
    Busy,
}

/// One device that could not be synchronized in a fleet run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DeviceFailure {
    pub device_id: String,
    pub error: String,
}
