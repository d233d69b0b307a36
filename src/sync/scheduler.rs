use super::{DirectorySynchronizer, LogSynchronizer};
use actix_web::rt::time::sleep;
use std::sync::Arc;
use std::time::Duration;
use tracing::error;

/// Spawns the periodic log pull. `Duration::ZERO` disables it.
pub fn spawn_log_sync(sync: Arc<LogSynchronizer>, every: Duration) {
    if every.is_zero() {
        log::info!("Periodic log sync disabled");
        return;
    }

    actix_web::rt::spawn(async move {
        // pause counts from the end of the previous run
        loop {
            sleep(every).await;
            if let Err(e) = sync.sync_all().await {
                error!(error = %e, "Scheduled log sync could not list devices");
            }
        }
    });
    log::info!("Periodic log sync every {}s", every.as_secs());
}

/// Spawns the periodic directory pull. `Duration::ZERO` disables it.
pub fn spawn_directory_sync(sync: Arc<DirectorySynchronizer>, every: Duration) {
    if every.is_zero() {
        log::info!("Periodic directory sync disabled");
        return;
    }

    actix_web::rt::spawn(async move {
        loop {
            sleep(every).await;
            if let Err(e) = sync.sync_all().await {
                error!(error = %e, "Scheduled directory sync could not list devices");
            }
        }
    });
    log::info!("Periodic directory sync every {}s", every.as_secs());
}
