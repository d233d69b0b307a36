use super::store_failure;
use crate::state::AppState;
use crate::sync::{DeviceSyncOutcome, DirectorySyncReport, LogSyncReport, SyncError};
use actix_web::{HttpResponse, Responder, web};
use serde_json::json;
use tracing::{info, warn};

fn sync_failure(e: SyncError, device_id: Option<&str>) -> HttpResponse {
    match e {
        SyncError::Busy => HttpResponse::Conflict().json(json!({
            "message": "A sync run is already in progress"
        })),
        SyncError::Store(e) => HttpResponse::from_error(store_failure(e, "sync")),
        SyncError::Protocol(e) => {
            warn!(device_id, error = %e, "Device sync failed");
            HttpResponse::BadGateway().json(json!({
                "message": "Device sync failed",
                "code": e.code(),
                "details": e.details()
            }))
        }
        SyncError::UnexpectedReply { result } => {
            warn!(device_id, result = %result, "Device sync got an unexpected reply");
            HttpResponse::BadGateway().json(json!({
                "message": "Device sync failed",
                "code": "unexpected_reply",
                "details": result
            }))
        }
    }
}

/// Pull new punches from every device
#[utoipa::path(
    post,
    path = "/api/sync/logs",
    responses(
        (status = 200, description = "Fleet run finished", body = LogSyncReport),
        (status = 409, description = "A sync run is already in progress"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Sync"
)]
pub async fn sync_logs(state: web::Data<AppState>) -> impl Responder {
    match state.log_sync.try_sync_all().await {
        Ok(report) => {
            info!(
                synced = report.devices_synced,
                failed = report.devices_failed,
                new_records = report.new_records,
                "Manual log sync finished"
            );
            HttpResponse::Ok().json(report)
        }
        Err(e) => sync_failure(e, None),
    }
}

/// Pull new punches from one device
#[utoipa::path(
    post,
    path = "/api/sync/logs/{device_id}",
    params(("device_id" = String, Path, description = "Device id")),
    responses(
        (status = 200, description = "Device synced", body = DeviceSyncOutcome),
        (status = 404, description = "Device not found"),
        (status = 409, description = "A sync run is already in progress"),
        (status = 502, description = "Device unreachable or replied unexpectedly")
    ),
    tag = "Sync"
)]
pub async fn sync_device_logs(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    let device_id = path.into_inner();
    match state.log_sync.try_sync_device(&device_id).await {
        Ok(outcome) => HttpResponse::Ok().json(outcome),
        Err(e) => sync_failure(e, Some(&device_id)),
    }
}

/// Refresh the employee directory from every device
#[utoipa::path(
    post,
    path = "/api/sync/employees",
    responses(
        (status = 200, description = "Directory refreshed", body = DirectorySyncReport),
        (status = 409, description = "A sync run is already in progress"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Sync"
)]
pub async fn sync_directory(state: web::Data<AppState>) -> impl Responder {
    match state.directory_sync.try_sync_all().await {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(e) => sync_failure(e, None),
    }
}
