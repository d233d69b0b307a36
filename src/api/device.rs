use super::store_failure;
use crate::device::{ProtocolError, ProtocolResponse, client::new_mid};
use crate::model::device::{Device, DevicePatch, NewDevice};
use crate::state::AppState;
use actix_web::{HttpResponse, Responder, error::ErrorNotFound, web};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CommandRequest {
    #[schema(example = "GetDeviceTime")]
    pub cmd: String,
    #[schema(value_type = Object, example = json!({}))]
    #[serde(default)]
    pub payload: Value,
    /// Generated when omitted
    #[schema(example = "cmd-1", nullable = true)]
    pub mid: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UploaderConfig {
    /// Where the terminal should push new punches
    #[schema(example = "http://10.0.0.5:3001/api/attendance/upload?device_id=1718000000000")]
    pub target_uri: String,
    /// Push interval in seconds
    #[schema(example = 60)]
    #[serde(default = "default_upload_interval")]
    pub interval: u32,
}

fn default_upload_interval() -> u32 {
    60
}

async fn find_device(state: &AppState, id: &str) -> actix_web::Result<Device> {
    state
        .devices
        .get(id)
        .await
        .map_err(|e| store_failure(e, "get device"))?
        .ok_or_else(|| ErrorNotFound(format!("device {id} not found")))
}

/// Relays a terminal reply, or renders a failure in the terminal's own error envelope.
fn relay(mid: &str, result: Result<ProtocolResponse, ProtocolError>) -> HttpResponse {
    match result {
        Ok(response) => HttpResponse::Ok().json(response.raw),
        Err(e) => {
            let body = json!({
                "mid": mid,
                "result": "Error",
                "payload": { "code": e.code(), "details": e.details() }
            });
            match e {
                ProtocolError::InvalidRequest(_) => HttpResponse::BadRequest().json(body),
                ProtocolError::ConnectionFailed { .. } | ProtocolError::DeviceError { .. } => {
                    HttpResponse::BadGateway().json(body)
                }
            }
        }
    }
}

/// List devices
#[utoipa::path(
    get,
    path = "/api/devices",
    responses(
        (status = 200, description = "Registered devices", body = [Device]),
        (status = 500, description = "Internal server error")
    ),
    tag = "Device"
)]
pub async fn list_devices(state: web::Data<AppState>) -> actix_web::Result<impl Responder> {
    let devices = state
        .devices
        .list()
        .await
        .map_err(|e| store_failure(e, "list devices"))?;
    Ok(HttpResponse::Ok().json(devices))
}

/// Get device
#[utoipa::path(
    get,
    path = "/api/devices/{id}",
    params(("id" = String, Path, description = "Device id")),
    responses(
        (status = 200, description = "Device found", body = Device),
        (status = 404, description = "Device not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Device"
)]
pub async fn get_device(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let device = find_device(&state, &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(device))
}

/// Register device
///
/// Registering an existing id replaces name, address and key but keeps the log cursor.
#[utoipa::path(
    post,
    path = "/api/devices",
    request_body = NewDevice,
    responses(
        (status = 201, description = "Device registered", body = Device),
        (status = 400, description = "Name is required"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Device"
)]
pub async fn register_device(
    state: web::Data<AppState>,
    payload: web::Json<NewDevice>,
) -> actix_web::Result<impl Responder> {
    let payload = payload.into_inner();
    if payload.name.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Device name is required"
        })));
    }

    let device = state
        .devices
        .register(payload)
        .await
        .map_err(|e| store_failure(e, "register device"))?;
    info!(device_id = %device.id, name = %device.name, "Device registered");
    Ok(HttpResponse::Created().json(device))
}

/// Update device
#[utoipa::path(
    put,
    path = "/api/devices/{id}",
    params(("id" = String, Path, description = "Device id")),
    request_body = DevicePatch,
    responses(
        (status = 200, description = "Device updated", body = Device),
        (status = 404, description = "Device not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Device"
)]
pub async fn update_device(
    state: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<DevicePatch>,
) -> actix_web::Result<impl Responder> {
    let id = path.into_inner();
    let device = state
        .devices
        .update(&id, payload.into_inner())
        .await
        .map_err(|e| store_failure(e, "update device"))?;
    Ok(HttpResponse::Ok().json(device))
}

/// Delete device
#[utoipa::path(
    delete,
    path = "/api/devices/{id}",
    params(("id" = String, Path, description = "Device id")),
    responses(
        (status = 204, description = "Device deleted"),
        (status = 404, description = "Device not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Device"
)]
pub async fn delete_device(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let id = path.into_inner();
    let deleted = state
        .devices
        .delete(&id)
        .await
        .map_err(|e| store_failure(e, "delete device"))?;

    if deleted {
        info!(device_id = %id, "Device deleted");
        Ok(HttpResponse::NoContent().finish())
    } else {
        Err(ErrorNotFound(format!("device {id} not found")))
    }
}

/// Send a raw command to a device
///
/// The reply body is relayed as the terminal sent it. `UnknownCommand` is a normal reply.
#[utoipa::path(
    post,
    path = "/api/devices/{id}/command",
    params(("id" = String, Path, description = "Device id")),
    request_body = CommandRequest,
    responses(
        (status = 200, description = "Terminal reply", body = Object, example = json!({
            "mid": "cmd-1", "result": "DeviceTime", "payload": { "time": "2026-01-05T08:00:00" }
        })),
        (status = 400, description = "Device has no address or command is empty", body = Object, example = json!({
            "mid": "cmd-1", "result": "Error", "payload": { "code": "missing_ip", "details": "device 1 has no network address" }
        })),
        (status = 404, description = "Device not found"),
        (status = 502, description = "Terminal unreachable or replied with an error", body = Object, example = json!({
            "mid": "cmd-1", "result": "Error", "payload": { "code": "connection_failed", "details": "operation timed out" }
        }))
    ),
    tag = "Device"
)]
pub async fn send_command(
    state: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<CommandRequest>,
) -> actix_web::Result<impl Responder> {
    let device = find_device(&state, &path.into_inner()).await?;
    let CommandRequest { cmd, payload, mid } = payload.into_inner();
    let mid = mid.filter(|m| !m.is_empty()).unwrap_or_else(new_mid);

    debug!(device_id = %device.id, cmd = %cmd, "Proxying device command");
    let result = state.client.send(&device, &cmd, &mid, payload).await;
    Ok(relay(&mid, result))
}

/// Point a device's push uploader at this service
#[utoipa::path(
    post,
    path = "/api/devices/{id}/uploader",
    params(("id" = String, Path, description = "Device id")),
    request_body = UploaderConfig,
    responses(
        (status = 200, description = "Terminal reply", body = Object, example = json!({
            "mid": "0c1f", "result": "success", "payload": {}
        })),
        (status = 400, description = "Device has no address"),
        (status = 404, description = "Device not found"),
        (status = 502, description = "Terminal unreachable or replied with an error")
    ),
    tag = "Device"
)]
pub async fn configure_uploader(
    state: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<UploaderConfig>,
) -> actix_web::Result<impl Responder> {
    let device = find_device(&state, &path.into_inner()).await?;
    let UploaderConfig {
        target_uri,
        interval,
    } = payload.into_inner();
    if target_uri.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "target_uri is required"
        })));
    }

    let result = state
        .client
        .config_uploader(&device, &target_uri, interval)
        .await;
    let mid = result
        .as_ref()
        .map(|r| r.mid.clone())
        .unwrap_or_default();
    if result.is_ok() {
        info!(device_id = %device.id, target_uri = %target_uri, interval, "Uploader configured");
    }
    Ok(relay(&mid, result))
}
