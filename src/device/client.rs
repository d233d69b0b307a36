use crate::model::device::Device;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, warn};

use super::error::{ProtocolError, ProtocolResult};
use super::protocol::{Command, ControlRequest, ProtocolResponse};

/// Stateless client for the terminal control endpoint (`POST /control?api_key=`).
///
/// One shared `reqwest::Client`; every call carries the configured deadline.
/// Retries are the caller's business.
#[derive(Debug, Clone)]
pub struct DeviceClient {
    http: Client,
}

impl DeviceClient {
    pub fn new(timeout: Duration) -> ProtocolResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(concat!("attendance-sync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProtocolError::InvalidRequest(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http })
    }

    /// Wraps a pre-built client.
    pub fn with_http_client(http: Client) -> Self {
        Self { http }
    }

    fn control_url(address: &str) -> String {
        let base = address.trim().trim_end_matches('/');
        if base.starts_with("http://") || base.starts_with("https://") {
            format!("{base}/control")
        } else {
            format!("http://{base}/control")
        }
    }

    /// Sends one command and decodes the reply.
    pub async fn send(
        &self,
        device: &Device,
        command: &str,
        mid: &str,
        payload: Value,
    ) -> ProtocolResult<ProtocolResponse> {
        let address = device.address().ok_or_else(|| {
            ProtocolError::InvalidRequest(format!("device {} has no network address", device.id))
        })?;
        if command.trim().is_empty() {
            return Err(ProtocolError::InvalidRequest("command is empty".to_string()));
        }

        let url = Self::control_url(address);
        let body = ControlRequest {
            mid,
            cmd: command,
            payload: &payload,
        };
        debug!(device_id = %device.id, url = %url, cmd = command, mid, "sending device command");

        let response = self
            .http
            .post(&url)
            .query(&[("api_key", device.access_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!(device_id = %device.id, error = %e, "device unreachable");
                ProtocolError::ConnectionFailed {
                    address: address.to_string(),
                    details: e.to_string(),
                }
            })?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ProtocolError::ConnectionFailed {
                address: address.to_string(),
                details: e.to_string(),
            })?;

        let decoded = ProtocolResponse::decode(status, &text);
        if let Err(e) = &decoded {
            warn!(device_id = %device.id, cmd = command, error = %e, "device replied with an error");
        }
        decoded
    }

    async fn send_command(
        &self,
        device: &Device,
        command: Command,
        mid: &str,
        payload: Value,
    ) -> ProtocolResult<ProtocolResponse> {
        self.send(device, command.as_ref(), mid, payload).await
    }

    pub async fn get_attend_log(&self, device: &Device, start_pos: u64) -> ProtocolResult<ProtocolResponse> {
        self.send_command(device, Command::GetAttendLog, &new_mid(), Command::start_pos(start_pos))
            .await
    }

    pub async fn get_user_id_list(&self, device: &Device, start_pos: u64) -> ProtocolResult<ProtocolResponse> {
        self.send_command(device, Command::GetUserIdList, &new_mid(), Command::start_pos(start_pos))
            .await
    }

    pub async fn get_user_info(&self, device: &Device, user_id: &str) -> ProtocolResult<ProtocolResponse> {
        self.send_command(
            device,
            Command::GetUserInfo,
            &format!("user-{user_id}"),
            json!({ "id": user_id }),
        )
        .await
    }

    pub async fn config_uploader(
        &self,
        device: &Device,
        target_uri: &str,
        interval: u32,
    ) -> ProtocolResult<ProtocolResponse> {
        self.send_command(
            device,
            Command::ConfigAttendLogUploader,
            &new_mid(),
            json!({ "target_uri": target_uri, "interval": interval }),
        )
        .await
    }
}

pub fn new_mid() -> String {
    uuid::Uuid::new_v4().to_simple().to_string()
}
