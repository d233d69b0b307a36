use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A registered attendance terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": "1718000000000",
        "name": "Front Gate",
        "network_address": "192.168.1.3",
        "access_key": "",
        "cursor": 1250,
        "last_synced_at": "2026-01-01T09:00:00Z"
    })
)]
pub struct Device {
    #[schema(example = "1718000000000")]
    pub id: String,

    #[schema(example = "Front Gate")]
    pub name: String,

    /// Host (optionally `host:port` or a full `http://` base) of the control endpoint
    #[schema(example = "192.168.1.3", nullable = true)]
    pub network_address: Option<String>,

    /// Sent as `api_key`; an empty key is valid
    #[schema(example = "")]
    pub access_key: String,

    /// Offset of the last ingested punch event on this terminal
    #[sqlx(rename = "log_cursor")]
    #[schema(example = 1250)]
    pub cursor: u64,

    #[schema(example = "2026-01-01T09:00:00Z", format = "date-time", value_type = String, nullable = true)]
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl Device {
    /// The address to talk to, if one is configured.
    pub fn address(&self) -> Option<&str> {
        self.network_address
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
    }
}

/// Operator request to register or replace a device.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct NewDevice {
    /// Generated when omitted
    #[schema(example = "1718000000000", nullable = true)]
    pub id: Option<String>,
    #[schema(example = "Front Gate")]
    pub name: String,
    #[schema(example = "192.168.1.3", nullable = true)]
    pub network_address: Option<String>,
    /// Omitted => a random `ACT-` key is generated; `""` is kept as-is
    #[schema(example = "", nullable = true)]
    pub access_key: Option<String>,
}

/// Field-wise change to a device record. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct DevicePatch {
    pub name: Option<String>,
    pub network_address: Option<String>,
    pub access_key: Option<String>,
    /// Never lowers the stored cursor
    #[serde(skip)]
    pub cursor: Option<u64>,
    #[serde(skip)]
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl DevicePatch {
    pub fn advance_cursor(cursor: u64, at: DateTime<Utc>) -> Self {
        Self {
            cursor: Some(cursor),
            last_synced_at: Some(at),
            ..Default::default()
        }
    }

    /// Applies the patch in place, keeping the cursor monotonic.
    pub fn apply(&self, device: &mut Device) {
        if let Some(name) = &self.name {
            device.name = name.clone();
        }
        if let Some(address) = &self.network_address {
            device.network_address = Some(address.clone());
        }
        if let Some(key) = &self.access_key {
            device.access_key = key.clone();
        }
        if let Some(cursor) = self.cursor {
            device.cursor = device.cursor.max(cursor);
        }
        if let Some(at) = self.last_synced_at {
            device.last_synced_at = Some(at);
        }
    }
}

/// `ACT-` followed by nine upper-case alphanumerics.
pub fn generate_access_key() -> String {
    let raw = uuid::Uuid::new_v4().to_simple().to_string().to_uppercase();
    format!("ACT-{}", &raw[..9])
}

pub fn generate_device_id() -> String {
    Utc::now().timestamp_millis().to_string()
}
