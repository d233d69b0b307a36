use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// One punch as received from a terminal. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RawPunchEvent {
    #[schema(example = "2b1f8f6e-4d7c-4a51-9a43-7f1b2c3d4e5f")]
    pub id: String,
    #[schema(example = "1718000000000")]
    pub device_id: String,
    #[schema(example = "42")]
    pub device_user_id: String,
    /// Terminal wall-clock time of the punch
    #[schema(example = "2026-01-01T08:10:00", format = "date-time", value_type = String)]
    pub timestamp: NaiveDateTime,
    #[schema(example = "2026-01-01T09:00:00Z", format = "date-time", value_type = String)]
    pub received_at: DateTime<Utc>,
    #[schema(value_type = Object)]
    pub source_payload: Value,
}

/// Composite identity used for de-duplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PunchKey {
    pub device_id: String,
    pub device_user_id: String,
    pub timestamp: NaiveDateTime,
}

impl RawPunchEvent {
    pub fn key(&self) -> PunchKey {
        PunchKey {
            device_id: self.device_id.clone(),
            device_user_id: self.device_user_id.clone(),
            timestamp: self.timestamp,
        }
    }
}

const TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parses a terminal timestamp to whole seconds. Offsets are dropped: the
/// terminal's wall clock is what counts.
pub fn parse_punch_time(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    let parsed = match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => Some(dt.naive_local()),
        Err(_) => TIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok()),
    }?;
    parsed.with_nanosecond(0)
}

/// Terminal identifiers arrive as either strings or numbers.
pub fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Extracts `(user_id, time)` from a terminal punch record.
pub fn parse_punch(payload: &Value) -> Option<(String, NaiveDateTime)> {
    let user = payload.get("user_id").and_then(id_from_value)?;
    let time = payload
        .get("time")
        .and_then(Value::as_str)
        .and_then(parse_punch_time)?;
    Some((user, time))
}
