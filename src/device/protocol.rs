//! Wire types for the terminal control endpoint.
//!
//! Requests are `{mid, cmd, payload}`; replies are `{mid, result, payload}`
//! where `result` tags the reply type. Callers match on [`DeviceReply`],
//! never on HTTP status.

use crate::model::employee::EmployeeUpdate;
use crate::model::punch::id_from_value;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use strum_macros::{AsRefStr, Display, EnumString};

use super::error::{ProtocolError, ProtocolResult};

/// Commands this engine issues itself. The proxy endpoint may send others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
pub enum Command {
    GetAttendLog,
    GetUserIdList,
    GetUserInfo,
    SetUserInfo,
    DeleteUserInfo,
    LockDevice,
    GetDeviceTime,
    SetDeviceTime,
    ConfigAttendLogUploader,
}

impl Command {
    pub fn start_pos(start_pos: u64) -> Value {
        json!({ "start_pos": start_pos })
    }
}

#[derive(Debug, Serialize)]
pub struct ControlRequest<'a> {
    pub mid: &'a str,
    pub cmd: &'a str,
    pub payload: &'a Value,
}

#[derive(Debug, Deserialize)]
struct ControlEnvelope {
    #[serde(default)]
    mid: Option<Value>,
    result: String,
    #[serde(default)]
    payload: Value,
}

/// A user record as the terminal reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceUser {
    pub id: String,
    pub name: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
}

impl DeviceUser {
    fn from_payload(payload: &Value) -> Option<Self> {
        let id = payload.get("id").and_then(id_from_value)?;
        let text = |key: &str| payload.get(key).and_then(Value::as_str).map(str::to_string);
        Some(Self {
            id,
            name: text("name"),
            department: text("department"),
            position: text("position"),
        })
    }
}

impl From<DeviceUser> for EmployeeUpdate {
    fn from(user: DeviceUser) -> Self {
        EmployeeUpdate {
            id: user.id,
            name: user.name,
            department: user.department,
            position: user.position,
        }
    }
}

/// Decoded reply, keyed on the `result` tag.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceReply {
    AttendLog { logs: Vec<Value> },
    UserIdList { user_ids: Vec<String> },
    UserInfo(DeviceUser),
    DeviceTime { time: String },
    /// Acknowledgement of a setter command.
    Ack { result: String },
    /// The terminal does not implement the command. A valid negative answer.
    UnknownCommand,
    /// Anything else, kept verbatim.
    Unrecognized { result: String, payload: Value },
}

impl DeviceReply {
    pub fn tag(&self) -> &str {
        match self {
            DeviceReply::AttendLog { .. } => "AttendLog",
            DeviceReply::UserIdList { .. } => "UserIdList",
            DeviceReply::UserInfo(_) => "UserInfo",
            DeviceReply::DeviceTime { .. } => "DeviceTime",
            DeviceReply::Ack { result } => result,
            DeviceReply::UnknownCommand => "UnknownCommand",
            DeviceReply::Unrecognized { result, .. } => result,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProtocolResponse {
    pub mid: String,
    pub reply: DeviceReply,
    /// The parsed body as received, for pass-through consumers.
    pub raw: Value,
}

const UNKNOWN_COMMAND: &str = "unknown_command";

fn is_ack(result: &str) -> bool {
    ["success", "ok", "ack"]
        .iter()
        .any(|tag| result.eq_ignore_ascii_case(tag))
}

impl ProtocolResponse {
    /// Decodes a reply body. Non-JSON bodies and explicit error replies become
    /// [`ProtocolError::DeviceError`] carrying the raw body.
    pub fn decode(status: u16, body: &str) -> ProtocolResult<Self> {
        let raw: Value = serde_json::from_str(body).map_err(|_| ProtocolError::DeviceError {
            status,
            details: body.to_string(),
        })?;
        let envelope: ControlEnvelope =
            serde_json::from_value(raw.clone()).map_err(|_| ProtocolError::DeviceError {
                status,
                details: body.to_string(),
            })?;

        let mid = envelope
            .mid
            .as_ref()
            .and_then(id_from_value)
            .unwrap_or_default();
        let payload = envelope.payload;

        let reply = match envelope.result.as_str() {
            "AttendLog" => DeviceReply::AttendLog {
                logs: payload
                    .get("logs")
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default(),
            },
            "UserIdList" => DeviceReply::UserIdList {
                user_ids: payload
                    .get("user_id")
                    .and_then(Value::as_array)
                    .map(|ids| ids.iter().filter_map(id_from_value).collect())
                    .unwrap_or_default(),
            },
            "UserInfo" => match DeviceUser::from_payload(&payload) {
                Some(user) => DeviceReply::UserInfo(user),
                None => DeviceReply::Unrecognized {
                    result: envelope.result.clone(),
                    payload,
                },
            },
            "DeviceTime" => DeviceReply::DeviceTime {
                time: payload
                    .get("time")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            },
            "UnknownCommand" => DeviceReply::UnknownCommand,
            "Error" => {
                let code = payload.get("code").and_then(Value::as_str);
                if code == Some(UNKNOWN_COMMAND) {
                    DeviceReply::UnknownCommand
                } else {
                    return Err(ProtocolError::DeviceError {
                        status,
                        details: body.to_string(),
                    });
                }
            }
            other if is_ack(other) => DeviceReply::Ack {
                result: other.to_string(),
            },
            other => DeviceReply::Unrecognized {
                result: other.to_string(),
                payload,
            },
        };

        Ok(Self { mid, reply, raw })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn attend_log_reply() {
        let body = r#"{"mid":"1","result":"AttendLog","payload":{"logs":[{"user_id":"1","time":"2026-01-05T08:00:00"},{"user_id":"2","time":"2026-01-05T08:01:00"}]}}"#;
        let resp = ProtocolResponse::decode(200, body).unwrap();
        assert_eq!(resp.mid, "1");
        match resp.reply {
            DeviceReply::AttendLog { logs } => assert_eq!(logs.len(), 2),
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[test]
    fn user_id_list_accepts_numbers() {
        let body = r#"{"mid":"x","result":"UserIdList","payload":{"user_id":["1",2,"  "]}}"#;
        let resp = ProtocolResponse::decode(200, body).unwrap();
        assert_eq!(
            resp.reply,
            DeviceReply::UserIdList {
                user_ids: vec!["1".into(), "2".into()]
            }
        );
    }

    #[test]
    fn unknown_command_is_not_an_error() {
        let tagged = r#"{"mid":"x","result":"Error","payload":{"code":"unknown_command"}}"#;
        assert_eq!(
            ProtocolResponse::decode(200, tagged).unwrap().reply,
            DeviceReply::UnknownCommand
        );
    }

    #[test]
    fn explicit_error_reply_keeps_body() {
        let body = r#"{"mid":"x","result":"Error","payload":{"code":"bad_key"}}"#;
        let err = ProtocolResponse::decode(403, body).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::DeviceError {
                status: 403,
                details: body.to_string()
            }
        );
    }

    #[test]
    fn non_json_body_is_a_device_error() {
        let err = ProtocolResponse::decode(500, "<html>oops</html>").unwrap_err();
        assert_eq!(err.code(), "device_error");
        assert_eq!(err.details(), "<html>oops</html>");
    }

    #[test]
    fn user_info_without_id_is_unrecognized() {
        let body = r#"{"mid":"x","result":"UserInfo","payload":{"name":"Nobody"}}"#;
        assert!(matches!(
            ProtocolResponse::decode(200, body).unwrap().reply,
            DeviceReply::Unrecognized { .. }
        ));
    }

    #[test]
    fn ack_and_unrecognized_tags() {
        let ack = r#"{"mid":"x","result":"Success","payload":{}}"#;
        assert_eq!(
            ProtocolResponse::decode(200, ack).unwrap().reply.tag(),
            "Success"
        );
        let other = r#"{"mid":"x","result":"VersionInfo","payload":{"fw":"1.2"}}"#;
        assert!(matches!(
            ProtocolResponse::decode(200, other).unwrap().reply,
            DeviceReply::Unrecognized { ref result, .. } if result == "VersionInfo"
        ));
    }

    #[test]
    fn command_names() {
        assert_eq!(Command::GetAttendLog.as_ref(), "GetAttendLog");
        assert_eq!(
            Command::from_str("ConfigAttendLogUploader").ok(),
            Some(Command::ConfigAttendLogUploader)
        );
    }
}
