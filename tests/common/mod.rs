//! Shared fixtures: a wiremock-backed fake terminal and device builders.
#![allow(dead_code)]

use attendance_sync::device::DeviceClient;
use attendance_sync::model::device::Device;
use serde_json::{Value, json};
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub fn device(id: &str, address: Option<&str>) -> Device {
    Device {
        id: id.to_string(),
        name: format!("Terminal {id}"),
        network_address: address.map(str::to_string),
        access_key: format!("ACT-{id}"),
        cursor: 0,
        last_synced_at: None,
    }
}

pub fn client(timeout: Duration) -> DeviceClient {
    let http = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap();
    DeviceClient::with_http_client(http)
}

pub fn reply(result: &str, payload: Value) -> Value {
    json!({ "mid": "test", "result": result, "payload": payload })
}

pub fn punch(user_id: &str, time: &str) -> Value {
    json!({ "user_id": user_id, "time": time })
}

/// Answers `cmd` (optionally narrowed by a payload subset) with `body`.
pub async fn answer(server: &MockServer, cmd: &str, payload: Option<Value>, body: Value) {
    let mut expected = json!({ "cmd": cmd });
    if let Some(payload) = payload {
        expected["payload"] = payload;
    }
    Mock::given(method("POST"))
        .and(path("/control"))
        .and(body_partial_json(expected))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Serves `logs` for `GetAttendLog` at `start_pos`.
pub async fn attend_log(server: &MockServer, start_pos: u64, logs: Vec<Value>) {
    answer(
        server,
        "GetAttendLog",
        Some(json!({ "start_pos": start_pos })),
        reply("AttendLog", json!({ "logs": logs })),
    )
    .await;
}
