//! Directory synchronizer against a fake terminal.

mod common;

use attendance_sync::model::employee::EmployeeUpdate;
use attendance_sync::store::DirectoryStore;
use attendance_sync::store::memory::{MemoryDeviceRegistry, MemoryDirectoryStore};
use attendance_sync::sync::{DirectorySynchronizer, SyncError};
use common::{answer, client, device, reply};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

async fn user_info(server: &MockServer, id: &str, payload: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/control"))
        .and(body_partial_json(json!({ "cmd": "GetUserInfo", "payload": { "id": id } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply("UserInfo", payload)))
        .expect(1)
        .mount(server)
        .await;
}

/// Answers every GetUserInfo after `delay`, remembering when each request arrived.
struct DelayedUserInfo {
    arrivals: Arc<Mutex<Vec<Instant>>>,
    delay: Duration,
}

impl Respond for DelayedUserInfo {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        self.arrivals.lock().unwrap().push(Instant::now());
        let body: Value = request.body_json().unwrap();
        let id = body["payload"]["id"].as_str().unwrap_or_default().to_string();
        ResponseTemplate::new(200)
            .set_body_json(reply("UserInfo", json!({ "id": id, "name": format!("User {id}") })))
            .set_delay(self.delay)
    }
}

/// Most requests whose delay windows overlap at any one moment.
fn peak_in_flight(arrivals: &[Instant], delay: Duration) -> usize {
    arrivals
        .iter()
        .map(|start| {
            arrivals
                .iter()
                .filter(|t| *t >= start && **t < *start + delay)
                .count()
        })
        .max()
        .unwrap_or(0)
}

fn synchronizer(
    server: &MockServer,
    directory: Arc<MemoryDirectoryStore>,
    batch_width: usize,
) -> DirectorySynchronizer {
    let devices = Arc::new(MemoryDeviceRegistry::with_devices(vec![device(
        "gate",
        Some(&server.uri()),
    )]));
    DirectorySynchronizer::new(client(Duration::from_secs(2)), devices, directory, batch_width)
}

#[actix_web::test]
async fn resolves_users_in_batches_and_skips_failures() {
    let server = MockServer::start().await;
    answer(
        &server,
        "GetUserIdList",
        Some(json!({ "start_pos": 0 })),
        reply("UserIdList", json!({ "user_id": ["1", 2, "3"] })),
    )
    .await;
    user_info(&server, "1", json!({ "id": "1", "name": "Anan", "position": "Driver" })).await;
    // user 2 is listed but the terminal cannot resolve it
    Mock::given(method("POST"))
        .and(path("/control"))
        .and(body_partial_json(json!({ "cmd": "GetUserInfo", "payload": { "id": "2" } })))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(reply("Error", json!({ "code": "not_found", "details": "2" }))),
        )
        .expect(1)
        .mount(&server)
        .await;
    user_info(&server, "3", json!({ "id": "3", "name": "Chai" })).await;

    let directory = Arc::new(MemoryDirectoryStore::new());
    let sync = synchronizer(&server, directory.clone(), 2);
    let report = sync.try_sync_all().await.unwrap();

    assert_eq!(report.devices_synced, 1);
    assert_eq!(report.employee_count, 2);

    let employees = directory.list().await.unwrap();
    let ids: Vec<_> = employees.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, ["1", "3"]);
    assert_eq!(employees[0].name, "Anan");
    assert_eq!(employees[0].position.as_deref(), Some("Driver"));
}

#[actix_web::test]
async fn sync_merges_into_existing_identities() {
    let server = MockServer::start().await;
    answer(
        &server,
        "GetUserIdList",
        None,
        reply("UserIdList", json!({ "user_id": ["42"] })),
    )
    .await;
    user_info(&server, "42", json!({ "id": "42", "name": "Somchai", "department": "" })).await;

    let directory = Arc::new(MemoryDirectoryStore::new());
    directory
        .upsert(vec![EmployeeUpdate {
            id: "42".into(),
            name: Some("Old Name".into()),
            department: Some("Warehouse".into()),
            position: Some("Driver".into()),
        }])
        .await
        .unwrap();

    let sync = synchronizer(&server, directory.clone(), 5);
    let device = device("gate", Some(&server.uri()));
    let outcome = sync.sync_directory(&device).await.unwrap();
    assert_eq!((outcome.listed, outcome.employee_count, outcome.skipped), (1, 1, 0));

    let merged = directory.get("42").await.unwrap().unwrap();
    assert_eq!(merged.name, "Somchai");
    assert_eq!(merged.department.as_deref(), Some("Warehouse"));
    assert_eq!(merged.position.as_deref(), Some("Driver"));
}

#[actix_web::test]
async fn terminal_without_user_listing_fails_the_device() {
    let server = MockServer::start().await;
    answer(&server, "GetUserIdList", None, reply("UnknownCommand", json!({}))).await;

    let directory = Arc::new(MemoryDirectoryStore::new());
    let sync = synchronizer(&server, directory.clone(), 5);
    let device = device("gate", Some(&server.uri()));

    let err = sync.sync_directory(&device).await.unwrap_err();
    assert!(matches!(err, SyncError::UnexpectedReply { .. }));

    let report = sync.sync_all().await.unwrap();
    assert_eq!(report.devices_failed, 1);
    assert_eq!(report.failures[0].device_id, "gate");
    assert!(directory.list().await.unwrap().is_empty());
}

#[actix_web::test]
async fn user_lookups_never_exceed_the_batch_width() {
    let server = MockServer::start().await;
    let ids: Vec<String> = (1..=7).map(|n| n.to_string()).collect();
    answer(
        &server,
        "GetUserIdList",
        None,
        reply("UserIdList", json!({ "user_id": ids })),
    )
    .await;

    let delay = Duration::from_millis(300);
    let arrivals = Arc::new(Mutex::new(Vec::new()));
    Mock::given(method("POST"))
        .and(path("/control"))
        .and(body_partial_json(json!({ "cmd": "GetUserInfo" })))
        .respond_with(DelayedUserInfo {
            arrivals: arrivals.clone(),
            delay,
        })
        .expect(7)
        .mount(&server)
        .await;

    let directory = Arc::new(MemoryDirectoryStore::new());
    let sync = synchronizer(&server, directory.clone(), 3);
    let device = device("gate", Some(&server.uri()));
    let outcome = sync.sync_directory(&device).await.unwrap();
    assert_eq!((outcome.listed, outcome.employee_count, outcome.skipped), (7, 7, 0));
    assert_eq!(directory.list().await.unwrap().len(), 7);

    let arrivals = arrivals.lock().unwrap().clone();
    assert_eq!(arrivals.len(), 7);
    let peak = peak_in_flight(&arrivals, delay);
    assert!(peak <= 3, "{peak} lookups overlapped with a batch width of 3");
    assert!(peak >= 2, "lookups within a batch ran one at a time");
}
