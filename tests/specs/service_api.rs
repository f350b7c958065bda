// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Boundary behavior of the ingest surface over a journaled store:
//! rejected payloads never mutate state, and accepted ones survive a
//! restart.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use http_body_util::BodyExt;
use ms_core::{AppName, Application, GraphAuth, InstanceId, OrchestratorKind, ProcessId};
use ms_service::{router, ServiceState};
use ms_storage::InstanceStore;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt;

fn seed(store: &InstanceStore) {
    store
        .register_application(Application {
            name: AppName::new("app"),
            orchestrator: OrchestratorKind::Occopus,
            orchestrator_url: "http://localhost:5000".into(),
            infra_descriptor: "infra.yaml".into(),
            descriptor_path: "app.yaml".into(),
            process_types: vec!["p".into()],
            graph_auth: GraphAuth {
                host: String::new(),
                user: String::new(),
                password: String::new(),
            },
            root_node: None,
            current_node: None,
            registered_at: Utc::now(),
        })
        .unwrap();
    store
        .register_instance(InstanceId::new("pk-1"), AppName::new("app"), Utc::now())
        .unwrap();
}

fn open(dir: &Path) -> Arc<InstanceStore> {
    Arc::new(InstanceStore::open(dir).unwrap())
}

async fn post(store: &Arc<InstanceStore>, uri: &str, body: Value) -> (StatusCode, Value) {
    let app = router(ServiceState { store: Arc::clone(store) });
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, body)
}

fn payload() -> Value {
    json!({
        "processData": {
            "infraID": "pk-1",
            "infraName": "app",
            "nodeID": "vm-a",
            "nodeName": "p",
            "bpTag": "",
        },
        "userData": { "nodeIP": "10.0.0.9" },
    })
}

#[tokio::test]
async fn bad_payload_is_rejected_without_persisting_anything() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(dir.path());
    seed(&store);

    let mut missing_ip = payload();
    missing_ip["userData"].as_object_mut().unwrap().remove("nodeIP");
    let (status, body) = post(&store, "/Submit/pk-1/vm-a/", missing_ip).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], json!(false));

    // Nothing was persisted: after a reopen the process is still absent.
    drop(store);
    let store = open(dir.path());
    assert!(store.processes(&InstanceId::new("pk-1")).unwrap().is_empty());
}

#[tokio::test]
async fn unknown_instance_is_rejected_before_anything_else() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(dir.path());
    seed(&store);

    let (status, body) = post(&store, "/Submit/ghost/vm-a/", payload()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], json!(404));

    drop(store);
    let store = open(dir.path());
    assert!(store.instance(&InstanceId::new("ghost")).is_err());
}

#[tokio::test]
async fn accepted_submits_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let store = open(dir.path());
    seed(&store);

    let (status, _) = post(&store, "/Submit/pk-1/vm-a/", payload()).await;
    assert_eq!(status, StatusCode::OK);

    drop(store);
    let store = open(dir.path());
    let row = store.process(&InstanceId::new("pk-1"), &ProcessId::new("vm-a")).unwrap();
    assert_eq!(row.curr_bp, 1);
    assert_eq!(
        store.breakpoints_for(&InstanceId::new("pk-1"), &ProcessId::new("vm-a")).unwrap().len(),
        1
    );
}
