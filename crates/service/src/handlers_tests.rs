// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::{router, ServiceState};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use http_body_util::BodyExt;
use ms_core::{AppName, Application, GraphAuth, InstanceId, OrchestratorKind, ProcessId};
use ms_storage::InstanceStore;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn seeded_store() -> Arc<InstanceStore> {
    let store = InstanceStore::in_memory();
    store
        .register_application(Application {
            name: AppName::new("app"),
            orchestrator: OrchestratorKind::Occopus,
            orchestrator_url: "http://localhost:5000".into(),
            infra_descriptor: "infra.yaml".into(),
            descriptor_path: "app.yaml".into(),
            process_types: vec!["worker".into()],
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
    Arc::new(store)
}

fn payload(process: &str, tag: &str) -> Value {
    json!({
        "processData": {
            "infraID": "pk-1",
            "infraName": "app",
            "nodeID": process,
            "nodeName": "worker",
            "bpTag": tag,
        },
        "userData": { "nodeIP": "10.0.0.4" },
    })
}

async fn send(store: &Arc<InstanceStore>, request: Request<Body>) -> (StatusCode, Value) {
    let app = router(ServiceState { store: Arc::clone(store) });
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn submit(store: &Arc<InstanceStore>, process: &str, tag: &str) -> (StatusCode, Value) {
    send(store, post(&format!("/Submit/pk-1/{process}/"), payload(process, tag))).await
}

// --- Submit ---

#[tokio::test]
async fn submit_registers_a_new_process() {
    let store = seeded_store();
    let (status, body) = submit(&store, "vm-a", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["code"], json!(200));

    let row = store.process(&InstanceId::new("pk-1"), &ProcessId::new("vm-a")).unwrap();
    assert_eq!(row.curr_bp, 1);
}

#[tokio::test]
async fn submit_to_unknown_instance_is_404_before_validation() {
    let store = seeded_store();
    let request = Request::builder()
        .method("POST")
        .uri("/Submit/ghost/vm-a/")
        .body(Body::from("this is not even json"))
        .unwrap();
    let (status, body) = send(&store, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], json!(404));
    assert!(store.processes(&InstanceId::new("pk-1")).unwrap().is_empty());
}

#[tokio::test]
async fn submit_with_invalid_json_is_400() {
    let store = seeded_store();
    let request = Request::builder()
        .method("POST")
        .uri("/Submit/pk-1/vm-a/")
        .body(Body::from("{broken"))
        .unwrap();
    let (status, body) = send(&store, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("Invalid JSON."));
}

#[tokio::test]
async fn submit_with_missing_node_ip_is_422_and_mutates_nothing() {
    let store = seeded_store();
    let mut bad = payload("vm-a", "");
    bad["userData"].as_object_mut().unwrap().remove("nodeIP");
    let (status, _) = send(&store, post("/Submit/pk-1/vm-a/", bad)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(store.processes(&InstanceId::new("pk-1")).unwrap().is_empty());
}

#[tokio::test]
async fn submit_after_terminal_tag_is_422() {
    let store = seeded_store();
    submit(&store, "vm-a", "last").await;
    let (status, _) = submit(&store, "vm-a", "").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

// --- Refresh ---

#[tokio::test]
async fn refresh_sets_the_flag_and_returns_204() {
    let store = seeded_store();
    submit(&store, "vm-a", "").await;
    let (status, body) = send(&store, post("/Refresh/pk-1/vm-a/", payload("vm-a", ""))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);
    assert!(store.process(&InstanceId::new("pk-1"), &ProcessId::new("vm-a")).unwrap().refreshed);
}

#[tokio::test]
async fn refresh_validates_its_payload() {
    let store = seeded_store();
    submit(&store, "vm-a", "").await;
    let request = Request::builder()
        .method("POST")
        .uri("/Refresh/pk-1/vm-a/")
        .body(Body::from("{broken"))
        .unwrap();
    let (status, _) = send(&store, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!store.process(&InstanceId::new("pk-1"), &ProcessId::new("vm-a")).unwrap().refreshed);
}

// --- Next ---

#[tokio::test]
async fn next_for_unknown_process_is_404() {
    let store = seeded_store();
    let (status, body) = send(&store, get("/Next/pk-1/ghost/")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["next"], json!(false));
}

#[tokio::test]
async fn next_in_root_state_is_wait() {
    let store = seeded_store();
    submit(&store, "vm-a", "").await;
    let (status, _) = send(&store, get("/Next/pk-1/vm-a/")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn next_follows_the_refresh_handshake() {
    let store = seeded_store();
    let pk = InstanceId::new("pk-1");
    submit(&store, "vm-a", "").await;
    submit(&store, "vm-b", "").await;

    store.permit_set(&pk, &[ProcessId::new("vm-a")]).unwrap();
    let (status, body) = send(&store, get("/Next/pk-1/vm-a/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["next"], json!(true));
    let (status, _) = send(&store, get("/Next/pk-1/vm-b/")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // vm-a advances; the instance is consistent but unrefreshed.
    submit(&store, "vm-a", "").await;
    let (status, _) = send(&store, get("/Next/pk-1/vm-b/")).await;
    assert_eq!(status, StatusCode::RESET_CONTENT);
    send(&store, post("/Refresh/pk-1/vm-b/", payload("vm-b", ""))).await;
    let (status, _) = send(&store, get("/Next/pk-1/vm-b/")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&store, get("/Next/pk-1/vm-a/")).await;
    assert_eq!(status, StatusCode::RESET_CONTENT);
}

// --- queries ---

#[tokio::test]
async fn infrastructure_listings() {
    let store = seeded_store();
    submit(&store, "vm-a", "").await;

    let (status, body) = send(&store, get("/infrastructures/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["infrastructures"], json!(["pk-1"]));

    let (status, body) = send(&store, get("/infrastructures/pk-1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["processes"][0]["processID"], json!("vm-a"));
    assert_eq!(body["processes"][0]["currBP"], json!(1));

    let (status, body) = send(&store, get("/infrastructures/ghost")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], json!(404));
}

#[tokio::test]
async fn breakpoint_log_is_ordered_by_number() {
    let store = seeded_store();
    submit(&store, "vm-a", "").await;
    store.permit_all(&InstanceId::new("pk-1")).unwrap();
    submit(&store, "vm-a", "last").await;

    let (status, body) = send(&store, get("/infrastructures/pk-1/vm-a")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["breakpoint1"]["processData"]["bpTag"], json!(""));
    assert_eq!(body["breakpoint2"]["processData"]["bpTag"], json!("last"));

    let (status, _) = send(&store, get("/infrastructures/pk-1/ghost")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
