// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The refresh handshake over the HTTP surface: after a macrostep, both
//! processes are steered into refreshing before anyone may advance.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use ms_core::{AppName, Application, GraphAuth, InstanceId, OrchestratorKind, ProcessId};
use ms_service::{router, ServiceState};
use ms_storage::InstanceStore;
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

fn store() -> Arc<InstanceStore> {
    let store = InstanceStore::in_memory();
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
    Arc::new(store)
}

fn payload(process: &str) -> String {
    json!({
        "processData": {
            "infraID": "pk-1",
            "infraName": "app",
            "nodeID": process,
            "nodeName": "p",
            "bpTag": "",
        },
        "userData": { "nodeIP": "10.0.0.9" },
    })
    .to_string()
}

async fn request(store: &Arc<InstanceStore>, method: &str, uri: &str, body: Option<String>) -> StatusCode {
    let app = router(ServiceState { store: Arc::clone(store) });
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.map(Body::from).unwrap_or_else(Body::empty))
        .unwrap();
    app.oneshot(request).await.unwrap().status()
}

#[tokio::test]
async fn both_processes_refresh_before_anyone_advances() {
    let store = store();
    let pk = InstanceId::new("pk-1");

    // Both processes report breakpoint #1.
    let status = request(&store, "POST", "/Submit/pk-1/p1/", Some(payload("p1"))).await;
    assert_eq!(status, StatusCode::OK);
    let status = request(&store, "POST", "/Submit/pk-1/p2/", Some(payload("p2"))).await;
    assert_eq!(status, StatusCode::OK);

    // Root state: everybody waits.
    assert_eq!(request(&store, "GET", "/Next/pk-1/p1/", None).await, StatusCode::NO_CONTENT);

    // The driver permits p1, which advances one breakpoint.
    store.permit_set(&pk, &[ProcessId::new("p1")]).unwrap();
    assert_eq!(request(&store, "GET", "/Next/pk-1/p1/", None).await, StatusCode::OK);
    let status = request(&store, "POST", "/Submit/pk-1/p1/", Some(payload("p1"))).await;
    assert_eq!(status, StatusCode::OK);

    // p1 polls: a sibling has not refreshed, and neither has p1.
    assert_eq!(request(&store, "GET", "/Next/pk-1/p1/", None).await, StatusCode::RESET_CONTENT);
    let status = request(&store, "POST", "/Refresh/pk-1/p1/", Some(payload("p1"))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // p2 polls, is told to refresh, and does.
    assert_eq!(request(&store, "GET", "/Next/pk-1/p2/", None).await, StatusCode::RESET_CONTENT);
    let status = request(&store, "POST", "/Refresh/pk-1/p2/", Some(payload("p2"))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // Handshake complete: p1 now simply waits (its permit is spent) and
    // the driver observes the refresh-completed state.
    assert_eq!(request(&store, "GET", "/Next/pk-1/p1/", None).await, StatusCode::NO_CONTENT);
    assert!(store.is_refresh_completed(&pk).unwrap());
}
