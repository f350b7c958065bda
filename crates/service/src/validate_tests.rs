// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;
use yare::parameterized;

fn full_payload() -> serde_json::Value {
    json!({
        "processData": {
            "infraID": "pk-1",
            "infraName": "app",
            "nodeID": "vm-a",
            "nodeName": "worker",
            "bpTag": "",
        },
        "userData": { "nodeIP": "10.0.0.4", "lines": "42" },
    })
}

#[test]
fn accepts_a_complete_payload() {
    let body = serde_json::to_vec(&full_payload()).unwrap();
    let (report, raw) = parse_report(&body).unwrap();
    assert_eq!(report.process_data.node_name, "worker");
    assert_eq!(raw, full_payload());
}

#[test]
fn rejects_non_json() {
    assert!(matches!(parse_report(b"not json"), Err(ValidateError::InvalidJson)));
    assert!(matches!(parse_report(b"[1, 2"), Err(ValidateError::InvalidJson)));
}

#[parameterized(
    process_data = { "processData" },
    user_data = { "userData" },
)]
fn rejects_missing_sections(section: &str) {
    let mut payload = full_payload();
    payload.as_object_mut().unwrap().remove(section);
    let body = serde_json::to_vec(&payload).unwrap();
    assert!(matches!(parse_report(&body), Err(ValidateError::MissingKeys)));
}

#[parameterized(
    infra_id = { "processData", "infraID" },
    node_id = { "processData", "nodeID" },
    node_name = { "processData", "nodeName" },
    bp_tag = { "processData", "bpTag" },
    node_ip = { "userData", "nodeIP" },
)]
fn rejects_missing_keys(section: &str, key: &str) {
    let mut payload = full_payload();
    payload[section].as_object_mut().unwrap().remove(key);
    let body = serde_json::to_vec(&payload).unwrap();
    assert!(matches!(parse_report(&body), Err(ValidateError::MissingKeys)));
}

#[parameterized(
    empty_infra_id = { "processData", "infraID", json!("") },
    numeric_node_id = { "processData", "nodeID", json!(17) },
    empty_node_ip = { "userData", "nodeIP", json!("") },
    non_string_tag = { "processData", "bpTag", json!(["last"]) },
)]
fn rejects_bad_value_types(section: &str, key: &str, value: serde_json::Value) {
    let mut payload = full_payload();
    payload[section][key] = value;
    let body = serde_json::to_vec(&payload).unwrap();
    assert!(matches!(parse_report(&body), Err(ValidateError::InvalidValues)));
}

#[test]
fn empty_tag_is_allowed() {
    let body = serde_json::to_vec(&full_payload()).unwrap();
    assert!(parse_report(&body).is_ok());
}
