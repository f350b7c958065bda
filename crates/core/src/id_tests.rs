// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashMap;

#[test]
fn string_id_hash_map_lookup() {
    let mut map = HashMap::new();
    map.insert(InstanceId::new("pk-1234"), 42);
    assert_eq!(map.get("pk-1234"), Some(&42));
}

#[test]
fn string_id_compares_to_str() {
    let id = ProcessId::new("vm-01");
    assert_eq!(id, "vm-01");
    assert_ne!(id, "vm-02");
}

#[test]
fn node_id_generate_is_unique_uuid() {
    let a = NodeId::generate();
    let b = NodeId::generate();
    assert_ne!(a, b);
    assert_eq!(a.as_str().len(), 36); // UUID format
}

#[test]
fn serializes_as_plain_string() {
    let name = AppName::new("wordcount");
    assert_eq!(serde_json::to_string(&name).unwrap(), r#""wordcount""#);
    let back: AppName = serde_json::from_str(r#""wordcount""#).unwrap();
    assert_eq!(back, name);
}
