// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    final_state = { 0, NodeKind::Final },
    deterministic = { 1, NodeKind::Deterministic },
    alternative_two = { 2, NodeKind::Alternative },
    alternative_many = { 7, NodeKind::Alternative },
)]
fn classification_by_unfinished_count(unfinished: usize, expected: NodeKind) {
    assert_eq!(NodeKind::classify(unfinished), expected);
}

#[test]
fn final_nodes_are_born_exhausted() {
    let node = CollectiveBreakpoint::new(
        AppName::new("app"),
        StateVector::default(),
        Some(NodeId::new("parent")),
        NodeKind::Final,
    );
    assert!(node.exhausted);

    let node = CollectiveBreakpoint::new(
        AppName::new("app"),
        StateVector::default(),
        None,
        NodeKind::Root,
    );
    assert!(!node.exhausted);
}

#[test]
fn kind_serializes_lowercase() {
    assert_eq!(serde_json::to_string(&NodeKind::Alternative).unwrap(), r#""alternative""#);
    assert_eq!(NodeKind::Root.to_string(), "root");
}
