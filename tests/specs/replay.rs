// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Replay: a fresh instance is driven along the recorded path with one
//! permit per macrostep.

use super::support::{app_name, scenario};
use ms_adapters::FakeProcessSpec;
use ms_core::NodeId;

/// Walk the only path root -> X -> Y -> Z of a tree built from one
/// a-step followed by two b-steps.
async fn build_path(s: &super::support::Scenario) -> Vec<NodeId> {
    s.session
        .manual(|rows| {
            rows.iter()
                .find(|p| !p.finished)
                .map(|p| p.process_id.clone())
        })
        .await
        .unwrap();

    let mut path = vec![s.tree.root_id(&app_name()).await.unwrap()];
    loop {
        let children = s
            .tree
            .children(&app_name(), path.last().unwrap())
            .await
            .unwrap();
        match children.as_slice() {
            [] => break,
            [only] => path.push(only.id.clone()),
            _ => panic!("expected a single path"),
        }
    }
    path
}

#[tokio::test]
async fn replay_to_depth_three_issues_three_permits() {
    let s = scenario(vec![
        FakeProcessSpec::new("a", 1, 2),
        FakeProcessSpec::new("b", 1, 3),
    ]);
    let path = build_path(&s).await;
    // root -> {a stepped} -> {b stepped} -> {b stepped, final}
    assert_eq!(path.len(), 4);
    let target = path[3].clone();

    let instance = s.session.replay(&target, true, None).await.unwrap();
    let row = s.store.instance(&instance).unwrap();
    assert_eq!(row.current_node.as_ref(), Some(&target));

    // Exactly depth(target) macrosteps ran: total local breakpoints
    // advanced equals 3 (each permit advances one process by one).
    let advanced: u32 = s
        .store
        .processes(&instance)
        .unwrap()
        .iter()
        .map(|p| p.curr_bp - 1)
        .sum();
    assert_eq!(advanced, 3);

    // Every edge on the path names exactly one process slot.
    let mut labels = Vec::new();
    for node in &path[1..] {
        let label = s
            .tree
            .store()
            .edge_label(&app_name(), node)
            .await
            .unwrap()
            .unwrap();
        labels.push(label.to_string());
    }
    assert_eq!(labels, vec!["a[1]", "b[1]", "b[1]"]);
}

#[tokio::test]
async fn replay_to_an_unknown_node_refuses_to_start() {
    let s = scenario(vec![FakeProcessSpec::new("a", 1, 2)]);
    s.session.automatic().await.unwrap();
    let err = s
        .session
        .replay(&NodeId::new("no-such-node"), false, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ms_engine::EngineError::UnknownNode(_)));
    // No extra instance was created for the failed replay.
    assert_eq!(s.store.instances().len(), 1);
}
