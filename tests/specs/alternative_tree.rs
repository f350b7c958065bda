// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Two-process application with an alternative at the root: automatic
//! exploration traverses both interleavings and exhausts the tree.

use super::support::{app_name, scenario};
use ms_adapters::FakeProcessSpec;
use ms_core::{CollectiveBreakpoint, NodeKind};
use std::collections::BTreeSet;

#[tokio::test]
async fn both_interleavings_are_explored_and_exhausted() {
    let s = scenario(vec![
        FakeProcessSpec::new("a", 1, 2),
        FakeProcessSpec::new("b", 1, 2),
    ]);
    s.session.automatic().await.unwrap();

    let root = s.tree.root_id(&app_name()).await.unwrap();
    let root_node = s.tree.node(&app_name(), &root).await.unwrap();
    assert!(root_node.exhausted);
    assert_eq!(
        serde_json::to_string(&root_node.state).unwrap(),
        r#"{"a":[1],"b":[1]}"#
    );

    // The root offers the a-first and b-first macrosteps.
    let children = s.tree.children(&app_name(), &root).await.unwrap();
    assert_eq!(children.len(), 2);

    let mut edges = 0usize;
    let mut vectors = BTreeSet::new();
    let mut collect = |node: &CollectiveBreakpoint| {
        vectors.insert(serde_json::to_string(&node.state).unwrap());
    };
    collect(&root_node);
    for child in &children {
        assert_eq!(child.kind, NodeKind::Deterministic);
        assert!(child.exhausted);
        edges += 1;
        collect(child);
        let leaves = s.tree.children(&app_name(), &child.id).await.unwrap();
        assert_eq!(leaves.len(), 1);
        assert_eq!(leaves[0].kind, NodeKind::Final);
        assert!(leaves[0].exhausted);
        edges += 1;
        collect(&leaves[0]);
    }

    // Four distinct global states, four macrostep edges; the final
    // state {a:[2],b:[2]} is shared by both paths.
    assert_eq!(edges, 4);
    assert_eq!(
        vectors.into_iter().collect::<Vec<_>>(),
        vec![
            r#"{"a":[1],"b":[1]}"#,
            r#"{"a":[1],"b":[2]}"#,
            r#"{"a":[2],"b":[1]}"#,
            r#"{"a":[2],"b":[2]}"#,
        ]
    );

    // Depth-first: one instance per path.
    assert_eq!(s.store.instances().len(), 2);

    // Edge labels each name exactly one process slot.
    for child in &children {
        let label = s
            .tree
            .store()
            .edge_label(&app_name(), &child.id)
            .await
            .unwrap()
            .unwrap();
        assert!(label.to_string() == "a[1]" || label.to_string() == "b[1]");
    }
}

#[tokio::test]
async fn second_identical_traversal_creates_no_new_nodes() {
    // Insert-or-dedupe is idempotent: replaying the already-explored
    // path adds visits, not nodes.
    let s = scenario(vec![
        FakeProcessSpec::new("a", 1, 2),
        FakeProcessSpec::new("b", 1, 2),
    ]);
    s.session.automatic().await.unwrap();

    let root = s.tree.root_id(&app_name()).await.unwrap();
    let children = s.tree.children(&app_name(), &root).await.unwrap();
    let first = children[0].clone();
    let leaf = s.tree.children(&app_name(), &first.id).await.unwrap()[0].clone();

    s.session.replay(&leaf.id, false, None).await.unwrap();

    let children_after = s.tree.children(&app_name(), &root).await.unwrap();
    assert_eq!(children_after.len(), 2);
    let leaf_after = s
        .tree
        .children(&app_name(), &first.id)
        .await
        .unwrap()
        .into_iter()
        .next()
        .unwrap();
    assert_eq!(leaf_after.id, leaf.id);
    assert!(leaf_after.instance_ids.len() > leaf.instance_ids.len());
}
