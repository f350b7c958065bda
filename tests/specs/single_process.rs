// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-process, two-breakpoint application: the whole state space is
//! one path, and one automatic traversal exhausts it.

use super::support::{app_name, scenario};
use ms_adapters::FakeProcessSpec;
use ms_core::NodeKind;

#[tokio::test]
async fn one_traversal_exhausts_the_tree() {
    let s = scenario(vec![FakeProcessSpec::new("a", 1, 2)]);
    s.session.automatic().await.unwrap();

    let root = s.tree.root_id(&app_name()).await.unwrap();
    let root_node = s.tree.node(&app_name(), &root).await.unwrap();
    assert_eq!(root_node.kind, NodeKind::Root);
    assert!(root_node.exhausted);

    let children = s.tree.children(&app_name(), &root).await.unwrap();
    assert_eq!(children.len(), 1);
    let leaf = &children[0];
    assert_eq!(leaf.kind, NodeKind::Final);
    assert!(leaf.exhausted);
    assert_eq!(serde_json::to_string(&leaf.state).unwrap(), r#"{"a":[2]}"#);

    // One instance sufficed and was finalized.
    let instances = s.store.instances();
    assert_eq!(instances.len(), 1);
    assert!(instances[0].finished);

    // Ancestor-chain length equals total local breakpoints minus the
    // process count: 2 - 1 = 1.
    assert_eq!(leaf.parent.as_ref(), Some(&root));
}

#[tokio::test]
async fn terminal_tag_at_first_breakpoint_finishes_without_steps() {
    let s = scenario(vec![FakeProcessSpec::new("a", 1, 1)]);
    s.session.automatic().await.unwrap();

    // The root itself is the final state: no child was ever created and
    // exploration stops after a single instance.
    let root = s.tree.root_id(&app_name()).await.unwrap();
    let children = s.tree.children(&app_name(), &root).await.unwrap();
    assert!(children.is_empty());
    assert_eq!(s.store.instances().len(), 1);
    assert!(s.store.instances()[0].finished);
}
