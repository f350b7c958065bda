// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory tree store.

use crate::store::{InsertOutcome, TreeError, TreeStore};
use async_trait::async_trait;
use ms_core::{AppName, CollectiveBreakpoint, MacrostepLabel, NodeId, NodeKind};
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Default)]
struct Graph {
    /// (app name, node id) → node.
    nodes: HashMap<(String, String), CollectiveBreakpoint>,
    /// (app name, child id) → incoming edge label.
    labels: HashMap<(String, String), MacrostepLabel>,
}

/// Tree store backed by process memory. Used by tests and by sessions
/// whose descriptor selects the embedded tree.
#[derive(Default)]
pub struct MemoryTreeStore {
    graph: Mutex<Graph>,
}

impl MemoryTreeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn key(app: &AppName, id: &NodeId) -> (String, String) {
    (app.to_string(), id.to_string())
}

#[async_trait]
impl TreeStore for MemoryTreeStore {
    async fn ping(&self) -> Result<(), TreeError> {
        Ok(())
    }

    async fn insert_root(&self, node: CollectiveBreakpoint) -> Result<InsertOutcome, TreeError> {
        let mut graph = self.graph.lock();
        let existing = graph
            .nodes
            .values()
            .find(|n| n.app_name == node.app_name && n.kind == NodeKind::Root);
        if let Some(root) = existing {
            return Ok(InsertOutcome::Existing(root.id.clone()));
        }
        let id = node.id.clone();
        graph.nodes.insert(key(&node.app_name, &node.id), node);
        Ok(InsertOutcome::Created(id))
    }

    async fn insert_child(
        &self,
        node: CollectiveBreakpoint,
        label: MacrostepLabel,
    ) -> Result<InsertOutcome, TreeError> {
        let parent = node
            .parent
            .clone()
            .ok_or_else(|| TreeError::Integrity("child node without a parent".into()))?;
        let mut graph = self.graph.lock();
        if !graph.nodes.contains_key(&key(&node.app_name, &parent)) {
            return Err(TreeError::UnknownNode(parent));
        }
        // Dedupe and insert under one lock: racing sessions cannot both
        // create the same sibling.
        let sibling = graph
            .nodes
            .values()
            .find(|n| {
                n.app_name == node.app_name
                    && n.parent.as_ref() == Some(&parent)
                    && n.state == node.state
            })
            .map(|n| n.id.clone());
        if let Some(id) = sibling {
            return Ok(InsertOutcome::Existing(id));
        }
        let id = node.id.clone();
        graph.labels.insert(key(&node.app_name, &id), label);
        graph.nodes.insert(key(&node.app_name, &id), node);
        Ok(InsertOutcome::Created(id))
    }

    async fn node(
        &self,
        app: &AppName,
        id: &NodeId,
    ) -> Result<Option<CollectiveBreakpoint>, TreeError> {
        Ok(self.graph.lock().nodes.get(&key(app, id)).cloned())
    }

    async fn update_node(&self, node: &CollectiveBreakpoint) -> Result<(), TreeError> {
        let mut graph = self.graph.lock();
        let slot = graph
            .nodes
            .get_mut(&key(&node.app_name, &node.id))
            .ok_or_else(|| TreeError::UnknownNode(node.id.clone()))?;
        *slot = node.clone();
        Ok(())
    }

    async fn children(
        &self,
        app: &AppName,
        parent: &NodeId,
    ) -> Result<Vec<CollectiveBreakpoint>, TreeError> {
        let graph = self.graph.lock();
        let mut children: Vec<CollectiveBreakpoint> = graph
            .nodes
            .values()
            .filter(|n| n.app_name == *app && n.parent.as_ref() == Some(parent))
            .cloned()
            .collect();
        children.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(children)
    }

    async fn find_root(&self, app: &AppName) -> Result<Option<CollectiveBreakpoint>, TreeError> {
        Ok(self
            .graph
            .lock()
            .nodes
            .values()
            .find(|n| n.app_name == *app && n.kind == NodeKind::Root)
            .cloned())
    }

    async fn edge_label(
        &self,
        app: &AppName,
        child: &NodeId,
    ) -> Result<Option<MacrostepLabel>, TreeError> {
        Ok(self.graph.lock().labels.get(&key(app, child)).cloned())
    }
}
