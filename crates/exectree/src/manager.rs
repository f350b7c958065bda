// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution-tree operations over a [`TreeStore`].

use crate::store::{InsertOutcome, TreeError, TreeStore};
use ms_core::{
    AppName, CollectedSample, CollectiveBreakpoint, EvaluationRecord, InstanceId, NodeId,
    NodeKind, StateVector,
};
use std::sync::Arc;

/// Creates, classifies, and walks collective breakpoints.
#[derive(Clone)]
pub struct TreeManager {
    store: Arc<dyn TreeStore>,
}

impl TreeManager {
    pub fn new(store: Arc<dyn TreeStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn TreeStore> {
        &self.store
    }

    /// Verify the tree store is reachable before the session mutates
    /// anything.
    pub async fn ping(&self) -> Result<(), TreeError> {
        self.store.ping().await
    }

    async fn node_required(
        &self,
        app: &AppName,
        id: &NodeId,
    ) -> Result<CollectiveBreakpoint, TreeError> {
        self.store
            .node(app, id)
            .await?
            .ok_or_else(|| TreeError::UnknownNode(id.clone()))
    }

    /// Create the application's root for the given root-state vector, or
    /// adopt the root that is already stored (at most one root exists per
    /// application). Returns the root id and whether it was created now.
    pub async fn ensure_root(
        &self,
        app: &AppName,
        vector: &StateVector,
    ) -> Result<(NodeId, bool), TreeError> {
        let node =
            CollectiveBreakpoint::new(app.clone(), vector.clone(), None, NodeKind::Root);
        match self.store.insert_root(node).await? {
            InsertOutcome::Created(id) => {
                tracing::info!(%app, root = %id, "root collective breakpoint created");
                Ok((id, true))
            }
            InsertOutcome::Existing(id) => {
                tracing::debug!(%app, root = %id, "adopting existing root collective breakpoint");
                Ok((id, false))
            }
        }
    }

    /// Insert-or-dedupe the global state observed after a macrostep from
    /// `parent`. `unfinished` is the instance's current count of
    /// non-finished processes, which classifies the node.
    pub async fn record_state(
        &self,
        app: &AppName,
        parent: &NodeId,
        vector: &StateVector,
        unfinished: usize,
    ) -> Result<InsertOutcome, TreeError> {
        let parent_node = self.node_required(app, parent).await?;
        let label = parent_node.state.step_to(vector).ok_or_else(|| {
            TreeError::Integrity(format!(
                "state {vector} is not one macrostep after {}",
                parent_node.state
            ))
        })?;
        let kind = NodeKind::classify(unfinished);
        let node = CollectiveBreakpoint::new(
            app.clone(),
            vector.clone(),
            Some(parent.clone()),
            kind,
        );
        let outcome = self.store.insert_child(node, label.clone()).await?;
        match &outcome {
            InsertOutcome::Created(id) => {
                tracing::info!(%app, node = %id, %kind, step = %label, "new collective breakpoint");
            }
            InsertOutcome::Existing(id) => {
                tracing::info!(%app, node = %id, "state already exists in execution tree");
            }
        }
        Ok(outcome)
    }

    /// After a final state is reached, walk the path leaf→root and mark
    /// every ancestor whose continuations have all been observed.
    ///
    /// An ancestor is exhausted when all of its children are exhausted and
    /// it has as many children as branching choices, i.e. as slots of its
    /// vector that still differ from the final-state vector.
    pub async fn propagate_exhaustion(
        &self,
        app: &AppName,
        leaf: &NodeId,
        final_vector: &StateVector,
    ) -> Result<(), TreeError> {
        let mut leaf_node = self.node_required(app, leaf).await?;
        if !leaf_node.exhausted {
            leaf_node.exhausted = true;
            self.store.update_node(&leaf_node).await?;
        }

        let mut cursor = leaf_node.parent;
        while let Some(id) = cursor {
            let mut ancestor = self.node_required(app, &id).await?;
            if ancestor.exhausted {
                break;
            }
            let branching = ancestor.state.differing_slots(final_vector);
            let children = self.store.children(app, &ancestor.id).await?;
            let all_children_exhausted = children.iter().all(|c| c.exhausted);
            if children.len() != branching || !all_children_exhausted {
                tracing::debug!(%app, node = %ancestor.id, "exhaustion stops: unexplored continuations remain");
                break;
            }
            ancestor.exhausted = true;
            self.store.update_node(&ancestor).await?;
            tracing::info!(%app, node = %ancestor.id, kind = %ancestor.kind, "collective breakpoint exhausted");
            if ancestor.kind == NodeKind::Root {
                break;
            }
            cursor = ancestor.parent;
        }
        Ok(())
    }

    /// First non-exhausted ancestor walking from `node` toward the root,
    /// or `None` when even the root is exhausted.
    pub async fn closest_non_exhausted_ancestor(
        &self,
        app: &AppName,
        node: &NodeId,
    ) -> Result<Option<NodeId>, TreeError> {
        let mut cursor = self.node_required(app, node).await?.parent;
        while let Some(id) = cursor {
            let ancestor = self.node_required(app, &id).await?;
            if !ancestor.exhausted {
                return Ok(Some(ancestor.id));
            }
            if ancestor.kind == NodeKind::Root {
                return Ok(None);
            }
            cursor = ancestor.parent;
        }
        Ok(None)
    }

    /// The immediate child of `current` on the path to `target`, or `None`
    /// when the two are the same node.
    pub async fn next_hop(
        &self,
        app: &AppName,
        current: &NodeId,
        target: &NodeId,
    ) -> Result<Option<NodeId>, TreeError> {
        if current == target {
            return Ok(None);
        }
        let mut hop = target.clone();
        let mut cursor = self.node_required(app, target).await?.parent;
        while let Some(id) = cursor {
            if &id == current {
                return Ok(Some(hop));
            }
            let node = self.node_required(app, &id).await?;
            hop = id;
            cursor = node.parent;
        }
        Err(TreeError::NoPath { current: current.clone(), target: target.clone() })
    }

    pub async fn node_exists(&self, app: &AppName, id: &NodeId) -> Result<bool, TreeError> {
        Ok(self.store.node(app, id).await?.is_some())
    }

    pub async fn node(
        &self,
        app: &AppName,
        id: &NodeId,
    ) -> Result<CollectiveBreakpoint, TreeError> {
        self.node_required(app, id).await
    }

    pub async fn node_vector(&self, app: &AppName, id: &NodeId) -> Result<StateVector, TreeError> {
        Ok(self.node_required(app, id).await?.state)
    }

    pub async fn children(
        &self,
        app: &AppName,
        parent: &NodeId,
    ) -> Result<Vec<CollectiveBreakpoint>, TreeError> {
        self.store.children(app, parent).await
    }

    pub async fn is_root_exhausted(&self, app: &AppName) -> Result<bool, TreeError> {
        Ok(self.store.find_root(app).await?.map(|r| r.exhausted).unwrap_or(false))
    }

    pub async fn root_id(&self, app: &AppName) -> Result<NodeId, TreeError> {
        Ok(self
            .store
            .find_root(app)
            .await?
            .ok_or_else(|| TreeError::NoRoot(app.clone()))?
            .id)
    }

    /// Record a visiting instance and its collected samples at a node.
    pub async fn attach_visit(
        &self,
        app: &AppName,
        node: &NodeId,
        instance: &InstanceId,
        samples: Vec<CollectedSample>,
    ) -> Result<(), TreeError> {
        let mut row = self.node_required(app, node).await?;
        if !row.instance_ids.contains(instance) {
            row.instance_ids.push(instance.clone());
        }
        row.collected.extend(samples);
        self.store.update_node(&row).await
    }

    /// Attach a specification-evaluation outcome to a node.
    pub async fn attach_evaluation(
        &self,
        app: &AppName,
        node: &NodeId,
        record: EvaluationRecord,
    ) -> Result<(), TreeError> {
        let mut row = self.node_required(app, node).await?;
        row.evaluations.push(record);
        self.store.update_node(&row).await
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
