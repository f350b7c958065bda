// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The execution-tree storage seam.

use async_trait::async_trait;
use ms_core::{AppName, CollectiveBreakpoint, MacrostepLabel, NodeId};

/// Execution-tree failure modes.
///
/// `Transport`/`Backend` are External errors in the session taxonomy: the
/// in-progress step fails and the instance is torn down. `Integrity`
/// means a tree invariant would be violated and is fatal for the session.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    #[error("collective breakpoint \"{0}\" does not exist")]
    UnknownNode(NodeId),
    #[error("no root collective breakpoint exists for application \"{0}\"")]
    NoRoot(AppName),
    #[error("\"{target}\" is not reachable from \"{current}\"")]
    NoPath { current: NodeId, target: NodeId },
    #[error("execution-tree integrity violation: {0}")]
    Integrity(String),
    #[error("graph store request failed")]
    Transport(#[from] reqwest::Error),
    #[error("graph store rejected the request: {0}")]
    Backend(String),
}

/// Result of an insert-or-dedupe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Created(NodeId),
    /// A sibling with an identical state vector already existed; its id is
    /// returned and nothing was written.
    Existing(NodeId),
}

impl InsertOutcome {
    pub fn node_id(&self) -> &NodeId {
        match self {
            Self::Created(id) | Self::Existing(id) => id,
        }
    }

    pub fn created(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Durable graph of collective breakpoints and macrostep edges, keyed by
/// (application name, node id).
///
/// The two insert operations are transactions: sibling dedupe and the
/// parent-edge write happen atomically with the node write, so concurrent
/// sessions over one application cannot create duplicate siblings.
#[async_trait]
pub trait TreeStore: Send + Sync {
    /// Cheap connectivity probe, called at session start.
    async fn ping(&self) -> Result<(), TreeError>;

    /// Insert the root for an application, or adopt an existing one.
    async fn insert_root(&self, node: CollectiveBreakpoint) -> Result<InsertOutcome, TreeError>;

    /// Insert a child node with its labeled macrostep edge, deduplicating
    /// against siblings by state vector.
    async fn insert_child(
        &self,
        node: CollectiveBreakpoint,
        label: MacrostepLabel,
    ) -> Result<InsertOutcome, TreeError>;

    async fn node(
        &self,
        app: &AppName,
        id: &NodeId,
    ) -> Result<Option<CollectiveBreakpoint>, TreeError>;

    /// Replace a node's mutable attributes (exhausted flag, visits,
    /// collected data, evaluations).
    async fn update_node(&self, node: &CollectiveBreakpoint) -> Result<(), TreeError>;

    async fn children(
        &self,
        app: &AppName,
        parent: &NodeId,
    ) -> Result<Vec<CollectiveBreakpoint>, TreeError>;

    async fn find_root(&self, app: &AppName) -> Result<Option<CollectiveBreakpoint>, TreeError>;

    /// Label of the macrostep edge pointing at `child`, if any.
    async fn edge_label(
        &self,
        app: &AppName,
        child: &NodeId,
    ) -> Result<Option<MacrostepLabel>, TreeError>;
}
