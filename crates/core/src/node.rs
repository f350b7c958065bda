// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Collective breakpoints: the nodes of the execution tree.

use crate::id::{AppName, InstanceId, NodeId, ProcessId};
use crate::state_vector::StateVector;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Node classification, determined by the number of non-finished processes
/// at the recorded global state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Root,
    /// Exactly one process can still move: the continuation is forced.
    Deterministic,
    /// Two or more processes can move: a branching point.
    Alternative,
    /// Every process is finished.
    Final,
}

impl NodeKind {
    /// Classify a non-root node by its count of non-finished processes.
    pub fn classify(unfinished: usize) -> Self {
        match unfinished {
            0 => Self::Final,
            1 => Self::Deterministic,
            _ => Self::Alternative,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => write!(f, "root"),
            Self::Deterministic => write!(f, "deterministic"),
            Self::Alternative => write!(f, "alternative"),
            Self::Final => write!(f, "final"),
        }
    }
}

/// One process's collected variables at a node, sampled when a visiting
/// instance reached the state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectedSample {
    pub instance_id: InstanceId,
    pub process_name: String,
    /// Zero-based ordinal of the process within its type.
    pub ordinal: usize,
    pub process_id: ProcessId,
    pub bp_num: u32,
    pub user_data: serde_json::Map<String, serde_json::Value>,
}

/// Outcome of evaluating the application specification against one
/// instance's samples at a node. Per-variable verdicts are `None` when the
/// variable could not be evaluated (missing from the collected data).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub instance_id: InstanceId,
    /// type name → per-ordinal map of variable → verdict.
    pub variables: BTreeMap<String, Vec<BTreeMap<String, Option<bool>>>>,
    /// Verdict of the global boolean expression, if one was evaluable.
    pub global: Option<bool>,
}

/// One distinct global state of one application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectiveBreakpoint {
    pub id: NodeId,
    pub app_name: AppName,
    pub state: StateVector,
    /// Empty for the root.
    pub parent: Option<NodeId>,
    pub kind: NodeKind,
    /// Every execution-path continuation from this node has been observed.
    pub exhausted: bool,
    /// Instances that have visited this state.
    pub instance_ids: Vec<InstanceId>,
    pub collected: Vec<CollectedSample>,
    pub evaluations: Vec<EvaluationRecord>,
}

impl CollectiveBreakpoint {
    /// A freshly classified node; final nodes are born exhausted.
    pub fn new(
        app_name: AppName,
        state: StateVector,
        parent: Option<NodeId>,
        kind: NodeKind,
    ) -> Self {
        Self {
            id: NodeId::generate(),
            app_name,
            state,
            parent,
            kind,
            exhausted: kind == NodeKind::Final,
            instance_ids: Vec::new(),
            collected: Vec::new(),
            evaluations: Vec::new(),
        }
    }
}

#[cfg(test)]
#[path = "node_tests.rs"]
mod tests;
