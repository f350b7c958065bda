// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine error taxonomy.
//!
//! Store/Tree/Orchestrator failures are External errors: the session
//! tears its instance down and surfaces them. Integrity variants are
//! fatal for the session. `Cancelled` is reported when a session stops at
//! a polling boundary on request.

use ms_adapters::OrchestratorError;
use ms_core::{InstanceId, NodeId};
use ms_descriptor::{DescriptorError, ExprError};
use ms_exectree::TreeError;
use ms_storage::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
    #[error(transparent)]
    Expr(#[from] ExprError),
    #[error("session cancelled")]
    Cancelled,
    #[error(
        "instance process types {observed:?} do not match the registered descriptor {expected:?}"
    )]
    TypeSetMismatch { expected: Vec<String>, observed: Vec<String> },
    #[error("instance \"{0}\" has no current collective breakpoint")]
    NoCurrentNode(InstanceId),
    #[error("collective breakpoint \"{0}\" does not exist in the execution tree")]
    UnknownNode(NodeId),
    #[error("no process left to step in instance \"{0}\"")]
    NoStepCandidate(InstanceId),
    #[error("no process chosen; aborting the session")]
    NoProcessChosen,
}

impl EngineError {
    /// True when the error is a cooperative cancellation rather than a
    /// failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            Self::Cancelled | Self::Orchestrator(OrchestratorError::Cancelled)
        )
    }
}
