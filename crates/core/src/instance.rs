// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Infrastructure instance records.

use crate::id::{AppName, InstanceId, NodeId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One live infrastructure deployment of an application.
///
/// Created when a session starts, finalized when every process reports its
/// terminal breakpoint, and destroyed through the orchestrator when the
/// session ends. The row itself is kept as part of the debugging record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub id: InstanceId,
    pub app_name: AppName,
    pub registered_at: DateTime<Utc>,
    /// Set once every process in the instance is finished.
    pub finished: bool,
    /// Collective breakpoint the instance currently sits at.
    pub current_node: Option<NodeId>,
    /// Marks a freerun session: breakpoints are collected but the instance
    /// is never recorded in the execution tree.
    pub freerun: bool,
}

impl Instance {
    pub fn new(id: InstanceId, app_name: AppName, registered_at: DateTime<Utc>) -> Self {
        Self { id, app_name, registered_at, finished: false, current_node: None, freerun: false }
    }
}
