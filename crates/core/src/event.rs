// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Instance-store mutation events.
//!
//! Every write to the instance store is expressed as a [`StoreEvent`],
//! appended to the journal and applied to the materialized tables. Events
//! are facts about what happened; the tables are derived from them.
//! Handlers must stay idempotent: applying an event twice yields the same
//! state as applying it once (journal replay may revisit a tail segment).

use crate::application::Application;
use crate::breakpoint::BreakpointRecord;
use crate::id::{AppName, InstanceId, NodeId, ProcessId};
use crate::instance::Instance;
use crate::process::ProcessRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreEvent {
    ApplicationRegistered {
        app: Application,
    },
    AppRootNodeSet {
        app: AppName,
        node: NodeId,
    },
    AppCurrentNodeSet {
        app: AppName,
        node: NodeId,
    },
    InstanceRegistered {
        instance: Instance,
    },
    InstanceCurrentNodeSet {
        instance: InstanceId,
        node: NodeId,
    },
    InstanceFinished {
        instance: InstanceId,
    },
    FreerunSet {
        instance: InstanceId,
        freerun: bool,
    },
    ProcessRegistered {
        process: ProcessRecord,
    },
    BreakpointRecorded {
        record: BreakpointRecord,
    },
    /// The process acknowledged advancing to `bp`; clears its permit and
    /// refreshed flags.
    ProcessAdvanced {
        instance: InstanceId,
        process: ProcessId,
        bp: u32,
    },
    ProcessFinished {
        instance: InstanceId,
        process: ProcessId,
    },
    /// Grant permits to the listed processes and reset every process's
    /// refreshed flag in the instance.
    PermitSet {
        instance: InstanceId,
        processes: Vec<ProcessId>,
    },
    ProcessRefreshed {
        instance: InstanceId,
        process: ProcessId,
    },
}
