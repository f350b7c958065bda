// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized tables built from journal replay.

mod apps;
mod breakpoints;
mod instances;
mod processes;

use ms_core::StoreEvent;
use ms_core::{Application, BreakpointRecord, Instance, InstanceId, ProcessId, ProcessRecord};
use std::collections::HashMap;

const EMPTY_PROCESSES: &[ProcessRecord] = &[];
const EMPTY_BREAKPOINTS: &[BreakpointRecord] = &[];

/// The four logical tables of the instance store.
#[derive(Debug, Default)]
pub(crate) struct MaterializedState {
    pub apps: HashMap<String, Application>,
    pub instances: HashMap<String, Instance>,
    /// instance id → process rows, kept in canonical (name, process-id)
    /// order.
    pub processes: HashMap<String, Vec<ProcessRecord>>,
    /// "instance/process" → ordered breakpoint log.
    pub breakpoints: HashMap<String, Vec<BreakpointRecord>>,
}

pub(crate) fn log_key(instance: &InstanceId, process: &ProcessId) -> String {
    format!("{instance}/{process}")
}

impl MaterializedState {
    pub fn processes(&self, instance: &InstanceId) -> &[ProcessRecord] {
        self.processes.get(instance.as_str()).map(Vec::as_slice).unwrap_or(EMPTY_PROCESSES)
    }

    pub fn process(&self, instance: &InstanceId, process: &ProcessId) -> Option<&ProcessRecord> {
        self.processes(instance).iter().find(|p| &p.process_id == process)
    }

    pub fn breakpoints(&self, instance: &InstanceId, process: &ProcessId) -> &[BreakpointRecord] {
        self.breakpoints
            .get(&log_key(instance, process))
            .map(Vec::as_slice)
            .unwrap_or(EMPTY_BREAKPOINTS)
    }

    pub fn last_breakpoint_num(&self, instance: &InstanceId, process: &ProcessId) -> u32 {
        self.breakpoints(instance, process).last().map(|r| r.bp_num).unwrap_or(0)
    }

    /// Verify the replayed log: every process's breakpoint numbers must be
    /// the contiguous sequence 1..=curr_bp.
    pub fn check_log_integrity(&self) -> Result<(), String> {
        for rows in self.processes.values() {
            for row in rows {
                let log = self.breakpoints(&row.instance_id, &row.process_id);
                if log.len() != row.curr_bp as usize {
                    return Err(format!(
                        "{}/{}: {} log entries for a process at breakpoint #{}",
                        row.instance_id,
                        row.process_id,
                        log.len(),
                        row.curr_bp
                    ));
                }
                for (idx, record) in log.iter().enumerate() {
                    if record.bp_num != idx as u32 + 1 {
                        return Err(format!(
                            "{}/{}: breakpoint #{} recorded at position {}",
                            row.instance_id,
                            row.process_id,
                            record.bp_num,
                            idx + 1
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Apply an event to the tables.
///
/// Handlers must be idempotent: journal replay may revisit a tail segment
/// after an interrupted run. Use assignment instead of mutation and guard
/// inserts with existence checks.
pub(crate) fn apply(state: &mut MaterializedState, event: &StoreEvent) {
    match event {
        StoreEvent::ApplicationRegistered { .. }
        | StoreEvent::AppRootNodeSet { .. }
        | StoreEvent::AppCurrentNodeSet { .. } => apps::apply(state, event),

        StoreEvent::InstanceRegistered { .. }
        | StoreEvent::InstanceCurrentNodeSet { .. }
        | StoreEvent::InstanceFinished { .. }
        | StoreEvent::FreerunSet { .. } => instances::apply(state, event),

        StoreEvent::ProcessRegistered { .. }
        | StoreEvent::ProcessAdvanced { .. }
        | StoreEvent::ProcessFinished { .. }
        | StoreEvent::PermitSet { .. }
        | StoreEvent::ProcessRefreshed { .. } => processes::apply(state, event),

        StoreEvent::BreakpointRecorded { .. } => breakpoints::apply(state, event),
    }
}
