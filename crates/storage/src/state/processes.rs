// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process table handlers.

use super::MaterializedState;
use ms_core::StoreEvent;

pub(crate) fn apply(state: &mut MaterializedState, event: &StoreEvent) {
    match event {
        StoreEvent::ProcessRegistered { process } => {
            let rows = state.processes.entry(process.instance_id.to_string()).or_default();
            if rows.iter().all(|p| p.process_id != process.process_id) {
                rows.push(process.clone());
                // Canonical order keeps state-vector ordinals stable.
                rows.sort_by(|a, b| {
                    (a.name.as_str(), a.process_id.as_str())
                        .cmp(&(b.name.as_str(), b.process_id.as_str()))
                });
            }
        }
        StoreEvent::ProcessAdvanced { instance, process, bp } => {
            if let Some(row) = row_mut(state, instance.as_str(), process.as_str()) {
                row.curr_bp = *bp;
                row.permit = false;
                row.refreshed = false;
            }
        }
        StoreEvent::ProcessFinished { instance, process } => {
            if let Some(row) = row_mut(state, instance.as_str(), process.as_str()) {
                row.finished = true;
            }
        }
        StoreEvent::PermitSet { instance, processes } => {
            if let Some(rows) = state.processes.get_mut(instance.as_str()) {
                for row in rows.iter_mut() {
                    row.refreshed = false;
                    if !row.finished && processes.iter().any(|p| p == &row.process_id) {
                        row.permit = true;
                    }
                }
            }
        }
        StoreEvent::ProcessRefreshed { instance, process } => {
            if let Some(row) = row_mut(state, instance.as_str(), process.as_str()) {
                row.refreshed = true;
            }
        }
        _ => {}
    }
}

fn row_mut<'a>(
    state: &'a mut MaterializedState,
    instance: &str,
    process: &str,
) -> Option<&'a mut ms_core::ProcessRecord> {
    state
        .processes
        .get_mut(instance)?
        .iter_mut()
        .find(|p| p.process_id.as_str() == process)
}
