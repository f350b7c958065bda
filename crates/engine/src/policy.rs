// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-selection policies.

use ms_core::{MacrostepLabel, ProcessId, ProcessRecord, StateVector};

/// ABC selection for automatic exploration.
///
/// Processes are visited in stable (type-name, process-id) order; the
/// first non-finished process whose hypothetical next global state has
/// not been traversed yet is chosen. When every hypothetical state is
/// known the first non-finished process is returned, which can only
/// happen when the current node's child set is complete and exhaustion
/// will propagate on the next insert.
///
/// `processes` must be in canonical order (as the store returns them);
/// `traversed` holds the state vectors of the current node's children.
pub fn select_abc(
    processes: &[ProcessRecord],
    current: &StateVector,
    traversed: &[StateVector],
) -> Option<ProcessId> {
    let unfinished: Vec<&ProcessRecord> = processes.iter().filter(|p| !p.finished).collect();
    match unfinished.as_slice() {
        [] => return None,
        [only] => return Some(only.process_id.clone()),
        _ => {}
    }

    let mut ordinal = 0usize;
    let mut prev_name: Option<&str> = None;
    for row in processes {
        if prev_name == Some(row.name.as_str()) {
            ordinal += 1;
        } else {
            ordinal = 0;
            prev_name = Some(row.name.as_str());
        }
        if row.finished {
            continue;
        }
        let Some(hypothetical) = current.increment(&row.name, ordinal) else {
            continue;
        };
        if !traversed.contains(&hypothetical) {
            return Some(row.process_id.clone());
        }
    }
    unfinished.first().map(|p| p.process_id.clone())
}

/// Resolve the process a replay step must permit: the `ordinal`-th
/// process (in id order) of the labeled type.
pub fn process_for_slot(
    processes: &[ProcessRecord],
    label: &MacrostepLabel,
) -> Option<ProcessId> {
    processes
        .iter()
        .filter(|p| p.name == label.process_type)
        .nth(label.ordinal)
        .map(|p| p.process_id.clone())
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;
