// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Instance table handlers.

use super::MaterializedState;
use ms_core::StoreEvent;

pub(crate) fn apply(state: &mut MaterializedState, event: &StoreEvent) {
    match event {
        StoreEvent::InstanceRegistered { instance } => {
            if !state.instances.contains_key(instance.id.as_str()) {
                state.instances.insert(instance.id.to_string(), instance.clone());
            }
        }
        StoreEvent::InstanceCurrentNodeSet { instance, node } => {
            if let Some(row) = state.instances.get_mut(instance.as_str()) {
                row.current_node = Some(node.clone());
            }
        }
        StoreEvent::InstanceFinished { instance } => {
            if let Some(row) = state.instances.get_mut(instance.as_str()) {
                row.finished = true;
            }
        }
        StoreEvent::FreerunSet { instance, freerun } => {
            if let Some(row) = state.instances.get_mut(instance.as_str()) {
                row.freerun = *freerun;
            }
        }
        _ => {}
    }
}
