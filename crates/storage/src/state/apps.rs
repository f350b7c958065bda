// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Application table handlers.

use super::MaterializedState;
use ms_core::StoreEvent;

pub(crate) fn apply(state: &mut MaterializedState, event: &StoreEvent) {
    match event {
        StoreEvent::ApplicationRegistered { app } => {
            if !state.apps.contains_key(app.name.as_str()) {
                state.apps.insert(app.name.to_string(), app.clone());
            }
        }
        StoreEvent::AppRootNodeSet { app, node } => {
            if let Some(row) = state.apps.get_mut(app.as_str()) {
                row.root_node = Some(node.clone());
            }
        }
        StoreEvent::AppCurrentNodeSet { app, node } => {
            if let Some(row) = state.apps.get_mut(app.as_str()) {
                row.current_node = Some(node.clone());
            }
        }
        _ => {}
    }
}
