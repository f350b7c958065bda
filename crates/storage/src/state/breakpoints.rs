// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Breakpoint log handlers.

use super::{log_key, MaterializedState};
use ms_core::StoreEvent;

pub(crate) fn apply(state: &mut MaterializedState, event: &StoreEvent) {
    if let StoreEvent::BreakpointRecorded { record } = event {
        let log = state
            .breakpoints
            .entry(log_key(&record.instance_id, &record.process_id))
            .or_default();
        // Idempotency: a replayed record never re-appends.
        if log.last().map(|r| r.bp_num).unwrap_or(0) < record.bp_num {
            log.push(record.clone());
        }
    }
}
