// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process (VM) rows and the permission ternary.

use crate::id::{InstanceId, ProcessId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single running process inside an instance.
///
/// `curr_bp` is monotonically non-decreasing and advances by exactly one
/// per acknowledged submit. `permit`, `finished`, and `refreshed` are the
/// three coordination flags of the permit/refresh handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub instance_id: InstanceId,
    pub process_id: ProcessId,
    /// Process-type name; several processes of an instance may share it.
    pub name: String,
    pub registered_at: DateTime<Utc>,
    pub public_ip: String,
    /// Current local breakpoint, 1-based.
    pub curr_bp: u32,
    pub permit: bool,
    pub finished: bool,
    pub refreshed: bool,
}

impl ProcessRecord {
    pub fn new(
        instance_id: InstanceId,
        process_id: ProcessId,
        name: impl Into<String>,
        public_ip: impl Into<String>,
        registered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            instance_id,
            process_id,
            name: name.into(),
            registered_at,
            public_ip: public_ip.into(),
            curr_bp: 1,
            permit: false,
            finished: false,
            refreshed: false,
        }
    }
}

/// Answer to a process's `next?` poll.
///
/// Maps to HTTP 200 / 204 / 205 on the permission endpoint. `Refresh`
/// means "you have not re-read your current breakpoint yet" and asks the
/// caller to issue a refresh before polling again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Go,
    Wait,
    Refresh,
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
