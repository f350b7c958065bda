// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only breakpoint log entries.

use crate::id::{InstanceId, ProcessId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tag tokens that mark a process's terminal breakpoint.
pub const TERMINAL_TAGS: [&str; 2] = ["last", "last_bp"];

/// Split a raw `bpTag` string into its whitespace-separated tokens.
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_string).collect()
}

/// One report from a process, as appended to the breakpoint log.
///
/// For a given (instance, process) the `bp_num` sequence is 1,2,3… with no
/// gaps and no reordering; the store refuses anything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakpointRecord {
    pub instance_id: InstanceId,
    pub process_id: ProcessId,
    pub bp_num: u32,
    pub recorded_at: DateTime<Utc>,
    pub tags: Vec<String>,
    /// The submitted payload, kept opaque once validated.
    pub payload: serde_json::Value,
}

impl BreakpointRecord {
    pub fn is_terminal(&self) -> bool {
        self.tags.iter().any(|t| TERMINAL_TAGS.contains(&t.as_str()))
    }
}
