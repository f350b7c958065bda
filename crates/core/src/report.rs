// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Submitted breakpoint report payloads.
//!
//! The wire shape is fixed by the breakpoint scripts baked into cloud-init:
//! a two-level JSON object with a `processData` section describing the
//! reporting process and a `userData` section carrying arbitrary collected
//! variables. Beyond validation the body stays opaque.

use crate::breakpoint::{split_tags, TERMINAL_TAGS};
use serde::{Deserialize, Serialize};

/// Fixed process-identification section of a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessData {
    #[serde(rename = "infraID")]
    pub infra_id: String,
    #[serde(rename = "infraName")]
    pub infra_name: String,
    #[serde(rename = "nodeID")]
    pub node_id: String,
    #[serde(rename = "nodeName")]
    pub node_name: String,
    /// Whitespace-separated tag tokens; may be empty.
    #[serde(rename = "bpTag")]
    pub bp_tag: String,
}

/// A validated submit/refresh payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakpointReport {
    #[serde(rename = "processData")]
    pub process_data: ProcessData,
    /// Collected variables; `nodeIP` is required, the rest is free-form.
    #[serde(rename = "userData")]
    pub user_data: serde_json::Map<String, serde_json::Value>,
}

impl BreakpointReport {
    pub fn tags(&self) -> Vec<String> {
        split_tags(&self.process_data.bp_tag)
    }

    /// True when the tag set contains a terminal marker.
    pub fn is_terminal(&self) -> bool {
        self.tags().iter().any(|t| TERMINAL_TAGS.contains(&t.as_str()))
    }

    pub fn node_ip(&self) -> &str {
        self.user_data.get("nodeIP").and_then(|v| v.as_str()).unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
