// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registered application records.

use crate::id::{AppName, NodeId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Which orchestrator manages the application's infrastructure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrchestratorKind {
    Occopus,
    Terraform,
}

impl OrchestratorKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "occopus" => Some(Self::Occopus),
            "terraform" => Some(Self::Terraform),
            _ => None,
        }
    }
}

impl fmt::Display for OrchestratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Occopus => write!(f, "occopus"),
            Self::Terraform => write!(f, "terraform"),
        }
    }
}

/// Graph-store connection credentials from the application descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphAuth {
    pub host: String,
    pub user: String,
    pub password: String,
}

/// A registered, descriptor-defined debuggable program.
///
/// Immutable after registration except for the two execution-tree pointers
/// (`root_node`, `current_node`), which track where the application's tree
/// exploration stands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub name: AppName,
    pub orchestrator: OrchestratorKind,
    /// Base URL of the orchestrator's REST endpoint.
    pub orchestrator_url: String,
    /// Infrastructure descriptor: a file (Occopus) or a folder (Terraform).
    pub infra_descriptor: PathBuf,
    /// Path of the application descriptor this row was registered from.
    pub descriptor_path: PathBuf,
    /// Sorted set of process-type names declared by the infrastructure
    /// descriptor.
    pub process_types: Vec<String>,
    pub graph_auth: GraphAuth,
    pub root_node: Option<NodeId>,
    pub current_node: Option<NodeId>,
    pub registered_at: DateTime<Utc>,
}
