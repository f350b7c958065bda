// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Application descriptor loading and validation.

use crate::spec::Specification;
use ms_core::{GraphAuth, OrchestratorKind};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
    #[error("descriptor \"{0}\" does not exist")]
    NotFound(PathBuf),
    #[error("cannot read descriptor")]
    Io(#[from] std::io::Error),
    #[error("invalid descriptor YAML")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unknown orchestrator type \"{0}\"")]
    UnknownOrchestrator(String),
    #[error("orchestrator section \"{0}\" is missing")]
    MissingOrchestratorSection(&'static str),
    #[error("unknown exec-tree type \"{0}\"")]
    UnknownTreeStore(String),
    #[error("exec-tree auth section is required for type \"{0}\"")]
    MissingAuth(&'static str),
}

/// Which execution-tree store the application uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeStoreKind {
    /// A property-graph server reached over HTTP; requires `auth`.
    Neo4j,
    /// The embedded in-process tree; state lives only for the service's
    /// lifetime. Intended for local experiments.
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrchestratorSection {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    #[serde(default)]
    pub occopus: Option<OccopusSection>,
    #[serde(default)]
    pub terraform: Option<TerraformSection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OccopusSection {
    pub infra_file: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TerraformSection {
    pub infra_folder: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecTreeSection {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub auth: Option<GraphAuth>,
}

/// The parsed application descriptor.
#[derive(Debug, Clone, Deserialize)]
pub struct AppDescriptor {
    pub application_name: String,
    pub orchestrator: OrchestratorSection,
    #[serde(rename = "exec-tree")]
    pub exec_tree: ExecTreeSection,
    #[serde(default)]
    pub specification: Option<Specification>,
    #[serde(default)]
    pub specification_global: Option<String>,
}

impl AppDescriptor {
    /// Load and validate a descriptor file. A missing or malformed file
    /// refuses the session before anything is mutated.
    pub fn load(path: &Path) -> Result<Self, DescriptorError> {
        if !path.exists() {
            return Err(DescriptorError::NotFound(path.to_path_buf()));
        }
        let raw = std::fs::read_to_string(path)?;
        let descriptor: Self = serde_yaml::from_str(&raw)?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    fn validate(&self) -> Result<(), DescriptorError> {
        match self.orchestrator_kind()? {
            OrchestratorKind::Occopus if self.orchestrator.occopus.is_none() => {
                return Err(DescriptorError::MissingOrchestratorSection("occopus"));
            }
            OrchestratorKind::Terraform if self.orchestrator.terraform.is_none() => {
                return Err(DescriptorError::MissingOrchestratorSection("terraform"));
            }
            _ => {}
        }
        if self.tree_store_kind()? == TreeStoreKind::Neo4j && self.exec_tree.auth.is_none() {
            return Err(DescriptorError::MissingAuth("neo4j"));
        }
        Ok(())
    }

    pub fn orchestrator_kind(&self) -> Result<OrchestratorKind, DescriptorError> {
        OrchestratorKind::parse(&self.orchestrator.kind)
            .ok_or_else(|| DescriptorError::UnknownOrchestrator(self.orchestrator.kind.clone()))
    }

    pub fn tree_store_kind(&self) -> Result<TreeStoreKind, DescriptorError> {
        match self.exec_tree.kind.to_ascii_lowercase().as_str() {
            "neo4j" => Ok(TreeStoreKind::Neo4j),
            "memory" => Ok(TreeStoreKind::Memory),
            other => Err(DescriptorError::UnknownTreeStore(other.to_string())),
        }
    }

    /// The infrastructure descriptor path: a file for Occopus, a folder
    /// for Terraform.
    pub fn infra_descriptor(&self) -> Result<&Path, DescriptorError> {
        match self.orchestrator_kind()? {
            OrchestratorKind::Occopus => self
                .orchestrator
                .occopus
                .as_ref()
                .map(|s| s.infra_file.as_path())
                .ok_or(DescriptorError::MissingOrchestratorSection("occopus")),
            OrchestratorKind::Terraform => self
                .orchestrator
                .terraform
                .as_ref()
                .map(|s| s.infra_folder.as_path())
                .ok_or(DescriptorError::MissingOrchestratorSection("terraform")),
        }
    }

    /// Graph credentials, defaulted to empty for the embedded store.
    pub fn graph_auth(&self) -> GraphAuth {
        self.exec_tree.auth.clone().unwrap_or(GraphAuth {
            host: String::new(),
            user: String::new(),
            password: String::new(),
        })
    }
}

#[cfg(test)]
#[path = "descriptor_tests.rs"]
mod tests;
