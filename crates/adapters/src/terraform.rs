// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Terraform adapter.
//!
//! The infrastructure descriptor is a configuration folder. Process-type
//! names are enumerated in the first line of its `mstep_locals.tf` file
//! as a `#`-prefixed comma-separated list; instance lifecycle goes
//! through the configured Terraform service endpoint, which follows the
//! same REST contract as the Occopus one.

use crate::orchestrator::{Orchestrator, OrchestratorError};
use crate::OccopusAdapter;
use async_trait::async_trait;
use ms_core::{Application, InstanceId};
use ms_storage::InstanceStore;
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const LOCALS_FILE: &str = "mstep_locals.tf";

pub struct TerraformAdapter {
    lifecycle: OccopusAdapter,
}

impl TerraformAdapter {
    pub fn new(client: reqwest::Client, poll_interval: Duration) -> Self {
        Self { lifecycle: OccopusAdapter::new(client, poll_interval) }
    }
}

#[async_trait]
impl Orchestrator for TerraformAdapter {
    async fn start(&self, app: &Application) -> Result<InstanceId, OrchestratorError> {
        self.lifecycle.start(app).await
    }

    async fn destroy(
        &self,
        app: &Application,
        instance: &InstanceId,
    ) -> Result<(), OrchestratorError> {
        self.lifecycle.destroy(app, instance).await
    }

    async fn check_processes(
        &self,
        app: &Application,
        instance: &InstanceId,
        store: &InstanceStore,
        cancel: &CancellationToken,
    ) -> Result<(), OrchestratorError> {
        self.lifecycle.check_processes(app, instance, store, cancel).await
    }

    fn validate(&self, descriptor: &Path) -> bool {
        descriptor.is_dir() && descriptor.join(LOCALS_FILE).is_file()
    }

    fn process_types(&self, descriptor: &Path) -> Result<Vec<String>, OrchestratorError> {
        let locals = descriptor.join(LOCALS_FILE);
        if !locals.is_file() {
            return Err(OrchestratorError::InvalidDescriptor(descriptor.to_path_buf()));
        }
        let raw = std::fs::read_to_string(&locals)?;
        let first = raw.lines().next().unwrap_or_default();
        let mut names: Vec<String> = first
            .trim_start_matches('#')
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        names.sort();
        names.dedup();
        if names.is_empty() {
            return Err(OrchestratorError::InvalidDescriptor(descriptor.to_path_buf()));
        }
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> TerraformAdapter {
        TerraformAdapter::new(reqwest::Client::new(), Duration::from_millis(10))
    }

    #[test]
    fn process_types_come_from_the_locals_header() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(LOCALS_FILE), "#worker, master,worker\nlocals {}\n")
            .unwrap();
        let adapter = adapter();
        assert_eq!(adapter.process_types(dir.path()).unwrap(), vec!["master", "worker"]);
        assert!(adapter.validate(dir.path()));
    }

    #[test]
    fn folder_without_locals_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = adapter();
        assert!(!adapter.validate(dir.path()));
        assert!(matches!(
            adapter.process_types(dir.path()),
            Err(OrchestratorError::InvalidDescriptor(_))
        ));
    }
}
