// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Occopus adapter.
//!
//! Speaks the Occopus REST API: POST the infrastructure descriptor to
//! `/infrastructures/` to deploy, DELETE `/infrastructures/{id}` to tear
//! down, GET `/infrastructures/{id}` for per-VM status.

use crate::orchestrator::{Orchestrator, OrchestratorError};
use async_trait::async_trait;
use ms_core::{Application, InstanceId, ProcessId};
use ms_storage::InstanceStore;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub struct OccopusAdapter {
    client: reqwest::Client,
    poll_interval: Duration,
}

impl OccopusAdapter {
    pub fn new(client: reqwest::Client, poll_interval: Duration) -> Self {
        Self { client, poll_interval }
    }

    fn infrastructures_url(app: &Application) -> String {
        format!("{}/infrastructures/", app.orchestrator_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl Orchestrator for OccopusAdapter {
    async fn start(&self, app: &Application) -> Result<InstanceId, OrchestratorError> {
        let descriptor = tokio::fs::read(&app.infra_descriptor).await?;
        let url = Self::infrastructures_url(app);
        tracing::info!(%url, "creating instance");
        let response: Value =
            self.client.post(&url).body(descriptor).send().await?.json().await?;
        let infra_id = response
            .get("infraid")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                OrchestratorError::MalformedResponse("no \"infraid\" in create response".into())
            })?;
        tracing::info!(instance = %infra_id, "instance created by OCCOPUS");
        Ok(InstanceId::new(infra_id))
    }

    async fn destroy(
        &self,
        app: &Application,
        instance: &InstanceId,
    ) -> Result<(), OrchestratorError> {
        let url = format!("{}{}", Self::infrastructures_url(app), instance);
        tracing::info!(%url, app = %app.name, %instance, "destroying instance");
        let response: Value = self.client.delete(&url).send().await?.json().await?;
        if response.get("infraid").is_some() {
            tracing::info!(%instance, "instance destroyed");
        } else {
            tracing::warn!(%instance, "instance may have already been destroyed");
        }
        Ok(())
    }

    async fn check_processes(
        &self,
        app: &Application,
        instance: &InstanceId,
        store: &InstanceStore,
        cancel: &CancellationToken,
    ) -> Result<(), OrchestratorError> {
        let url = format!("{}{}", Self::infrastructures_url(app), instance);
        loop {
            tracing::info!(%url, "checking process states");
            let status: Value = self.client.get(&url).send().await?.json().await?;
            let vm_ids: Vec<String> = status
                .as_object()
                .map(|types| {
                    types
                        .values()
                        .filter_map(|t| t.get("instances").and_then(Value::as_object))
                        .flat_map(|instances| instances.keys().cloned())
                        .collect()
                })
                .unwrap_or_default();

            if vm_ids.is_empty() {
                tracing::info!("waiting for OCCOPUS to start VMs");
            } else {
                let mut all_ready = true;
                for vm_id in &vm_ids {
                    let ready =
                        store.process(instance, &ProcessId::new(vm_id.clone())).is_ok();
                    tracing::info!(vm = %vm_id, ready, "waiting for VM");
                    all_ready &= ready;
                }
                if all_ready {
                    tracing::info!(app = %app.name, %instance, "all processes are running");
                    return Ok(());
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => return Err(OrchestratorError::Cancelled),
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }

    fn validate(&self, descriptor: &Path) -> bool {
        let Ok(raw) = std::fs::read_to_string(descriptor) else {
            return false;
        };
        serde_yaml::from_str::<Value>(&raw).is_ok()
    }

    fn process_types(&self, descriptor: &Path) -> Result<Vec<String>, OrchestratorError> {
        let raw = std::fs::read_to_string(descriptor)?;
        let doc: serde_yaml::Value = serde_yaml::from_str(&raw)
            .map_err(|_| OrchestratorError::InvalidDescriptor(descriptor.to_path_buf()))?;
        let nodes = doc
            .get("nodes")
            .and_then(|n| n.as_sequence())
            .ok_or_else(|| OrchestratorError::InvalidDescriptor(descriptor.to_path_buf()))?;
        let mut names: Vec<String> = nodes
            .iter()
            .filter_map(|node| node.get("name").and_then(|n| n.as_str()))
            .map(str::to_string)
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }
}

#[cfg(test)]
#[path = "occopus_tests.rs"]
mod tests;
