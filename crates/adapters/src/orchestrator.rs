// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The orchestrator seam.

use async_trait::async_trait;
use ms_core::{Application, InstanceId, OrchestratorKind};
use ms_storage::{InstanceStore, StoreError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("orchestrator request failed")]
    Transport(#[from] reqwest::Error),
    #[error("orchestrator returned an unexpected response: {0}")]
    MalformedResponse(String),
    #[error("infrastructure descriptor \"{0}\" is invalid")]
    InvalidDescriptor(PathBuf),
    #[error("cannot read infrastructure descriptor")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("cancelled while waiting for the orchestrator")]
    Cancelled,
}

/// Lifecycle operations a cloud orchestrator must provide.
///
/// `check_processes` blocks until every process the orchestrator started
/// has registered itself with the ingest endpoint (i.e. appears in the
/// instance store), polling the backend in between.
#[async_trait]
pub trait Orchestrator: Send + Sync {
    /// Create a new infrastructure instance of the application.
    async fn start(&self, app: &Application) -> Result<InstanceId, OrchestratorError>;

    /// Tear an instance down.
    async fn destroy(
        &self,
        app: &Application,
        instance: &InstanceId,
    ) -> Result<(), OrchestratorError>;

    /// Wait until all of the instance's processes have reported in.
    async fn check_processes(
        &self,
        app: &Application,
        instance: &InstanceId,
        store: &InstanceStore,
        cancel: &CancellationToken,
    ) -> Result<(), OrchestratorError>;

    /// Validate an infrastructure descriptor without deploying it.
    fn validate(&self, descriptor: &Path) -> bool;

    /// Sorted process-type names declared by an infrastructure
    /// descriptor.
    fn process_types(&self, descriptor: &Path) -> Result<Vec<String>, OrchestratorError>;
}

/// Build the adapter for an orchestrator kind.
pub fn orchestrator_for(
    kind: OrchestratorKind,
    request_timeout: Duration,
    poll_interval: Duration,
) -> Result<Arc<dyn Orchestrator>, OrchestratorError> {
    let client = reqwest::Client::builder().timeout(request_timeout).build()?;
    Ok(match kind {
        OrchestratorKind::Occopus => {
            Arc::new(crate::OccopusAdapter::new(client, poll_interval))
        }
        OrchestratorKind::Terraform => {
            Arc::new(crate::TerraformAdapter::new(client, poll_interval))
        }
    })
}
