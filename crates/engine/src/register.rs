// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Application registration from a descriptor.

use crate::error::EngineError;
use ms_adapters::Orchestrator;
use ms_core::{AppName, Application};
use ms_descriptor::AppDescriptor;
use ms_storage::InstanceStore;
use std::path::Path;

/// Validate the infrastructure descriptor, extract its process-type set,
/// and register the application.
pub fn register_application(
    store: &InstanceStore,
    orchestrator: &dyn Orchestrator,
    descriptor: &AppDescriptor,
    descriptor_path: &Path,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<Application, EngineError> {
    let infra = descriptor.infra_descriptor()?;
    if !orchestrator.validate(infra) {
        return Err(ms_adapters::OrchestratorError::InvalidDescriptor(infra.to_path_buf()).into());
    }
    tracing::info!(descriptor = %infra.display(), "valid infrastructure descriptor");
    let process_types = orchestrator.process_types(infra)?;

    let app = Application {
        name: AppName::new(descriptor.application_name.clone()),
        orchestrator: descriptor.orchestrator_kind()?,
        orchestrator_url: descriptor.orchestrator.url.clone(),
        infra_descriptor: infra.to_path_buf(),
        descriptor_path: descriptor_path.to_path_buf(),
        process_types,
        graph_auth: descriptor.graph_auth(),
        root_node: None,
        current_node: None,
        registered_at: now,
    };
    store.register_application(app.clone())?;
    tracing::info!(app = %app.name, types = ?app.process_types, "application registered");
    Ok(app)
}
