// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared scenario fixtures.

use chrono::Utc;
use ms_adapters::{FakeOrchestrator, FakeProcessSpec};
use ms_core::AppName;
use ms_descriptor::AppDescriptor;
use ms_engine::{register_application, Session, SessionConfig};
use ms_exectree::{MemoryTreeStore, TreeManager};
use ms_storage::InstanceStore;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const APP: &str = "scenario-app";

pub struct Scenario {
    pub store: Arc<InstanceStore>,
    pub tree: TreeManager,
    pub session: Session,
}

pub fn app_name() -> AppName {
    AppName::new(APP)
}

fn descriptor() -> AppDescriptor {
    let yaml = format!(
        r#"
application_name: {APP}
orchestrator:
  type: occopus
  url: http://localhost:5000
  occopus:
    infra_file: infra.yaml
exec-tree:
  type: memory
"#
    );
    serde_yaml::from_str(&yaml).expect("scenario descriptor")
}

/// Build the full stack for a set of simulated process types.
pub fn scenario(specs: Vec<FakeProcessSpec>) -> Scenario {
    let store = Arc::new(InstanceStore::in_memory());
    let tree = TreeManager::new(Arc::new(MemoryTreeStore::new()));
    let orchestrator = Arc::new(
        FakeOrchestrator::new(Arc::clone(&store), specs)
            .with_poll_interval(Duration::from_millis(2)),
    );
    let descriptor = descriptor();
    register_application(
        &store,
        orchestrator.as_ref(),
        &descriptor,
        Path::new("scenario.yaml"),
        Utc::now(),
    )
    .expect("register scenario application");

    let session = Session::new(
        Arc::clone(&store),
        tree.clone(),
        orchestrator,
        &descriptor,
        SessionConfig { poll_interval: Duration::from_millis(2), ..SessionConfig::default() },
        CancellationToken::new(),
    );
    Scenario { store, tree, session }
}
