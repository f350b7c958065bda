// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake orchestrator for tests.
//!
//! Simulates an infrastructure's processes as in-process tasks that obey
//! the breakpoint-script contract: submit the next breakpoint when told
//! GO, issue a refresh when told REFRESH, otherwise keep polling. The
//! simulated processes drive the same instance store the real ingest
//! endpoint writes to, so coordination and driver code paths run
//! unchanged.

use crate::orchestrator::{Orchestrator, OrchestratorError};
use async_trait::async_trait;
use chrono::Utc;
use ms_core::{Application, BreakpointReport, InstanceId, Permission, ProcessId};
use ms_storage::{InstanceStore, StoreError};
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// One simulated process type.
#[derive(Debug, Clone)]
pub struct FakeProcessSpec {
    pub name: String,
    /// How many processes of this type each instance gets.
    pub count: usize,
    /// Local breakpoints per process; the last one carries a terminal
    /// tag.
    pub breakpoints: u32,
    /// Extra `userData` fields reported at every breakpoint.
    pub user_data: serde_json::Map<String, serde_json::Value>,
}

impl FakeProcessSpec {
    pub fn new(name: &str, count: usize, breakpoints: u32) -> Self {
        Self { name: name.into(), count, breakpoints, user_data: Default::default() }
    }

    pub fn with_user_data(mut self, key: &str, value: serde_json::Value) -> Self {
        self.user_data.insert(key.into(), value);
        self
    }
}

pub struct FakeOrchestrator {
    store: Arc<InstanceStore>,
    specs: Vec<FakeProcessSpec>,
    poll_interval: Duration,
    counter: AtomicUsize,
    running: Mutex<HashMap<InstanceId, Vec<JoinHandle<()>>>>,
}

impl FakeOrchestrator {
    pub fn new(store: Arc<InstanceStore>, specs: Vec<FakeProcessSpec>) -> Self {
        Self {
            store,
            specs,
            poll_interval: Duration::from_millis(5),
            counter: AtomicUsize::new(0),
            running: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    fn expected_process_count(&self) -> usize {
        self.specs.iter().map(|s| s.count).sum()
    }

    /// Abort every simulated process of an instance.
    fn stop_instance(&self, instance: &InstanceId) {
        if let Some(handles) = self.running.lock().remove(instance) {
            for handle in handles {
                handle.abort();
            }
        }
    }
}

impl Drop for FakeOrchestrator {
    fn drop(&mut self) {
        for handles in self.running.lock().values() {
            for handle in handles {
                handle.abort();
            }
        }
    }
}

#[async_trait]
impl Orchestrator for FakeOrchestrator {
    async fn start(&self, app: &Application) -> Result<InstanceId, OrchestratorError> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let instance = InstanceId::new(format!("fake-{n}"));
        let mut handles = Vec::new();
        for spec in &self.specs {
            for ordinal in 0..spec.count {
                let sim = SimProcess {
                    store: Arc::clone(&self.store),
                    instance: instance.clone(),
                    process_id: ProcessId::new(format!("{}-{:02}", spec.name, ordinal + 1)),
                    app_name: app.name.to_string(),
                    spec: spec.clone(),
                    poll_interval: self.poll_interval,
                };
                handles.push(tokio::spawn(sim.run()));
            }
        }
        self.running.lock().insert(instance.clone(), handles);
        Ok(instance)
    }

    async fn destroy(
        &self,
        _app: &Application,
        instance: &InstanceId,
    ) -> Result<(), OrchestratorError> {
        self.stop_instance(instance);
        tracing::debug!(%instance, "fake instance destroyed");
        Ok(())
    }

    async fn check_processes(
        &self,
        _app: &Application,
        instance: &InstanceId,
        store: &InstanceStore,
        cancel: &CancellationToken,
    ) -> Result<(), OrchestratorError> {
        let expected = self.expected_process_count();
        loop {
            let registered = store.processes(instance).map(|p| p.len()).unwrap_or(0);
            if registered == expected {
                return Ok(());
            }
            tokio::select! {
                _ = cancel.cancelled() => return Err(OrchestratorError::Cancelled),
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }

    fn validate(&self, _descriptor: &Path) -> bool {
        true
    }

    fn process_types(&self, _descriptor: &Path) -> Result<Vec<String>, OrchestratorError> {
        let mut names: Vec<String> = self.specs.iter().map(|s| s.name.clone()).collect();
        names.sort();
        names.dedup();
        Ok(names)
    }
}

struct SimProcess {
    store: Arc<InstanceStore>,
    instance: InstanceId,
    process_id: ProcessId,
    app_name: String,
    spec: FakeProcessSpec,
    poll_interval: Duration,
}

impl SimProcess {
    async fn run(self) {
        let mut next_bp = 1u32;

        // Boot: report the first breakpoint, retrying until the driver
        // has registered the instance.
        loop {
            match self.submit(next_bp) {
                Ok(()) => break,
                Err(StoreError::UnknownInstance(_)) => {
                    tokio::time::sleep(self.poll_interval).await;
                }
                Err(err) => {
                    tracing::error!(process = %self.process_id, %err, "sim submit failed");
                    return;
                }
            }
        }
        next_bp += 1;

        // Poll loop: one submit per GO, refresh on demand, otherwise
        // wait. Runs until the instance is destroyed.
        loop {
            tokio::time::sleep(self.poll_interval).await;
            match self.store.permission(&self.instance, &self.process_id) {
                Ok(Permission::Go) => {
                    if next_bp <= self.spec.breakpoints {
                        if let Err(err) = self.submit(next_bp) {
                            tracing::error!(process = %self.process_id, %err, "sim submit failed");
                            return;
                        }
                        next_bp += 1;
                    }
                }
                Ok(Permission::Refresh) => {
                    let _ = self.store.mark_refreshed(&self.instance, &self.process_id);
                }
                Ok(Permission::Wait) | Err(_) => {}
            }
        }
    }

    fn submit(&self, bp: u32) -> Result<(), StoreError> {
        let tag = if bp == self.spec.breakpoints { "last_bp" } else { "" };
        let mut user_data = self.spec.user_data.clone();
        user_data.insert("nodeIP".into(), json!(format!("10.0.0.{}", bp)));
        let payload = json!({
            "processData": {
                "infraID": self.instance.as_str(),
                "infraName": self.app_name,
                "nodeID": self.process_id.as_str(),
                "nodeName": self.spec.name,
                "bpTag": tag,
            },
            "userData": user_data,
        });
        let report: BreakpointReport = serde_json::from_value(payload.clone())
            .map_err(|e| StoreError::Integrity(format!("sim payload: {e}")))?;
        self.store
            .record_submit(&self.instance, &self.process_id, &report, payload, Utc::now())
            .map(|_| ())
    }
}
