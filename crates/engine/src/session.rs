// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session drivers.
//!
//! A session owns one live instance at a time and drives it through
//! macrosteps: permit a chosen process set, wait for the consistent
//! global state and the refresh handshake, record the observed state in
//! the execution tree, advance the current pointers. Freerun, manual,
//! replay, and automatic sessions are different loops over that same
//! step primitive. Every wait observes the session's cancellation token;
//! on failure or cancellation the live instance is destroyed through the
//! orchestrator.

use crate::coordinator::wait;
use crate::error::EngineError;
use crate::evaluate::evaluate_node;
use crate::policy;
use chrono::Utc;
use ms_adapters::Orchestrator;
use ms_core::{Application, AppName, InstanceId, NodeId, ProcessId, ProcessRecord, StateVector};
use ms_exectree::TreeManager;
use ms_storage::InstanceStore;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Tunables of a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Interval of the wait-for-CGS and wait-for-refresh polls.
    pub poll_interval: Duration,
    /// Timeout of individual orchestrator requests.
    pub orchestrator_timeout: Duration,
    /// Timeout of individual graph-store requests.
    pub graph_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(3),
            orchestrator_timeout: Duration::from_secs(30),
            graph_timeout: Duration::from_secs(10),
        }
    }
}

/// Outcome of one macrostep.
#[derive(Debug, Clone)]
pub struct StepResult {
    pub node: NodeId,
    /// False when the state was already in the tree (dedupe hit).
    pub created: bool,
    /// True when the instance finished with this step.
    pub finished: bool,
}

/// A debugging session over one application.
pub struct Session {
    store: Arc<InstanceStore>,
    tree: TreeManager,
    orchestrator: Arc<dyn Orchestrator>,
    app_name: AppName,
    spec: Option<ms_descriptor::Specification>,
    global_expr: Option<String>,
    config: SessionConfig,
    cancel: CancellationToken,
}

impl Session {
    pub fn new(
        store: Arc<InstanceStore>,
        tree: TreeManager,
        orchestrator: Arc<dyn Orchestrator>,
        descriptor: &ms_descriptor::AppDescriptor,
        config: SessionConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            store,
            tree,
            orchestrator,
            app_name: AppName::new(descriptor.application_name.clone()),
            spec: descriptor.specification.clone(),
            global_expr: descriptor.specification_global.clone(),
            config,
            cancel,
        }
    }

    pub fn app_name(&self) -> &AppName {
        &self.app_name
    }

    fn app(&self) -> Result<Application, EngineError> {
        Ok(self.store.app(&self.app_name)?)
    }

    // --- instance lifecycle ---

    /// Start a fresh instance and block until it reaches root state.
    /// With `record_tree` the root collective breakpoint is created (or
    /// adopted) and the application/instance pointers are set.
    pub async fn start_instance(&self, record_tree: bool) -> Result<InstanceId, EngineError> {
        let app = self.app()?;
        if record_tree {
            // Fail before any mutation if the graph is unreachable.
            self.tree.ping().await?;
        }
        let instance = self.orchestrator.start(&app).await?;
        self.store.register_instance(instance.clone(), app.name.clone(), Utc::now())?;

        match self.bring_to_root(&app, &instance, record_tree).await {
            Ok(()) => Ok(instance),
            Err(err) => {
                let _ = self.orchestrator.destroy(&app, &instance).await;
                Err(err)
            }
        }
    }

    async fn bring_to_root(
        &self,
        app: &Application,
        instance: &InstanceId,
        record_tree: bool,
    ) -> Result<(), EngineError> {
        self.orchestrator
            .check_processes(app, instance, &self.store, &self.cancel)
            .await?;
        wait::until_root(&self.store, instance, self.config.poll_interval, &self.cancel).await?;
        tracing::info!(app = %app.name, %instance, "instance reached root state");

        // The running instance must expose exactly the process types the
        // application was registered with.
        let mut observed: Vec<String> = self
            .store
            .processes(instance)?
            .iter()
            .map(|p| p.name.clone())
            .collect();
        observed.dedup();
        if observed != app.process_types {
            return Err(EngineError::TypeSetMismatch {
                expected: app.process_types.clone(),
                observed,
            });
        }

        if record_tree {
            let vector = self.store.global_state(instance)?;
            let (root, _created) = self.tree.ensure_root(&app.name, &vector).await?;
            self.store.set_app_root_node(&app.name, &root)?;
            self.store.set_instance_current_node(instance, &root)?;
            self.store.set_app_current_node(&app.name, &root)?;
            self.record_visit(&root, instance).await?;
        }
        Ok(())
    }

    /// Destroy the live instance; on the happy path with `keep` the
    /// instance survives the session.
    async fn finish(
        &self,
        instance: &InstanceId,
        result: Result<(), EngineError>,
        keep: bool,
    ) -> Result<(), EngineError> {
        let app = self.app()?;
        match result {
            Ok(()) if keep => {
                tracing::info!(app = %app.name, %instance, "instance kept alive");
                Ok(())
            }
            Ok(()) => {
                self.orchestrator.destroy(&app, instance).await?;
                Ok(())
            }
            Err(err) => {
                let _ = self.orchestrator.destroy(&app, instance).await;
                Err(err)
            }
        }
    }

    // --- the step primitive ---

    /// Permit `chosen`, wait out the handshake, and record the reached
    /// state in the execution tree.
    pub async fn step(
        &self,
        instance: &InstanceId,
        chosen: &[ProcessId],
    ) -> Result<StepResult, EngineError> {
        tracing::info!(%instance, processes = ?chosen, "stepping");
        self.store.permit_set(instance, chosen)?;
        wait::until_cgs(&self.store, instance, self.config.poll_interval, &self.cancel).await?;
        wait::until_refresh_completed(&self.store, instance, self.config.poll_interval, &self.cancel)
            .await?;
        tracing::info!(%instance, "consistent global state reached");

        let app = self.app()?;
        let parent = self
            .store
            .instance(instance)?
            .current_node
            .ok_or_else(|| EngineError::NoCurrentNode(instance.clone()))?;
        let vector = self.store.global_state(instance)?;
        let unfinished = self.store.unfinished_count(instance)?;
        let outcome = self.tree.record_state(&app.name, &parent, &vector, unfinished).await?;
        let node = outcome.node_id().clone();

        self.store.set_instance_current_node(instance, &node)?;
        self.store.set_app_current_node(&app.name, &node)?;
        self.record_visit(&node, instance).await?;

        let finished = self.store.instance(instance)?.finished;
        Ok(StepResult { node, created: outcome.created(), finished })
    }

    async fn record_visit(&self, node: &NodeId, instance: &InstanceId) -> Result<(), EngineError> {
        let samples = self.store.collect_current_samples(instance)?;
        if self.spec.is_some() || self.global_expr.is_some() {
            let record = evaluate_node(
                self.spec.as_ref(),
                self.global_expr.as_deref(),
                instance,
                &samples,
            );
            self.tree.attach_evaluation(&self.app_name, node, record).await?;
        }
        self.tree.attach_visit(&self.app_name, node, instance, samples).await?;
        Ok(())
    }

    /// Exhaustion bookkeeping once an instance reached its final state.
    async fn record_final(&self, instance: &InstanceId) -> Result<(), EngineError> {
        let leaf = self
            .store
            .instance(instance)?
            .current_node
            .ok_or_else(|| EngineError::NoCurrentNode(instance.clone()))?;
        let final_vector = self.store.global_state(instance)?;
        self.tree.propagate_exhaustion(&self.app_name, &leaf, &final_vector).await?;
        Ok(())
    }

    // --- session kinds ---

    /// Let the instance run to completion, collecting breakpoints but
    /// never recording the execution tree.
    pub async fn freerun(&self) -> Result<(), EngineError> {
        let instance = self.start_instance(false).await?;
        self.store.set_freerun(&instance, true)?;
        let result = self.freerun_loop(&instance).await;
        self.finish(&instance, result, false).await
    }

    async fn freerun_loop(&self, instance: &InstanceId) -> Result<(), EngineError> {
        let mut seen: HashMap<ProcessId, u32> = HashMap::new();
        loop {
            wait::until_cgs(&self.store, instance, self.config.poll_interval, &self.cancel)
                .await?;
            self.log_new_breakpoints(instance, &mut seen)?;
            if self.store.instance(instance)?.finished {
                tracing::info!(%instance, "freerun instance finished");
                return Ok(());
            }
            self.store.permit_all(instance)?;
            tokio::select! {
                _ = self.cancel.cancelled() => return Err(EngineError::Cancelled),
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }
    }

    fn log_new_breakpoints(
        &self,
        instance: &InstanceId,
        seen: &mut HashMap<ProcessId, u32>,
    ) -> Result<(), EngineError> {
        for row in self.store.processes(instance)? {
            let last = seen.get(&row.process_id).copied().unwrap_or(0);
            for record in self.store.breakpoints_for(instance, &row.process_id)? {
                if record.bp_num > last {
                    tracing::info!(
                        process = %row.process_id,
                        name = %row.name,
                        bp = record.bp_num,
                        tags = ?record.tags,
                        "breakpoint reached",
                    );
                }
            }
            seen.insert(row.process_id.clone(), row.curr_bp);
        }
        Ok(())
    }

    /// Step caller-chosen processes until the instance finishes. The
    /// chooser gets the current process rows and returns the id to step;
    /// returning `None` aborts the session.
    pub async fn manual(
        &self,
        mut choose: impl FnMut(&[ProcessRecord]) -> Option<ProcessId> + Send,
    ) -> Result<(), EngineError> {
        let instance = self.start_instance(true).await?;
        let result = self.manual_loop(&instance, &mut choose).await;
        self.finish(&instance, result, false).await
    }

    async fn manual_loop(
        &self,
        instance: &InstanceId,
        choose: &mut (dyn FnMut(&[ProcessRecord]) -> Option<ProcessId> + Send),
    ) -> Result<(), EngineError> {
        while !self.store.instance(instance)?.finished {
            let rows = self.store.processes(instance)?;
            let Some(chosen) = choose(&rows) else {
                return Err(EngineError::NoProcessChosen);
            };
            if !rows.iter().any(|p| p.process_id == chosen && !p.finished) {
                tracing::warn!(process = %chosen, "not a steppable process");
                continue;
            }
            let step = self.step(instance, &[chosen]).await?;
            if step.finished {
                self.record_final(instance).await?;
            }
        }
        tracing::info!(%instance, "instance finished deployment");
        Ok(())
    }

    /// Replay a fresh instance along the recorded path to `target`.
    /// Returns the instance id (kept alive when `keep_instance`).
    pub async fn replay(
        &self,
        target: &NodeId,
        keep_instance: bool,
        continue_manual: Option<&mut (dyn FnMut(&[ProcessRecord]) -> Option<ProcessId> + Send)>,
    ) -> Result<InstanceId, EngineError> {
        let app = self.app()?;
        if !self.tree.node_exists(&app.name, target).await? {
            return Err(EngineError::UnknownNode(target.clone()));
        }
        let instance = self.start_instance(true).await?;
        let mut result = self.replay_loop(&instance, target).await;
        if result.is_ok() {
            if let Some(choose) = continue_manual {
                if !self.store.instance(&instance)?.finished {
                    result = self.manual_loop(&instance, choose).await;
                }
            }
        }
        self.finish(&instance, result, keep_instance).await?;
        Ok(instance)
    }

    async fn replay_loop(&self, instance: &InstanceId, target: &NodeId) -> Result<(), EngineError> {
        let app = self.app()?;
        loop {
            let current = self
                .store
                .instance(instance)?
                .current_node
                .ok_or_else(|| EngineError::NoCurrentNode(instance.clone()))?;
            let Some(next) = self.tree.next_hop(&app.name, &current, target).await? else {
                tracing::info!(%instance, node = %target, "target state reached");
                return Ok(());
            };
            let current_vector = self.tree.node_vector(&app.name, &current).await?;
            let next_vector = self.tree.node_vector(&app.name, &next).await?;
            let label = current_vector.step_to(&next_vector).ok_or_else(|| {
                ms_exectree::TreeError::Integrity(format!(
                    "edge {current} -> {next} is not one macrostep"
                ))
            })?;
            let rows = self.store.processes(instance)?;
            let process = policy::process_for_slot(&rows, &label)
                .ok_or_else(|| EngineError::NoStepCandidate(instance.clone()))?;
            tracing::info!(%instance, next = %next, step = %label, "replaying macrostep");
            let step = self.step(instance, &[process]).await?;
            if step.node != next {
                return Err(ms_exectree::TreeError::Integrity(format!(
                    "replay diverged: reached {} instead of {next}",
                    step.node
                ))
                .into());
            }
            if step.finished {
                self.record_final(instance).await?;
            }
        }
    }

    /// Exhaustively explore the application's state space depth-first.
    pub async fn automatic(&self) -> Result<(), EngineError> {
        while !self.tree.is_root_exhausted(&self.app_name).await? {
            let app = self.app()?;
            let instance = match self.replay_pointer(&app).await? {
                Some(pointer) => {
                    tracing::info!(node = %pointer, "resuming exploration below recorded state");
                    self.replay(&pointer, true, None).await?
                }
                None => self.start_instance(true).await?,
            };

            if let Err(err) = self.auto_loop(&instance).await {
                return self.finish(&instance, Err(err), false).await;
            }
            // Covers the degenerate traversal where the instance was
            // already final at its starting node (no step ran).
            if let Err(err) = self.record_final(&instance).await {
                return self.finish(&instance, Err(err), false).await;
            }

            let leaf = self
                .store
                .instance(&instance)?
                .current_node
                .ok_or_else(|| EngineError::NoCurrentNode(instance.clone()))?;
            let pointer = self.tree.closest_non_exhausted_ancestor(&self.app_name, &leaf).await?;
            match pointer {
                Some(node) => self.store.set_app_current_node(&app.name, &node)?,
                None => {
                    if let Some(root) = app.root_node.as_ref() {
                        self.store.set_app_current_node(&app.name, root)?;
                    }
                }
            }
            self.finish(&instance, Ok(()), false).await?;
        }
        tracing::info!(app = %self.app_name, "automatic debug session finished");
        Ok(())
    }

    /// Where the next automatic traversal should start: the recorded
    /// current node when it is a real, non-root tree position.
    async fn replay_pointer(&self, app: &Application) -> Result<Option<NodeId>, EngineError> {
        let (Some(root), Some(current)) = (app.root_node.as_ref(), app.current_node.as_ref())
        else {
            return Ok(None);
        };
        if current == root || !self.tree.node_exists(&app.name, current).await? {
            return Ok(None);
        }
        Ok(Some(current.clone()))
    }

    async fn auto_loop(&self, instance: &InstanceId) -> Result<(), EngineError> {
        while !self.store.instance(instance)?.finished {
            let current = self
                .store
                .instance(instance)?
                .current_node
                .ok_or_else(|| EngineError::NoCurrentNode(instance.clone()))?;
            let rows = self.store.processes(instance)?;
            let vector = self.store.global_state(instance)?;
            let traversed: Vec<StateVector> = self
                .tree
                .children(&self.app_name, &current)
                .await?
                .into_iter()
                .map(|c| c.state)
                .collect();
            let process = policy::select_abc(&rows, &vector, &traversed)
                .ok_or_else(|| EngineError::NoStepCandidate(instance.clone()))?;
            let step = self.step(instance, &[process]).await?;
            if step.finished {
                self.record_final(instance).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
