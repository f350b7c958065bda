// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ms-storage: the instance store.
//!
//! Durable per-instance state: registered applications, instance registry,
//! process rows, and the append-only breakpoint log. Writes are expressed
//! as [`StoreEvent`]s appended to a JSON-lines journal and applied to
//! materialized in-memory tables; opening a state directory replays the
//! journal. A single mutex guards the tables, so every operation is one
//! atomic read-modify-write — the row-level consistency the coordination
//! protocol relies on.

mod journal;
mod state;

pub use journal::Journal;

use chrono::{DateTime, Utc};
use ms_core::{
    Application, AppName, BreakpointRecord, BreakpointReport, CollectedSample, Instance,
    InstanceId, NodeId, Permission, ProcessId, ProcessRecord, StateVector, StoreEvent,
};
use parking_lot::Mutex;
use state::MaterializedState;
use std::path::Path;

/// Instance-store failure modes.
///
/// `Unknown*` map to HTTP 404 at the service boundary, `ProcessFinished`
/// to 422. `Integrity` means the store refused a write that would break a
/// log invariant; the session treats it as fatal.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no application registered as \"{0}\"")]
    UnknownApplication(AppName),
    #[error("application \"{0}\" is already registered")]
    ApplicationExists(AppName),
    #[error("no infrastructure exists with ID \"{0}\"")]
    UnknownInstance(InstanceId),
    #[error("infrastructure \"{0}\" is already registered")]
    InstanceExists(InstanceId),
    #[error("no process \"{process}\" in infrastructure \"{instance}\"")]
    UnknownProcess { instance: InstanceId, process: ProcessId },
    #[error("process \"{process}\" in \"{instance}\" has already reached its last breakpoint")]
    ProcessFinished { instance: InstanceId, process: ProcessId },
    #[error("store integrity violation: {0}")]
    Integrity(String),
    #[error("journal I/O failed")]
    Io(#[from] std::io::Error),
    #[error("corrupt journal line {line}")]
    CorruptJournal { line: usize },
}

/// What a submit did to the reporting process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// First report: the process row was created at breakpoint 1.
    NewProcess { terminal: bool },
    /// The process advanced to `bp`.
    Advanced { bp: u32 },
    /// The process advanced to `bp` and reported a terminal tag.
    Finished { bp: u32 },
}

struct Inner {
    state: MaterializedState,
    journal: Option<Journal>,
}

/// The instance store.
pub struct InstanceStore {
    inner: Mutex<Inner>,
}

impl InstanceStore {
    /// Open (or create) a journaled store under `dir` and replay it.
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        let (journal, events) = Journal::open(dir)?;
        let mut state = MaterializedState::default();
        for event in &events {
            state::apply(&mut state, event);
        }
        state.check_log_integrity().map_err(StoreError::Integrity)?;
        tracing::info!(events = events.len(), dir = %dir.display(), "instance store opened");
        Ok(Self { inner: Mutex::new(Inner { state, journal: Some(journal) }) })
    }

    /// A store with no journal; state lives only in memory.
    pub fn in_memory() -> Self {
        Self {
            inner: Mutex::new(Inner { state: MaterializedState::default(), journal: None }),
        }
    }

    /// Drop all tables and truncate the journal.
    pub fn clear(&self) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if let Some(journal) = inner.journal.as_mut() {
            journal.clear()?;
        }
        inner.state = MaterializedState::default();
        Ok(())
    }

    /// Journal, then apply. Call with the lock held.
    fn commit(inner: &mut Inner, events: &[StoreEvent]) -> Result<(), StoreError> {
        if let Some(journal) = inner.journal.as_mut() {
            for event in events {
                journal.append(event)?;
            }
        }
        for event in events {
            state::apply(&mut inner.state, event);
        }
        Ok(())
    }

    // --- applications ---

    pub fn register_application(&self, app: Application) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if inner.state.apps.contains_key(app.name.as_str()) {
            return Err(StoreError::ApplicationExists(app.name));
        }
        Self::commit(&mut inner, &[StoreEvent::ApplicationRegistered { app }])
    }

    pub fn app(&self, name: &AppName) -> Result<Application, StoreError> {
        self.inner
            .lock()
            .state
            .apps
            .get(name.as_str())
            .cloned()
            .ok_or_else(|| StoreError::UnknownApplication(name.clone()))
    }

    pub fn apps(&self) -> Vec<Application> {
        let mut apps: Vec<_> = self.inner.lock().state.apps.values().cloned().collect();
        apps.sort_by(|a, b| a.name.cmp(&b.name));
        apps
    }

    pub fn set_app_root_node(&self, name: &AppName, node: &NodeId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if !inner.state.apps.contains_key(name.as_str()) {
            return Err(StoreError::UnknownApplication(name.clone()));
        }
        Self::commit(
            &mut inner,
            &[StoreEvent::AppRootNodeSet { app: name.clone(), node: node.clone() }],
        )
    }

    pub fn set_app_current_node(&self, name: &AppName, node: &NodeId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if !inner.state.apps.contains_key(name.as_str()) {
            return Err(StoreError::UnknownApplication(name.clone()));
        }
        Self::commit(
            &mut inner,
            &[StoreEvent::AppCurrentNodeSet { app: name.clone(), node: node.clone() }],
        )
    }

    // --- instances ---

    pub fn register_instance(
        &self,
        id: InstanceId,
        app_name: AppName,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if !inner.state.apps.contains_key(app_name.as_str()) {
            return Err(StoreError::UnknownApplication(app_name));
        }
        if inner.state.instances.contains_key(id.as_str()) {
            return Err(StoreError::InstanceExists(id));
        }
        let instance = Instance::new(id, app_name, now);
        Self::commit(&mut inner, &[StoreEvent::InstanceRegistered { instance }])
    }

    pub fn instance(&self, id: &InstanceId) -> Result<Instance, StoreError> {
        self.inner
            .lock()
            .state
            .instances
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| StoreError::UnknownInstance(id.clone()))
    }

    pub fn instances(&self) -> Vec<Instance> {
        let mut rows: Vec<_> = self.inner.lock().state.instances.values().cloned().collect();
        rows.sort_by(|a, b| a.id.cmp(&b.id));
        rows
    }

    pub fn instances_for_app(&self, name: &AppName) -> Vec<Instance> {
        self.instances().into_iter().filter(|i| &i.app_name == name).collect()
    }

    pub fn set_instance_current_node(
        &self,
        id: &InstanceId,
        node: &NodeId,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if !inner.state.instances.contains_key(id.as_str()) {
            return Err(StoreError::UnknownInstance(id.clone()));
        }
        Self::commit(
            &mut inner,
            &[StoreEvent::InstanceCurrentNodeSet { instance: id.clone(), node: node.clone() }],
        )
    }

    pub fn set_freerun(&self, id: &InstanceId, freerun: bool) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if !inner.state.instances.contains_key(id.as_str()) {
            return Err(StoreError::UnknownInstance(id.clone()));
        }
        Self::commit(&mut inner, &[StoreEvent::FreerunSet { instance: id.clone(), freerun }])
    }

    // --- ingest ---

    /// Record one submit report. Atomic: either every effect is applied
    /// (process row, breakpoint record, flags, finished propagation) or
    /// none is.
    pub fn record_submit(
        &self,
        instance: &InstanceId,
        process: &ProcessId,
        report: &BreakpointReport,
        payload: serde_json::Value,
        now: DateTime<Utc>,
    ) -> Result<SubmitOutcome, StoreError> {
        let mut inner = self.inner.lock();
        if !inner.state.instances.contains_key(instance.as_str()) {
            return Err(StoreError::UnknownInstance(instance.clone()));
        }

        let terminal = report.is_terminal();
        let tags = report.tags();
        let existing = inner.state.process(instance, process).cloned();
        let mut events = Vec::new();
        let outcome = match existing {
            None => {
                let row = ProcessRecord::new(
                    instance.clone(),
                    process.clone(),
                    report.process_data.node_name.clone(),
                    report.node_ip(),
                    now,
                );
                events.push(StoreEvent::ProcessRegistered { process: row });
                events.push(StoreEvent::BreakpointRecorded {
                    record: BreakpointRecord {
                        instance_id: instance.clone(),
                        process_id: process.clone(),
                        bp_num: 1,
                        recorded_at: now,
                        tags,
                        payload,
                    },
                });
                SubmitOutcome::NewProcess { terminal }
            }
            Some(row) if row.finished => {
                return Err(StoreError::ProcessFinished {
                    instance: instance.clone(),
                    process: process.clone(),
                });
            }
            Some(row) => {
                let bp = row.curr_bp + 1;
                let last_logged = inner.state.last_breakpoint_num(instance, process);
                if last_logged != row.curr_bp {
                    return Err(StoreError::Integrity(format!(
                        "breakpoint log for {instance}/{process} ends at #{last_logged}, \
                         process row is at #{}",
                        row.curr_bp
                    )));
                }
                events.push(StoreEvent::BreakpointRecorded {
                    record: BreakpointRecord {
                        instance_id: instance.clone(),
                        process_id: process.clone(),
                        bp_num: bp,
                        recorded_at: now,
                        tags,
                        payload,
                    },
                });
                events.push(StoreEvent::ProcessAdvanced {
                    instance: instance.clone(),
                    process: process.clone(),
                    bp,
                });
                if terminal {
                    SubmitOutcome::Finished { bp }
                } else {
                    SubmitOutcome::Advanced { bp }
                }
            }
        };

        if terminal {
            events.push(StoreEvent::ProcessFinished {
                instance: instance.clone(),
                process: process.clone(),
            });
            let others_unfinished = inner
                .state
                .processes(instance)
                .iter()
                .filter(|p| !p.finished && &p.process_id != process)
                .count();
            if others_unfinished == 0 {
                events.push(StoreEvent::InstanceFinished { instance: instance.clone() });
            }
        }

        Self::commit(&mut inner, &events)?;
        Ok(outcome)
    }

    /// Record that a process re-read state at its current breakpoint.
    pub fn mark_refreshed(
        &self,
        instance: &InstanceId,
        process: &ProcessId,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if !inner.state.instances.contains_key(instance.as_str()) {
            return Err(StoreError::UnknownInstance(instance.clone()));
        }
        if inner.state.process(instance, process).is_none() {
            return Err(StoreError::UnknownProcess {
                instance: instance.clone(),
                process: process.clone(),
            });
        }
        Self::commit(
            &mut inner,
            &[StoreEvent::ProcessRefreshed { instance: instance.clone(), process: process.clone() }],
        )
    }

    // --- permits ---

    /// Grant step permits to the given processes and reset every refreshed
    /// flag in the instance. Finished or unknown processes are skipped
    /// with a log entry rather than failing the whole set.
    pub fn permit_set(
        &self,
        instance: &InstanceId,
        processes: &[ProcessId],
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if !inner.state.instances.contains_key(instance.as_str()) {
            return Err(StoreError::UnknownInstance(instance.clone()));
        }
        let mut granted = Vec::new();
        for id in processes {
            match inner.state.process(instance, id) {
                Some(row) if row.finished => {
                    tracing::warn!(%instance, process = %id, "not permitting finished process");
                }
                Some(_) => granted.push(id.clone()),
                None => {
                    tracing::warn!(%instance, process = %id, "not permitting unknown process");
                }
            }
        }
        Self::commit(
            &mut inner,
            &[StoreEvent::PermitSet { instance: instance.clone(), processes: granted }],
        )
    }

    /// Permit every non-finished process in the instance.
    pub fn permit_all(&self, instance: &InstanceId) -> Result<(), StoreError> {
        let all: Vec<ProcessId> = self
            .processes(instance)?
            .into_iter()
            .filter(|p| !p.finished)
            .map(|p| p.process_id)
            .collect();
        self.permit_set(instance, &all)
    }

    // --- coordination reads ---

    pub fn process(
        &self,
        instance: &InstanceId,
        process: &ProcessId,
    ) -> Result<ProcessRecord, StoreError> {
        self.inner.lock().state.process(instance, process).cloned().ok_or_else(|| {
            StoreError::UnknownProcess { instance: instance.clone(), process: process.clone() }
        })
    }

    /// Process rows of an instance in canonical (name, process-id) order.
    pub fn processes(&self, instance: &InstanceId) -> Result<Vec<ProcessRecord>, StoreError> {
        let inner = self.inner.lock();
        if !inner.state.instances.contains_key(instance.as_str()) {
            return Err(StoreError::UnknownInstance(instance.clone()));
        }
        Ok(inner.state.processes(instance).to_vec())
    }

    pub fn unfinished_count(&self, instance: &InstanceId) -> Result<usize, StoreError> {
        Ok(self.processes(instance)?.iter().filter(|p| !p.finished).count())
    }

    /// Consistent global state: at least one process, none permitted.
    pub fn is_consistent_global_state(&self, instance: &InstanceId) -> Result<bool, StoreError> {
        let rows = self.processes(instance)?;
        Ok(!rows.is_empty() && rows.iter().all(|p| !p.permit))
    }

    /// Root state: a consistent global state with every process at its
    /// first breakpoint.
    pub fn is_root_state(&self, instance: &InstanceId) -> Result<bool, StoreError> {
        let rows = self.processes(instance)?;
        Ok(!rows.is_empty() && rows.iter().all(|p| !p.permit && p.curr_bp == 1))
    }

    /// Refresh-completed: a consistent global state where every process
    /// has re-read its current breakpoint.
    pub fn is_refresh_completed(&self, instance: &InstanceId) -> Result<bool, StoreError> {
        let rows = self.processes(instance)?;
        Ok(!rows.is_empty() && rows.iter().all(|p| !p.permit && p.refreshed))
    }

    pub fn global_state(&self, instance: &InstanceId) -> Result<StateVector, StoreError> {
        Ok(StateVector::from_processes(self.processes(instance)?.iter()))
    }

    /// Answer a process's `next?` poll against current store state, in one
    /// read quorum.
    pub fn permission(
        &self,
        instance: &InstanceId,
        process: &ProcessId,
    ) -> Result<Permission, StoreError> {
        let inner = self.inner.lock();
        if !inner.state.instances.contains_key(instance.as_str()) {
            return Err(StoreError::UnknownInstance(instance.clone()));
        }
        let Some(row) = inner.state.process(instance, process) else {
            return Err(StoreError::UnknownProcess {
                instance: instance.clone(),
                process: process.clone(),
            });
        };
        let rows = inner.state.processes(instance);
        let consistent = rows.iter().all(|p| !p.permit);

        // Root state: everything halted at breakpoint 1, nobody moves.
        if consistent && rows.iter().all(|p| p.curr_bp == 1) {
            return Ok(Permission::Wait);
        }
        if consistent {
            if rows.iter().all(|p| p.refreshed) {
                return Ok(if row.permit { Permission::Go } else { Permission::Wait });
            }
            // Some sibling has not re-read yet; steer this caller into the
            // refresh handshake unless it already completed it.
            return Ok(if row.refreshed { Permission::Wait } else { Permission::Refresh });
        }
        // Inconsistent: at least one permitted process is still moving.
        Ok(if row.permit { Permission::Go } else { Permission::Wait })
    }

    // --- log reads ---

    /// Ordered breakpoint log of one process.
    pub fn breakpoints_for(
        &self,
        instance: &InstanceId,
        process: &ProcessId,
    ) -> Result<Vec<BreakpointRecord>, StoreError> {
        let inner = self.inner.lock();
        if !inner.state.instances.contains_key(instance.as_str()) {
            return Err(StoreError::UnknownInstance(instance.clone()));
        }
        if inner.state.process(instance, process).is_none() {
            return Err(StoreError::UnknownProcess {
                instance: instance.clone(),
                process: process.clone(),
            });
        }
        Ok(inner.state.breakpoints(instance, process).to_vec())
    }

    /// Every process's latest collected variables, sampled at the
    /// instance's current global state.
    pub fn collect_current_samples(
        &self,
        instance: &InstanceId,
    ) -> Result<Vec<CollectedSample>, StoreError> {
        let inner = self.inner.lock();
        if !inner.state.instances.contains_key(instance.as_str()) {
            return Err(StoreError::UnknownInstance(instance.clone()));
        }
        let mut samples = Vec::new();
        let mut ordinal = 0usize;
        let mut prev_name: Option<&str> = None;
        let rows = inner.state.processes(instance);
        for row in rows {
            if prev_name == Some(row.name.as_str()) {
                ordinal += 1;
            } else {
                ordinal = 0;
                prev_name = Some(row.name.as_str());
            }
            let user_data = inner
                .state
                .breakpoints(instance, &row.process_id)
                .iter()
                .find(|r| r.bp_num == row.curr_bp)
                .and_then(|r| r.payload.get("userData"))
                .and_then(|v| v.as_object())
                .cloned()
                .unwrap_or_default();
            samples.push(CollectedSample {
                instance_id: instance.clone(),
                process_name: row.name.clone(),
                ordinal,
                process_id: row.process_id.clone(),
                bp_num: row.curr_bp,
                user_data,
            });
        }
        Ok(samples)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
