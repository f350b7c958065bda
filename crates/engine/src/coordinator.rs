// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Instance phase classification and polling waits.
//!
//! The coordinator is a state machine driven purely by observable
//! instance-store changes; multi-row reads may observe intermediate
//! states, so every wait re-checks its full predicate each tick instead
//! of trusting a one-shot read.

use crate::error::EngineError;
use ms_core::InstanceId;
use ms_storage::InstanceStore;
use std::fmt;

/// Where an instance stands in the permit/refresh handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstancePhase {
    /// Processes are still booting and registering.
    Init,
    /// Every process halted at its first breakpoint.
    Root,
    /// At least one permitted process is moving.
    Stepping,
    /// Consistent global state reached, refresh handshake incomplete.
    CgsPending,
    /// Consistent global state with every process refreshed.
    CgsRefreshed,
    /// Every process reported its terminal breakpoint.
    Final,
}

impl fmt::Display for InstancePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::Root => "root",
            Self::Stepping => "stepping",
            Self::CgsPending => "cgs-pending",
            Self::CgsRefreshed => "cgs-refreshed",
            Self::Final => "final",
        };
        write!(f, "{name}")
    }
}

/// Classify an instance from one read of the store.
pub fn instance_phase(
    store: &InstanceStore,
    instance: &InstanceId,
) -> Result<InstancePhase, EngineError> {
    let rows = store.processes(instance)?;
    if rows.is_empty() {
        return Ok(InstancePhase::Init);
    }
    if rows.iter().any(|p| p.permit) {
        return Ok(InstancePhase::Stepping);
    }
    if rows.iter().all(|p| p.curr_bp == 1 && !p.refreshed) {
        return Ok(InstancePhase::Root);
    }
    if rows.iter().all(|p| p.refreshed) {
        if rows.iter().all(|p| p.finished) {
            return Ok(InstancePhase::Final);
        }
        return Ok(InstancePhase::CgsRefreshed);
    }
    Ok(InstancePhase::CgsPending)
}

/// Cancellable polling waits over store predicates.
pub mod wait {
    use super::EngineError;
    use ms_core::InstanceId;
    use ms_storage::InstanceStore;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    async fn until(
        store: &InstanceStore,
        instance: &InstanceId,
        interval: Duration,
        cancel: &CancellationToken,
        what: &str,
        predicate: impl Fn(&InstanceStore, &InstanceId) -> Result<bool, ms_storage::StoreError>,
    ) -> Result<(), EngineError> {
        loop {
            if predicate(store, instance)? {
                return Ok(());
            }
            tracing::debug!(%instance, "waiting for {what}");
            tokio::select! {
                _ = cancel.cancelled() => return Err(EngineError::Cancelled),
                _ = tokio::time::sleep(interval) => {}
            }
        }
    }

    /// Wait until every process of the instance halts at its first
    /// breakpoint.
    pub async fn until_root(
        store: &InstanceStore,
        instance: &InstanceId,
        interval: Duration,
        cancel: &CancellationToken,
    ) -> Result<(), EngineError> {
        until(store, instance, interval, cancel, "root state", |s, i| s.is_root_state(i)).await
    }

    /// Wait until no process holds a permit.
    pub async fn until_cgs(
        store: &InstanceStore,
        instance: &InstanceId,
        interval: Duration,
        cancel: &CancellationToken,
    ) -> Result<(), EngineError> {
        until(store, instance, interval, cancel, "consistent global state", |s, i| {
            s.is_consistent_global_state(i)
        })
        .await
    }

    /// Wait until the refresh handshake after a macrostep completes.
    pub async fn until_refresh_completed(
        store: &InstanceStore,
        instance: &InstanceId,
        interval: Duration,
        cancel: &CancellationToken,
    ) -> Result<(), EngineError> {
        until(store, instance, interval, cancel, "refresh completion", |s, i| {
            s.is_refresh_completed(i)
        })
        .await
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
