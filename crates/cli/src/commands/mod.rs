// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod app;
pub mod db;
pub mod instance;
pub mod service;
pub mod session;
pub mod step;

use ms_storage::InstanceStore;
use std::path::Path;
use std::sync::Arc;

pub(crate) fn open_store(state_dir: &Path) -> anyhow::Result<Arc<InstanceStore>> {
    Ok(Arc::new(InstanceStore::open(state_dir)?))
}
