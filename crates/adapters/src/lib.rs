// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ms-adapters: orchestrator adapters.
//!
//! The [`Orchestrator`] trait is the seam to the cloud-orchestration
//! backend that creates and destroys infrastructure instances. Concrete
//! adapters speak the backend's REST API; the fake adapter simulates an
//! instance's processes in-process for tests and demos.

mod occopus;
mod orchestrator;
mod terraform;

#[cfg(any(test, feature = "test-support"))]
mod fake;

pub use occopus::OccopusAdapter;
pub use orchestrator::{orchestrator_for, Orchestrator, OrchestratorError};
pub use terraform::TerraformAdapter;

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeOrchestrator, FakeProcessSpec};
