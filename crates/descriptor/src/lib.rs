// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ms-descriptor: application descriptors and specifications.
//!
//! Parses the YAML application descriptor (orchestrator coordinates,
//! execution-tree store, per-process variable specification, global
//! boolean expression) into typed definitions with explicit errors, and
//! provides the parser for the global-expression grammar.

mod descriptor;
mod expr;
mod spec;

pub use descriptor::{
    AppDescriptor, DescriptorError, ExecTreeSection, OccopusSection, OrchestratorSection,
    TerraformSection, TreeStoreKind,
};
pub use expr::{Atom, Expr, ExprError};
pub use spec::{Expected, Specification, VariableCheck, VariableEntry};
