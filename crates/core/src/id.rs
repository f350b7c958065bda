// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifier newtypes.
//!
//! All ids in the system originate outside this process — instance and
//! process ids are assigned by the orchestrator, application names by the
//! descriptor — so they stay plain string wrappers. The one id minted here
//! is [`NodeId`], which is a v4 UUID per the execution-tree layout.

/// Define a newtype id wrapper around `String`.
///
/// Generates `new()`, `as_str()`, `Display`, `From<String>`, `From<&str>`,
/// `PartialEq<str>`, `PartialEq<&str>`, and `Borrow<str>` implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident;
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        pub struct $name(pub String);

        impl $name {
            /// Create from any string-like value.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id! {
    /// Registered application name (unique per deployment of the debugger).
    pub struct AppName;
}

define_string_id! {
    /// Orchestrator-assigned infrastructure instance id.
    pub struct InstanceId;
}

define_string_id! {
    /// Orchestrator-assigned process (VM) id, unique within an instance.
    pub struct ProcessId;
}

define_string_id! {
    /// Collective-breakpoint id in the execution tree.
    pub struct NodeId;
}

impl NodeId {
    /// Mint a fresh collective-breakpoint id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
