// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Canonical process-state vectors and macrostep slot arithmetic.
//!
//! A state vector maps each process-type name to the ordered list of
//! current breakpoint numbers of that type's processes. Canonical form:
//! type names ascending, ordinals following a stable sort over
//! (name, process-id). Two instances of the same application that sit at
//! the same global state therefore produce byte-identical vectors.

use crate::process::ProcessRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Edge label of a macrostep: which process type, and which ordinal within
/// that type, advanced by one local breakpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacrostepLabel {
    pub process_type: String,
    /// Zero-based ordinal within the type; rendered 1-based on the wire.
    pub ordinal: usize,
}

impl fmt::Display for MacrostepLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.process_type, self.ordinal + 1)
    }
}

/// Canonical global state of one instance.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateVector(BTreeMap<String, Vec<u32>>);

impl StateVector {
    /// Build the canonical vector from process rows. Ordering does not
    /// depend on the input order.
    pub fn from_processes<'a>(processes: impl IntoIterator<Item = &'a ProcessRecord>) -> Self {
        let mut rows: Vec<&ProcessRecord> = processes.into_iter().collect();
        rows.sort_by(|a, b| {
            (a.name.as_str(), a.process_id.as_str())
                .cmp(&(b.name.as_str(), b.process_id.as_str()))
        });
        let mut map: BTreeMap<String, Vec<u32>> = BTreeMap::new();
        for row in rows {
            map.entry(row.name.clone()).or_default().push(row.curr_bp);
        }
        Self(map)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total number of (type, ordinal) slots.
    pub fn slot_count(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn ordinals(&self, process_type: &str) -> usize {
        self.0.get(process_type).map(Vec::len).unwrap_or(0)
    }

    pub fn get(&self, process_type: &str, ordinal: usize) -> Option<u32> {
        self.0.get(process_type).and_then(|v| v.get(ordinal)).copied()
    }

    /// Iterate slots in canonical order as (type, ordinal, breakpoint).
    pub fn slots(&self) -> impl Iterator<Item = (&str, usize, u32)> {
        self.0.iter().flat_map(|(name, bps)| {
            bps.iter().enumerate().map(move |(i, bp)| (name.as_str(), i, *bp))
        })
    }

    /// The vector with one slot advanced by a single breakpoint, or `None`
    /// if the slot does not exist.
    pub fn increment(&self, process_type: &str, ordinal: usize) -> Option<Self> {
        let mut next = self.clone();
        let slot = next.0.get_mut(process_type)?.get_mut(ordinal)?;
        *slot += 1;
        Some(next)
    }

    /// The unique slot by which `next` advances this vector by exactly one
    /// breakpoint. `None` when the two vectors are not one macrostep apart.
    pub fn step_to(&self, next: &Self) -> Option<MacrostepLabel> {
        if self.0.len() != next.0.len() {
            return None;
        }
        let mut label = None;
        for (name, bps) in &self.0 {
            let next_bps = next.0.get(name)?;
            if next_bps.len() != bps.len() {
                return None;
            }
            for (i, (a, b)) in bps.iter().zip(next_bps).enumerate() {
                if a == b {
                    continue;
                }
                if *b != a + 1 || label.is_some() {
                    return None;
                }
                label = Some(MacrostepLabel { process_type: name.clone(), ordinal: i });
            }
        }
        label
    }

    /// Number of slots whose value differs from `other`.
    ///
    /// Against the final-state vector of a traversal this counts the
    /// processes that were not yet finished here, which equals the number
    /// of branching choices the node offered.
    pub fn differing_slots(&self, other: &Self) -> usize {
        self.slots()
            .filter(|(name, i, bp)| other.get(name, *i) != Some(*bp))
            .count()
    }
}

impl fmt::Display for StateVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        write!(f, "{{")?;
        for (name, bps) in &self.0 {
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write!(f, "{name}: {bps:?}")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
#[path = "state_vector_tests.rs"]
mod tests;
