// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-process variable specifications.
//!
//! The descriptor's `specification` section lists, per process type, the
//! variables to check at every collective breakpoint and the expected
//! condition for each. Numeric operators coerce both sides through
//! floating point; `exactly` and `contains` compare as strings.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// process-type name → variable checks.
pub type Specification = BTreeMap<String, Vec<VariableEntry>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableEntry {
    pub variable: VariableCheck,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableCheck {
    pub name: String,
    pub expected: Expected,
}

/// Expected condition on a received variable value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expected {
    Equals(serde_yaml::Value),
    NotEquals(serde_yaml::Value),
    LessThan(serde_yaml::Value),
    LessThanEq(serde_yaml::Value),
    GreaterThan(serde_yaml::Value),
    GreaterThanEq(serde_yaml::Value),
    /// Exclusive range; the first two list entries are its bounds.
    Between(Vec<serde_yaml::Value>),
    Exactly(serde_yaml::Value),
    Contains(serde_yaml::Value),
}

impl Expected {
    /// Evaluate a received value against this condition.
    ///
    /// Empty received values: `not_equals` holds, `exactly` compares the
    /// empty string, every other operator is false. Values that do not
    /// coerce to a number fail the numeric operators.
    pub fn evaluate(&self, received: &str) -> bool {
        match self {
            Self::Equals(want) => both(received, want, |r, w| r == w),
            Self::NotEquals(want) => {
                if received.is_empty() {
                    return true;
                }
                both(received, want, |r, w| r != w)
            }
            Self::LessThan(want) => both(received, want, |r, w| r < w),
            Self::LessThanEq(want) => both(received, want, |r, w| r <= w),
            Self::GreaterThan(want) => both(received, want, |r, w| r > w),
            Self::GreaterThanEq(want) => both(received, want, |r, w| r >= w),
            Self::Between(bounds) => {
                let (Some(a), Some(b)) = (bounds.first(), bounds.get(1)) else {
                    return false;
                };
                let (Some(a), Some(b), Ok(r)) =
                    (as_f64(a), as_f64(b), received.parse::<f64>())
                else {
                    return false;
                };
                a.min(b) < r && r < a.max(b)
            }
            Self::Exactly(want) => received == as_string(want),
            Self::Contains(want) => {
                !received.is_empty() && received.contains(&as_string(want))
            }
        }
    }
}

fn both(received: &str, want: &serde_yaml::Value, cmp: impl Fn(f64, f64) -> bool) -> bool {
    if received.is_empty() {
        return false;
    }
    match (received.parse::<f64>(), as_f64(want)) {
        (Ok(r), Some(w)) => cmp(r, w),
        _ => false,
    }
}

fn as_f64(value: &serde_yaml::Value) -> Option<f64> {
    match value {
        serde_yaml::Value::Number(n) => n.as_f64(),
        serde_yaml::Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn as_string(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
#[path = "spec_tests.rs"]
mod tests;
