// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Three-step payload validation.
//!
//! A report must be parseable JSON, carry the required key paths, and
//! hold non-empty strings in the identification fields (`bpTag` may be
//! empty). Validation never mutates anything; each failure maps to its
//! own HTTP status.

use ms_core::BreakpointReport;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidateError {
    /// Not parseable JSON → 400.
    #[error("invalid JSON")]
    InvalidJson,
    /// A required key path is absent → 422.
    #[error("missing or invalid values")]
    MissingKeys,
    /// A required value has the wrong type or is empty → 422.
    #[error("missing or invalid JSON keys and/or values")]
    InvalidValues,
}

const REQUIRED_PATHS: [[&str; 2]; 6] = [
    ["processData", "infraID"],
    ["processData", "infraName"],
    ["processData", "nodeID"],
    ["processData", "nodeName"],
    ["processData", "bpTag"],
    ["userData", "nodeIP"],
];

/// Fields that must be non-empty strings ("bpTag" only has to be a
/// string).
const NON_EMPTY: [[&str; 2]; 5] = [
    ["processData", "infraID"],
    ["processData", "infraName"],
    ["processData", "nodeID"],
    ["processData", "nodeName"],
    ["userData", "nodeIP"],
];

/// Validate a raw request body into a typed report plus the original
/// payload value (kept for the breakpoint log).
pub fn parse_report(body: &[u8]) -> Result<(BreakpointReport, Value), ValidateError> {
    let value: Value = serde_json::from_slice(body).map_err(|_| ValidateError::InvalidJson)?;

    for path in REQUIRED_PATHS {
        if lookup(&value, path).is_none() {
            return Err(ValidateError::MissingKeys);
        }
    }

    for path in NON_EMPTY {
        match lookup(&value, path).and_then(Value::as_str) {
            Some(s) if !s.is_empty() => {}
            _ => return Err(ValidateError::InvalidValues),
        }
    }
    if !lookup(&value, ["processData", "bpTag"]).is_some_and(Value::is_string) {
        return Err(ValidateError::InvalidValues);
    }

    let report =
        serde_json::from_value(value.clone()).map_err(|_| ValidateError::InvalidValues)?;
    Ok((report, value))
}

fn lookup<'a>(value: &'a Value, path: [&str; 2]) -> Option<&'a Value> {
    value.get(path[0])?.get(path[1])
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
