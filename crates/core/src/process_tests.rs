// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::Utc;

#[test]
fn new_process_starts_at_first_breakpoint_unpermitted() {
    let p = ProcessRecord::new(
        InstanceId::new("pk-1"),
        ProcessId::new("vm-a"),
        "worker",
        "10.0.0.4",
        Utc::now(),
    );
    assert_eq!(p.curr_bp, 1);
    assert!(!p.permit);
    assert!(!p.finished);
    assert!(!p.refreshed);
}

#[test]
fn process_record_roundtrips_through_json() {
    let p = ProcessRecord::new(
        InstanceId::new("pk-1"),
        ProcessId::new("vm-a"),
        "worker",
        "10.0.0.4",
        Utc::now(),
    );
    let json = serde_json::to_string(&p).unwrap();
    let back: ProcessRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(back, p);
}
