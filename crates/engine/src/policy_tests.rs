// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::Utc;
use ms_core::{InstanceId, ProcessRecord};

fn proc(name: &str, id: &str, bp: u32, finished: bool) -> ProcessRecord {
    let mut p = ProcessRecord::new(
        InstanceId::new("pk-1"),
        id.into(),
        name,
        "10.0.0.1",
        Utc::now(),
    );
    p.curr_bp = bp;
    p.finished = finished;
    p
}

fn vector(rows: &[ProcessRecord]) -> StateVector {
    StateVector::from_processes(rows.iter())
}

#[test]
fn single_unfinished_process_is_forced() {
    let rows = [proc("a", "1", 2, true), proc("b", "1", 1, false)];
    let current = vector(&rows);
    let picked = select_abc(&rows, &current, &[]).unwrap();
    assert_eq!(picked, "1");
    assert_eq!(picked, rows[1].process_id);
}

#[test]
fn first_process_in_abc_order_is_tried_first() {
    let rows = [proc("a", "1", 1, false), proc("b", "1", 1, false)];
    let current = vector(&rows);
    let picked = select_abc(&rows, &current, &[]).unwrap();
    assert_eq!(picked, rows[0].process_id);
}

#[test]
fn traversed_children_are_skipped() {
    let rows = [proc("a", "1", 1, false), proc("b", "1", 1, false)];
    let current = vector(&rows);
    let a_child = current.increment("a", 0).unwrap();
    let picked = select_abc(&rows, &current, &[a_child]).unwrap();
    assert_eq!(picked, rows[1].process_id);
}

#[test]
fn ordinals_within_a_type_are_tracked() {
    let rows = [
        proc("w", "vm-1", 1, false),
        proc("w", "vm-2", 1, false),
    ];
    let current = vector(&rows);
    let first_child = current.increment("w", 0).unwrap();
    let picked = select_abc(&rows, &current, &[first_child]).unwrap();
    assert_eq!(picked, "vm-2");
}

#[test]
fn complete_child_set_falls_back_to_first_unfinished() {
    let rows = [proc("a", "1", 1, false), proc("b", "1", 1, false)];
    let current = vector(&rows);
    let both = vec![
        current.increment("a", 0).unwrap(),
        current.increment("b", 0).unwrap(),
    ];
    let picked = select_abc(&rows, &current, &both).unwrap();
    assert_eq!(picked, rows[0].process_id);
}

#[test]
fn nothing_to_step_when_all_finished() {
    let rows = [proc("a", "1", 2, true)];
    let current = vector(&rows);
    assert_eq!(select_abc(&rows, &current, &[]), None);
}

#[test]
fn slot_resolution_picks_the_nth_process_of_a_type() {
    let rows = [
        proc("m", "vm-0", 1, false),
        proc("w", "vm-1", 1, false),
        proc("w", "vm-2", 1, false),
    ];
    let label = MacrostepLabel { process_type: "w".into(), ordinal: 1 };
    assert_eq!(process_for_slot(&rows, &label).unwrap(), "vm-2");

    let missing = MacrostepLabel { process_type: "w".into(), ordinal: 2 };
    assert_eq!(process_for_slot(&rows, &missing), None);
}
