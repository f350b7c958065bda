// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `mstep step` - grant step permits by hand

use super::open_store;
use clap::Args;
use ms_core::{InstanceId, ProcessId};
use std::path::Path;

#[derive(Args)]
pub struct StepArgs {
    /// Infrastructure instance id
    pub instance: String,
    /// Permit only these processes (default: every non-finished process)
    #[arg(long = "process")]
    pub processes: Vec<String>,
}

pub fn step(state_dir: &Path, args: StepArgs) -> anyhow::Result<()> {
    let store = open_store(state_dir)?;
    let instance = InstanceId::new(args.instance);
    if args.processes.is_empty() {
        store.permit_all(&instance)?;
        println!("Permitted all non-finished processes in {instance}.");
    } else {
        let ids: Vec<ProcessId> = args.processes.iter().map(ProcessId::new).collect();
        store.permit_set(&instance, &ids)?;
        println!("Permitted {} process(es) in {instance}.", ids.len());
    }
    Ok(())
}
