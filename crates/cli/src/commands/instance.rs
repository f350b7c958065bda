// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `mstep instance` - inspect managed infrastructures

use super::open_store;
use clap::{Args, Subcommand};
use ms_core::{InstanceId, ProcessId};
use std::path::Path;

#[derive(Args)]
pub struct InstanceArgs {
    #[command(subcommand)]
    pub command: InstanceCommand,
}

#[derive(Subcommand)]
pub enum InstanceCommand {
    /// List managed infrastructure instances
    List,
    /// Show the processes of an instance, or one process's breakpoints
    Show {
        /// Infrastructure instance id
        instance: String,
        /// Show the breakpoint log of this process
        #[arg(long)]
        process: Option<String>,
    },
}

pub fn instance(state_dir: &Path, args: InstanceArgs) -> anyhow::Result<()> {
    match args.command {
        InstanceCommand::List => list(state_dir),
        InstanceCommand::Show { instance, process } => show(state_dir, &instance, process),
    }
}

fn list(state_dir: &Path) -> anyhow::Result<()> {
    let store = open_store(state_dir)?;
    let instances = store.instances();
    if instances.is_empty() {
        println!("No managed infrastructures.");
        return Ok(());
    }
    for row in instances {
        println!(
            "{}  app={}  finished={}  freerun={}  current={}",
            row.id,
            row.app_name,
            row.finished,
            row.freerun,
            row.current_node.as_ref().map(|n| n.as_str()).unwrap_or("-"),
        );
    }
    Ok(())
}

fn show(state_dir: &Path, instance: &str, process: Option<String>) -> anyhow::Result<()> {
    let store = open_store(state_dir)?;
    let instance = InstanceId::new(instance);
    match process {
        None => {
            println!("phase: {}", ms_engine::instance_phase(&store, &instance)?);
            for row in store.processes(&instance)? {
                println!(
                    "{}  name={}  bp={}  permit={}  finished={}  refreshed={}  ip={}",
                    row.process_id,
                    row.name,
                    row.curr_bp,
                    row.permit,
                    row.finished,
                    row.refreshed,
                    row.public_ip,
                );
            }
        }
        Some(process) => {
            let process = ProcessId::new(process);
            for record in store.breakpoints_for(&instance, &process)? {
                println!(
                    "#{}  at={}  tags={:?}",
                    record.bp_num,
                    record.recorded_at.format("%Y-%m-%d %H:%M:%S"),
                    record.tags,
                );
            }
        }
    }
    Ok(())
}
