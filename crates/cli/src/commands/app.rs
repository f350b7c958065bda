// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `mstep app` - application registry

use super::open_store;
use clap::{Args, Subcommand};
use ms_adapters::orchestrator_for;
use ms_descriptor::AppDescriptor;
use ms_engine::{register_application, SessionConfig};
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct AppArgs {
    #[command(subcommand)]
    pub command: AppCommand,
}

#[derive(Subcommand)]
pub enum AppCommand {
    /// Register an application from its descriptor file
    Register {
        /// Application descriptor (YAML)
        descriptor: PathBuf,
    },
    /// List registered applications
    List,
}

pub async fn app(state_dir: &Path, args: AppArgs) -> anyhow::Result<()> {
    match args.command {
        AppCommand::Register { descriptor } => register(state_dir, &descriptor),
        AppCommand::List => list(state_dir),
    }
}

fn register(state_dir: &Path, path: &Path) -> anyhow::Result<()> {
    let store = open_store(state_dir)?;
    let descriptor = AppDescriptor::load(path)?;
    let config = SessionConfig::default();
    let orchestrator = orchestrator_for(
        descriptor.orchestrator_kind()?,
        config.orchestrator_timeout,
        config.poll_interval,
    )?;
    let app = register_application(
        &store,
        orchestrator.as_ref(),
        &descriptor,
        path,
        chrono::Utc::now(),
    )?;
    println!("Registered application \"{}\" ({})", app.name, app.orchestrator);
    println!("  process types: {}", app.process_types.join(", "));
    Ok(())
}

fn list(state_dir: &Path) -> anyhow::Result<()> {
    let store = open_store(state_dir)?;
    let apps = store.apps();
    if apps.is_empty() {
        println!("No applications registered.");
        return Ok(());
    }
    for app in apps {
        println!(
            "{}  orchestrator={}  types=[{}]  root={}  current={}",
            app.name,
            app.orchestrator,
            app.process_types.join(", "),
            app.root_node.as_ref().map(|n| n.as_str()).unwrap_or("-"),
            app.current_node.as_ref().map(|n| n.as_str()).unwrap_or("-"),
        );
    }
    Ok(())
}
