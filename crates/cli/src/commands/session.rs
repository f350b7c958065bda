// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `mstep session` - drive debugging sessions
//!
//! A session command embeds the HTTP service so the instance's processes
//! can report to this process, and runs the chosen driver next to it.
//! Ctrl-C cancels the driver at its next polling boundary; the live
//! instance is destroyed on the way out.

use super::{open_store, service::spawn_ctrl_c};
use anyhow::Context;
use clap::{Args, Subcommand};
use ms_adapters::orchestrator_for;
use ms_core::{AppName, NodeId, ProcessId, ProcessRecord};
use ms_descriptor::{AppDescriptor, TreeStoreKind};
use ms_engine::{Session, SessionConfig};
use ms_exectree::{CypherTreeStore, MemoryTreeStore, TreeManager, TreeStore};
use std::io::Write;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Args)]
pub struct SessionArgs {
    /// Port the embedded debugger service listens on
    #[arg(short, long, default_value_t = 5000, global = true)]
    pub port: u16,

    #[command(subcommand)]
    pub command: SessionCommand,
}

#[derive(Subcommand)]
pub enum SessionCommand {
    /// Step processes interactively until the instance finishes
    Manual {
        /// Application name
        app: String,
    },
    /// Replay an instance to a recorded collective breakpoint
    Replay {
        /// Application name
        app: String,
        /// Target collective breakpoint id
        target: String,
        /// Keep the instance alive after the replay
        #[arg(long)]
        keep_instance: bool,
        /// Continue stepping manually once the target is reached
        #[arg(long)]
        continue_manual: bool,
    },
    /// Explore the application's state space exhaustively
    Auto {
        /// Application name
        app: String,
    },
    /// Run an instance to completion without stepping control
    Freerun {
        /// Application name
        app: String,
    },
}

pub async fn session(state_dir: &Path, args: SessionArgs) -> anyhow::Result<()> {
    let app_name = match &args.command {
        SessionCommand::Manual { app }
        | SessionCommand::Replay { app, .. }
        | SessionCommand::Auto { app }
        | SessionCommand::Freerun { app } => AppName::new(app.clone()),
    };

    let store = open_store(state_dir)?;
    let app = store.app(&app_name)?;
    let descriptor = AppDescriptor::load(&app.descriptor_path)
        .context("cannot load the application descriptor the application was registered from")?;

    let config = SessionConfig::default();
    let tree = TreeManager::new(tree_store(&descriptor, &config)?);
    let orchestrator =
        orchestrator_for(app.orchestrator, config.orchestrator_timeout, config.poll_interval)?;

    let cancel = CancellationToken::new();
    spawn_ctrl_c(cancel.clone());
    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let server = tokio::spawn(ms_service::serve(addr, Arc::clone(&store), cancel.clone()));

    let session = Session::new(
        Arc::clone(&store),
        tree,
        orchestrator,
        &descriptor,
        config,
        cancel.clone(),
    );

    let result = match args.command {
        SessionCommand::Manual { .. } => session.manual(prompt_for_process).await,
        SessionCommand::Replay { target, keep_instance, continue_manual, .. } => {
            let target = NodeId::new(target);
            let mut chooser = prompt_for_process;
            let continue_with: Option<&mut (dyn FnMut(&[ProcessRecord]) -> Option<ProcessId> + Send)> =
                if continue_manual { Some(&mut chooser) } else { None };
            session.replay(&target, keep_instance, continue_with).await.map(|instance| {
                println!("Replay finished; instance {instance}.");
            })
        }
        SessionCommand::Auto { .. } => session.automatic().await,
        SessionCommand::Freerun { .. } => session.freerun().await,
    };

    cancel.cancel();
    let _ = server.await;
    result.map_err(Into::into)
}

fn tree_store(
    descriptor: &AppDescriptor,
    config: &SessionConfig,
) -> anyhow::Result<Arc<dyn TreeStore>> {
    Ok(match descriptor.tree_store_kind()? {
        TreeStoreKind::Memory => Arc::new(MemoryTreeStore::new()),
        TreeStoreKind::Neo4j => {
            let auth = descriptor.graph_auth();
            Arc::new(CypherTreeStore::new(
                &auth.host,
                &auth.user,
                &auth.password,
                config.graph_timeout,
            )?)
        }
    })
}

/// Interactive process chooser for manual stepping.
fn prompt_for_process(rows: &[ProcessRecord]) -> Option<ProcessId> {
    println!("Processes:");
    for row in rows {
        println!(
            "  {}  name={}  bp={}  finished={}",
            row.process_id, row.name, row.curr_bp, row.finished,
        );
    }
    loop {
        print!("Enter a non-finished process (VM) ID to step: ");
        let _ = std::io::stdout().flush();
        let mut line = String::new();
        if std::io::stdin().read_line(&mut line).is_err() {
            return None;
        }
        let chosen = line.trim();
        if chosen.is_empty() {
            return None;
        }
        if rows.iter().any(|p| p.process_id == chosen && !p.finished) {
            return Some(ProcessId::new(chosen));
        }
        println!("No such steppable process: \"{chosen}\"");
    }
}
