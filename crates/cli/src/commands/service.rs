// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `mstep service` - run the HTTP service

use super::open_store;
use clap::{Args, Subcommand};
use std::net::SocketAddr;
use std::path::Path;
use tokio_util::sync::CancellationToken;

#[derive(Args)]
pub struct ServiceArgs {
    #[command(subcommand)]
    pub command: ServiceCommand,
}

#[derive(Subcommand)]
pub enum ServiceCommand {
    /// Start the debugger service in the foreground
    Start {
        /// Port to listen on
        #[arg(short, long, default_value_t = 5000)]
        port: u16,
    },
}

pub async fn service(state_dir: &Path, args: ServiceArgs) -> anyhow::Result<()> {
    match args.command {
        ServiceCommand::Start { port } => start(state_dir, port).await,
    }
}

async fn start(state_dir: &Path, port: u16) -> anyhow::Result<()> {
    let store = open_store(state_dir)?;
    let cancel = CancellationToken::new();
    spawn_ctrl_c(cancel.clone());
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    ms_service::serve(addr, store, cancel).await?;
    Ok(())
}

/// Cancel the token on the first Ctrl-C.
pub(crate) fn spawn_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, shutting down");
            cancel.cancel();
        }
    });
}
