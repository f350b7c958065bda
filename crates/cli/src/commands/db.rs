// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `mstep db` - instance-store maintenance

use super::open_store;
use clap::{Args, Subcommand};
use std::path::Path;

#[derive(Args)]
pub struct DbArgs {
    #[command(subcommand)]
    pub command: DbCommand,
}

#[derive(Subcommand)]
pub enum DbCommand {
    /// Drop every table and truncate the journal
    Clear,
}

pub fn db(state_dir: &Path, args: DbArgs) -> anyhow::Result<()> {
    match args.command {
        DbCommand::Clear => {
            let store = open_store(state_dir)?;
            store.clear()?;
            println!("Instance store cleared.");
            Ok(())
        }
    }
}
