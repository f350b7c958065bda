// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! mstep: macrostep-based cloud-orchestration debugger CLI.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mstep", version, about = "Macrostep-based cloud-orchestration debugger")]
struct Cli {
    /// State directory of the instance store
    #[arg(long, global = true, default_value = ".mstep")]
    state_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the debugger service
    Service(commands::service::ServiceArgs),
    /// Register and list applications
    App(commands::app::AppArgs),
    /// Inspect managed infrastructures
    Instance(commands::instance::InstanceArgs),
    /// Permit processes to move to their next breakpoint
    Step(commands::step::StepArgs),
    /// Run a debugging session
    Session(commands::session::SessionArgs),
    /// Instance-store maintenance
    Db(commands::db::DbArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Service(args) => commands::service::service(&cli.state_dir, args).await,
        Commands::App(args) => commands::app::app(&cli.state_dir, args).await,
        Commands::Instance(args) => commands::instance::instance(&cli.state_dir, args),
        Commands::Step(args) => commands::step::step(&cli.state_dir, args),
        Commands::Session(args) => commands::session::session(&cli.state_dir, args).await,
        Commands::Db(args) => commands::db::db(&cli.state_dir, args),
    }
}
