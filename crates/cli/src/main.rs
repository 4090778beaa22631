// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! xg2g - tuner session orchestrator CLI
//!
//! A thin inspection and process-management front end over the daemon
//! (`xg2gd`): there is no RPC transport between them (spec §1 — the HTTP
//! API surface is an out-of-scope external collaborator), so every command
//! either manages the daemon's OS process or reads the durable store the
//! daemon itself writes (spec §6 "persistent state layout").

mod color;
mod commands;
mod daemon_process;
mod output;
mod table;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{serve, sessions, status, stop};
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "xg2g", version, about = "Tuner session orchestrator CLI")]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, default_value_t, global = true)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the daemon
    Serve(serve::ServeArgs),
    /// Stop the running daemon
    Stop(stop::StopArgs),
    /// Report whether the daemon is running
    Status(status::StatusArgs),
    /// Inspect sessions in the durable store
    Sessions(sessions::SessionsArgs),
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve(args) => serve::run(args),
        Commands::Stop(args) => stop::run(args),
        Commands::Status(args) => status::run(args, cli.output),
        Commands::Sessions(args) => sessions::run(args, cli.output),
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
