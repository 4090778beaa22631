// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `xg2g status` — is the daemon running, and a quick session-count summary
//! from the store it writes. No RPC: there is no IPC transport (spec §1).

use clap::Args;

use crate::daemon_process;
use crate::output::OutputFormat;

#[derive(Args)]
pub struct StatusArgs;

pub fn run(_args: StatusArgs, format: OutputFormat) -> anyhow::Result<()> {
    let pid = daemon_process::read_daemon_pid();
    let running = pid.map(daemon_process::process_exists).unwrap_or(false);

    let sessions = super::open_store().ok().map(|s| s.list_sessions());
    let active = sessions
        .as_ref()
        .map(|sessions| sessions.iter().filter(|s| !s.is_terminal()).count());

    match format {
        OutputFormat::Json => {
            let body = serde_json::json!({
                "running": running,
                "pid": pid,
                "activeSessions": active,
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        OutputFormat::Text => {
            if running {
                println!("{} (pid {})", crate::color::green("running"), pid.unwrap_or(0));
            } else {
                println!("{}", crate::color::yellow("not running"));
            }
            if let Some(count) = active {
                println!("active sessions: {count}");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
