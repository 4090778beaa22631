// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `xg2g stop` — SIGTERM the daemon process (identified by its PID file),
//! escalating to SIGKILL if it doesn't exit within the timeout.

use std::time::Duration;

use clap::Args;

use crate::daemon_process;

#[derive(Args)]
pub struct StopArgs {
    /// Seconds to wait for graceful shutdown before force-killing
    #[arg(long, default_value_t = 15)]
    pub timeout_secs: u64,
}

pub fn run(args: StopArgs) -> anyhow::Result<()> {
    let Some(pid) = daemon_process::read_daemon_pid() else {
        println!("xg2gd is not running");
        return Ok(());
    };
    if !daemon_process::process_exists(pid) {
        println!("xg2gd is not running");
        return Ok(());
    }

    println!("stopping xg2gd (pid {pid})...");
    if daemon_process::stop_daemon(pid, Duration::from_secs(args.timeout_secs)) {
        println!("stopped");
        Ok(())
    } else {
        anyhow::bail!("xg2gd (pid {pid}) did not exit within {}s", args.timeout_secs)
    }
}
