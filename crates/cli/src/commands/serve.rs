// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `xg2g serve` — launch `xg2gd`. Foreground by default (the natural mode
//! under a process supervisor); `--background` detaches and returns once
//! the daemon has printed its readiness marker or exited.

use std::io::Read;
use std::os::unix::process::CommandExt;
use std::process::Command;
use std::time::{Duration, Instant};

use clap::Args;

use crate::daemon_process;

#[derive(Args)]
pub struct ServeArgs {
    /// Spawn the daemon detached and return once it's ready, instead of
    /// blocking in the foreground
    #[arg(long)]
    pub background: bool,
}

pub fn run(args: ServeArgs) -> anyhow::Result<()> {
    if let Some(pid) = daemon_process::read_daemon_pid() {
        if daemon_process::process_exists(pid) {
            anyhow::bail!("xg2gd is already running (pid {pid})");
        }
    }

    let path = daemon_process::find_daemon_binary();

    if !args.background {
        // Replace this process's image entirely — matches running `xg2gd`
        // directly, so signal handling and exit codes pass through as-is.
        let err = Command::new(&path).exec();
        anyhow::bail!("failed to exec {}: {err}", path.display());
    }

    let mut child = Command::new(&path)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::null())
        .spawn()
        .map_err(|e| anyhow::anyhow!("failed to spawn {}: {e}", path.display()))?;

    let Some(mut stdout) = child.stdout.take() else {
        anyhow::bail!("failed to capture xg2gd stdout");
    };
    let deadline = Instant::now() + Duration::from_secs(15);
    let mut buf = [0u8; 256];
    let mut collected = String::new();
    loop {
        if Instant::now() >= deadline {
            anyhow::bail!("xg2gd did not report ready within 15s");
        }
        if let Ok(Some(status)) = child.try_wait() {
            anyhow::bail!("xg2gd exited during startup: {status}");
        }
        let n = stdout.read(&mut buf).unwrap_or(0);
        if n == 0 {
            std::thread::sleep(Duration::from_millis(50));
            continue;
        }
        collected.push_str(&String::from_utf8_lossy(&buf[..n]));
        if collected.contains("READY") {
            break;
        }
    }

    println!("xg2gd started (pid {})", child.id());
    Ok(())
}
