// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `xg2g sessions` / `xg2g session show` — read-only inspection of the
//! durable store's session table (spec §3, §6 "persistent state layout").

use clap::{Args, Subcommand};

use xg2g_core::SessionRecord;

use crate::output::OutputFormat;
use crate::table::{Column, Table};

#[derive(Args)]
pub struct SessionsArgs {
    #[command(subcommand)]
    pub command: Option<SessionsCommand>,
}

#[derive(Subcommand)]
pub enum SessionsCommand {
    /// List all sessions known to the store (default)
    List,
    /// Show full detail for a single session
    Show {
        /// Session id (exact match)
        session_id: String,
    },
}

pub fn run(args: SessionsArgs, format: OutputFormat) -> anyhow::Result<()> {
    match args.command {
        None | Some(SessionsCommand::List) => list(format),
        Some(SessionsCommand::Show { session_id }) => show(&session_id, format),
    }
}

fn list(format: OutputFormat) -> anyhow::Result<()> {
    let store = super::open_store()?;
    let mut sessions = store.list_sessions();
    sessions.sort_by(|a, b| b.created_at_ms.cmp(&a.created_at_ms));

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&sessions)?);
        }
        OutputFormat::Text => {
            let mut table = Table::new(vec![
                Column::left("ID").with_max(36),
                Column::status("STATE"),
                Column::left("REASON"),
                Column::muted("MODE"),
                Column::left("SERVICE").with_max(24),
                Column::left("SLOT"),
                Column::muted("AGE"),
            ]);
            for s in &sessions {
                table.row(vec![
                    s.session_id.to_string(),
                    s.state.as_str().to_string(),
                    format!("{:?}", s.reason),
                    s.mode().map(|m| format!("{m:?}")).unwrap_or_else(|| "-".to_string()),
                    s.service_ref.clone(),
                    s.context_data.tuner_slot().unwrap_or("-").to_string(),
                    crate::output::format_time_ago(s.created_at_ms),
                ]);
            }
            let mut stdout = std::io::stdout();
            table.render(&mut stdout);
            if sessions.is_empty() {
                println!("no sessions");
            }
        }
    }
    Ok(())
}

fn show(session_id: &str, format: OutputFormat) -> anyhow::Result<()> {
    let store = super::open_store()?;
    let Some(session) = store.get_session(session_id) else {
        anyhow::bail!("session {session_id} not found");
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&session)?),
        OutputFormat::Text => print_detail(&session),
    }
    Ok(())
}

fn print_detail(s: &SessionRecord) {
    use crate::color::{header, muted};

    println!("{} {}", header("session:"), s.session_id);
    println!("  {} {}", muted("state:"), crate::color::status(s.state.as_str()));
    println!("  {} {:?}", muted("pipeline:"), s.pipeline_state);
    println!("  {} {:?} / {:?}", muted("reason:"), s.reason, s.reason_detail_code);
    println!("  {} {}", muted("service:"), s.service_ref);
    println!("  {} {} ({})", muted("profile:"), s.profile.id, s.profile.codec);
    println!("  {} {}", muted("correlation:"), s.correlation_id);
    if let Some(mode) = s.mode() {
        println!("  {} {mode:?}", muted("mode:"));
    }
    for (k, v) in s.context_data.iter() {
        println!("  {} {k}={v}", muted("context:"));
    }
    println!("  {} {}", muted("created:"), crate::output::format_time_ago(s.created_at_ms));
    println!("  {} {}", muted("updated:"), crate::output::format_time_ago(s.updated_at_ms));
    if let Some(ms) = s.playlist_published_at_ms {
        println!("  {} {}", muted("playlist:"), crate::output::format_time_ago(ms));
    }
}

#[cfg(test)]
#[path = "sessions_tests.rs"]
mod tests;
