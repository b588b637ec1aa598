// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `blmctl meetings` subcommands: read-only queries over the control socket.

use anyhow::{anyhow, Result};
use blm_core::Meeting;
use blm_wire::{Query, Request, Response};
use clap::Subcommand;

use crate::client::DaemonClient;
use crate::output::{format_or_json, OutputFormat};

#[derive(Subcommand)]
pub enum MeetingsCommand {
    /// List Meetings, optionally filtered by user, platform, or status.
    List {
        #[arg(long)]
        user_id: Option<String>,
        #[arg(long)]
        platform: Option<String>,
        #[arg(long)]
        status: Option<String>,
    },
    /// Get a single Meeting by id.
    Get { id: String },
}

pub async fn run(command: MeetingsCommand, format: OutputFormat) -> Result<()> {
    let socket_path = blm_daemon::config::state_dir()?.join("daemon.sock");
    let mut client =
        DaemonClient::connect(&socket_path, blm_daemon::config::control_timeout()).await?;

    match command {
        MeetingsCommand::List { user_id, platform, status } => {
            let query = Query::ListMeetings { user_id, platform, status };
            match client.call(Request::Query { query }).await? {
                Response::Meetings { meetings } => {
                    format_or_json(format, &meetings, || print_meetings(&meetings))
                }
                Response::Error { message } => Err(anyhow!(message)),
                other => Err(anyhow!("unexpected response to list query: {other:?}")),
            }
        }
        MeetingsCommand::Get { id } => {
            let query = Query::GetMeeting { id };
            match client.call(Request::Query { query }).await? {
                Response::Meeting { meeting: Some(meeting) } => {
                    format_or_json(format, &meeting, || print_meeting(&meeting))
                }
                Response::Meeting { meeting: None } => Err(anyhow!("meeting not found")),
                Response::Error { message } => Err(anyhow!(message)),
                other => Err(anyhow!("unexpected response to get query: {other:?}")),
            }
        }
    }
}

fn print_meetings(meetings: &[Meeting]) {
    if meetings.is_empty() {
        println!("No meetings.");
        return;
    }
    println!("{:<26}{:<12}{:<12}{:<10}", "MEETING ID", "PLATFORM", "STATUS", "USER");
    for m in meetings {
        println!(
            "{:<26}{:<12}{:<12}{:<10}",
            m.meeting_id.to_string(),
            m.platform.to_string(),
            m.status.to_string(),
            m.user_id.to_string(),
        );
    }
}

fn print_meeting(m: &Meeting) {
    println!("meeting_id:        {}", m.meeting_id);
    println!("user_id:           {}", m.user_id);
    println!("platform:          {}", m.platform);
    println!("native_meeting_id: {}", m.native_meeting_id);
    println!("status:            {}", m.status);
    println!(
        "bot_container_id:  {}",
        m.bot_container_id.as_ref().map(|c| c.to_string()).unwrap_or_else(|| "-".into())
    );
    println!("created_at:        {}", m.created_at);
    println!("updated_at:        {}", m.updated_at);
    if let Some(reason) = &m.failure_reason {
        println!("failure_reason:    {reason}");
    }
}
