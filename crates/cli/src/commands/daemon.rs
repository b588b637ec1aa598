// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `blmctl daemon` subcommands: start/stop/status against the control socket.

use std::path::PathBuf;
use std::process::Command as StdCommand;
use std::time::Duration;

use anyhow::{anyhow, Result};
use blm_wire::{Request, Response};
use clap::Subcommand;

use crate::client::DaemonClient;
use crate::output::{format_or_json, OutputFormat};

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Start the daemon in the background if it isn't already running.
    Start,
    /// Ask a running daemon to flush, snapshot, and exit.
    Stop,
    /// Report daemon uptime and active-meeting count.
    Status,
}

pub async fn run(command: DaemonCommand, format: OutputFormat) -> Result<()> {
    match command {
        DaemonCommand::Start => start().await,
        DaemonCommand::Stop => stop(format).await,
        DaemonCommand::Status => status(format).await,
    }
}

fn socket_path() -> Result<PathBuf> {
    Ok(blm_daemon::config::state_dir()?.join("daemon.sock"))
}

async fn connect() -> Result<DaemonClient> {
    DaemonClient::connect(&socket_path()?, blm_daemon::config::control_timeout()).await
}

async fn start() -> Result<()> {
    if connect().await.is_ok() {
        println!("Daemon already running");
        return Ok(());
    }
    let binary = find_blmd_binary();
    StdCommand::new(&binary)
        .spawn()
        .map_err(|e| anyhow!("failed to start {}: {e}", binary.display()))?;
    // Give the daemon a moment to bind its control socket before any
    // immediately-following command tries to talk to it.
    tokio::time::sleep(Duration::from_millis(300)).await;
    println!("Daemon started");
    Ok(())
}

async fn stop(format: OutputFormat) -> Result<()> {
    let mut client = match connect().await {
        Ok(c) => c,
        Err(_) => {
            return format_or_json(format, &serde_json::json!({"status": "not_running"}), || {
                println!("Daemon not running")
            })
        }
    };
    match client.call(Request::Shutdown).await? {
        Response::ShuttingDown => {
            format_or_json(format, &serde_json::json!({"status": "shutting_down"}), || {
                println!("Daemon shutting down")
            })
        }
        other => Err(anyhow!("unexpected response to shutdown request: {other:?}")),
    }
}

async fn status(format: OutputFormat) -> Result<()> {
    let mut client = match connect().await {
        Ok(c) => c,
        Err(_) => {
            return format_or_json(format, &serde_json::json!({"status": "not_running"}), || {
                println!("Daemon not running")
            })
        }
    };
    match client.call(Request::Status).await? {
        Response::Status { uptime_secs, meetings_active } => format_or_json(
            format,
            &serde_json::json!({
                "status": "running",
                "uptime_secs": uptime_secs,
                "meetings_active": meetings_active,
            }),
            || {
                println!("Status: running");
                println!("Uptime: {}", format_uptime(uptime_secs));
                println!("Meetings active: {meetings_active}");
            },
        ),
        other => Err(anyhow!("unexpected response to status request: {other:?}")),
    }
}

fn format_uptime(secs: u64) -> String {
    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;
    let secs = secs % 60;
    if hours > 0 {
        format!("{hours}h {mins}m {secs}s")
    } else if mins > 0 {
        format!("{mins}m {secs}s")
    } else {
        format!("{secs}s")
    }
}

fn find_blmd_binary() -> PathBuf {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let sibling = dir.join("blmd");
            if sibling.exists() {
                return sibling;
            }
        }
    }
    PathBuf::from("blmd")
}
