// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `blmctl`: operator CLI for the Bot Lifecycle Manager daemon.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use output::OutputFormat;

#[derive(Parser)]
#[command(name = "blmctl", about = "Operator CLI for the Bot Lifecycle Manager")]
struct Cli {
    #[arg(long, value_enum, global = true, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage the blm-daemon process.
    Daemon {
        #[command(subcommand)]
        command: commands::daemon::DaemonCommand,
    },
    /// Read-only queries against Meetings.
    Meetings {
        #[command(subcommand)]
        command: commands::meetings::MeetingsCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Daemon { command } => commands::daemon::run(command, cli.format).await,
        Command::Meetings { command } => commands::meetings::run(command, cli.format).await,
    }
}
