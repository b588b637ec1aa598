// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Response types sent by the daemon back to the operator CLI.

use blm_core::Meeting;
use serde::{Deserialize, Serialize};

/// Response from daemon to CLI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    /// Generic success.
    Ok,
    /// Reply to `Request::Ping`.
    Pong,
    /// Daemon is shutting down; sent before the connection is closed.
    ShuttingDown,
    /// Reply to `Request::Status`.
    Status { uptime_secs: u64, meetings_active: usize },
    /// Reply to `Query::ListMeetings`.
    Meetings { meetings: Vec<Meeting> },
    /// Reply to `Query::GetMeeting`.
    Meeting { meeting: Option<Box<Meeting>> },
    /// Request failed.
    Error { message: String },
}
