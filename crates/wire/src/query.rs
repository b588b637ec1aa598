// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Query types for reading daemon state over the control protocol.

use serde::{Deserialize, Serialize};

/// Read-only queries the operator CLI can issue against a running daemon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Query {
    /// List Meetings, optionally filtered.
    ListMeetings {
        #[serde(default)]
        user_id: Option<String>,
        #[serde(default)]
        platform: Option<String>,
        #[serde(default)]
        status: Option<String>,
    },
    /// Get a single Meeting by id (accepts the `mtg-` prefixed form).
    GetMeeting { id: String },
}
