// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request types sent by the operator CLI over the local control socket.

use serde::{Deserialize, Serialize};

use crate::Query;

/// Request from CLI to daemon (spec.md §10.3: operator conveniences, not
/// part of the worker contract or the public REST surface).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    /// Liveness check.
    Ping,
    /// Read-only query.
    Query { query: Query },
    /// Daemon uptime and a coarse activity count.
    Status,
    /// Ask the daemon to flush, snapshot, and exit.
    Shutdown,
}
