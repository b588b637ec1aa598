// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Commands published on the per-session command bus (C2, spec.md §4.2).

use serde::{Deserialize, Serialize};

use crate::meeting::PartialBotConfig;

/// A command delivered at-most-once to the worker subscribed to a
/// `session_uid` channel. State truth never lives here — the bus conveys
/// intent only (spec.md §4.2 rationale).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Command {
    Reconfigure(PartialBotConfig),
    Leave,
}
