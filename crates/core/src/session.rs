// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! MeetingSession: the per-attempt session record created by the worker on
//! first contact (spec.md §3).

use serde::{Deserialize, Serialize};

use crate::ids::{MeetingId, SessionUid};

/// Created on the worker's first `started` callback. Exactly one
/// MeetingSession per Meeting reaches `active` (P3); reconnects of the same
/// worker reuse the same `session_uid` rather than creating a new row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingSession {
    pub session_uid: SessionUid,
    pub meeting_id: MeetingId,
    pub session_start_time: u64,
}
