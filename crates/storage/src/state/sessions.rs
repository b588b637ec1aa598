// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! MeetingSession event handlers.

use blm_core::{Event, MeetingSession};

use super::MaterializedState;

pub(crate) fn apply(state: &mut MaterializedState, event: &Event) {
    if let Event::SessionUpserted { meeting_id, session_uid, start_time_ms } = event {
        // Idempotent on (meeting_id, session_uid): a reconnecting worker
        // replays `started` and must reuse the same row, not create a
        // second MeetingSession for the same Meeting (P3).
        state.sessions.entry(session_uid.to_string()).or_insert_with(|| MeetingSession {
            session_uid: session_uid.clone(),
            meeting_id: *meeting_id,
            session_start_time: *start_time_ms,
        });
    }
}
