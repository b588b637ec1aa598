// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state derived from WAL replay.

mod meetings;
mod sessions;

use std::collections::HashMap;

use blm_core::{Event, Meeting, MeetingId, MeetingSession, Platform, SessionUid};
use serde::{Deserialize, Serialize};

/// In-memory projection of every Meeting and MeetingSession, rebuilt by
/// replaying [`Event`]s in order. Keyed by `meeting_id`/`session_uid`
/// string form so lookups don't need the newtype in scope.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MaterializedState {
    pub meetings: HashMap<String, Meeting>,
    pub sessions: HashMap<String, MeetingSession>,
    /// `session_uid` assigned at reservation time, indexed by `meeting_id`.
    /// Distinct from `sessions`: that table only gains a row once the
    /// worker's first `started` callback lands, but C5 needs the token to
    /// address the command bus (stop/reconfigure) before that happens.
    pub session_uid_by_meeting: HashMap<String, SessionUid>,
}

impl MaterializedState {
    pub fn get_meeting(&self, meeting_id: &str) -> Option<&Meeting> {
        self.meetings.get(meeting_id)
    }

    /// The `session_uid` assigned to `meeting_id` at reservation time,
    /// regardless of whether the worker has called back yet.
    pub fn session_uid_for_meeting(&self, meeting_id: &str) -> Option<&SessionUid> {
        self.session_uid_by_meeting.get(meeting_id)
    }

    /// The `meeting_id` a `session_uid` was assigned at reservation time, via
    /// `session_uid_by_meeting` rather than the `sessions` table — that table
    /// only gains a row once the worker's first `started` callback lands, so
    /// this is the only lookup available to `started` itself.
    pub fn meeting_id_for_session_uid(&self, session_uid: &str) -> Option<MeetingId> {
        self.session_uid_by_meeting
            .iter()
            .find(|(_, v)| v.as_str() == session_uid)
            .map(|(k, _)| MeetingId::from_string(k))
    }

    pub fn get_session(&self, session_uid: &str) -> Option<&MeetingSession> {
        self.sessions.get(session_uid)
    }

    /// The Meeting whose session_uid is `session_uid`, found via the
    /// session index. Used by the callback ingress, which only ever sees a
    /// `session_uid` on the wire.
    pub fn get_meeting_by_session(&self, session_uid: &str) -> Option<&Meeting> {
        self.sessions.get(session_uid).and_then(|s| self.meetings.get(s.meeting_id.as_str()))
    }

    /// Count of non-terminal Meetings for `user_id` (I3).
    pub fn non_terminal_count_for_user(&self, user_id: &str) -> u32 {
        self.meetings
            .values()
            .filter(|m| m.user_id.as_str() == user_id && m.status.is_non_terminal())
            .count() as u32
    }

    /// An existing non-terminal Meeting matching the uniqueness predicate
    /// `(user_id, platform, native_meeting_id)` (spec.md §4.1 Conflict
    /// check), if any.
    pub fn find_non_terminal_conflict(
        &self,
        user_id: &str,
        platform: Platform,
        native_meeting_id: &str,
    ) -> Option<&Meeting> {
        self.meetings.values().find(|m| {
            m.user_id.as_str() == user_id
                && m.platform == platform
                && m.native_meeting_id.as_str() == native_meeting_id
                && m.status.is_non_terminal()
        })
    }

    /// Meetings in `status` whose `updated_at` is older than `now - max_age_ms`
    /// (C7 Reaper's stale scan, spec.md §4.7).
    pub fn stale_in_status(
        &self,
        status: blm_core::MeetingStatus,
        now_ms: u64,
        max_age_ms: u64,
    ) -> Vec<&Meeting> {
        self.meetings
            .values()
            .filter(|m| m.status == status && now_ms.saturating_sub(m.updated_at) > max_age_ms)
            .collect()
    }

    /// Apply an event to derive state changes.
    ///
    /// # Idempotency
    ///
    /// **All event handlers MUST be idempotent.** Applying the same event
    /// twice must produce the same state as applying it once: events may be
    /// re-delivered after a crash (WAL replay re-applies everything after
    /// the last snapshot, some of which may already be reflected if the
    /// crash happened between apply and snapshot).
    pub fn apply_event(&mut self, event: &Event) {
        match event {
            Event::MeetingReserved { .. } | Event::ContainerSet { .. } | Event::StatusAdvanced { .. }
            | Event::Touched { .. } | Event::ConfigApplied { .. } => meetings::apply(self, event),

            Event::SessionUpserted { .. } => sessions::apply(self, event),
        }
    }
}

#[cfg(test)]
#[path = "../state_tests.rs"]
mod tests;
