// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::ids::{MeetingId, NativeMeetingId, SessionUid, UserId};
use crate::meeting::{BotConfig, MeetingStatus};
use crate::platform::{Platform, Task};
use crate::Event;

// ── Proptest strategies ─────────────────────────────────────────────────

/// Proptest strategies for core state machine types.
pub mod strategies {
    use crate::meeting::MeetingStatus;
    use proptest::prelude::*;

    pub fn arb_status() -> impl Strategy<Value = MeetingStatus> {
        prop_oneof![
            Just(MeetingStatus::Reserved),
            Just(MeetingStatus::Starting),
            Just(MeetingStatus::Active),
            Just(MeetingStatus::Stopping),
            Just(MeetingStatus::Completed),
            Just(MeetingStatus::Failed),
        ]
    }
}

// ── Event factory functions ─────────────────────────────────────────────────

pub fn reserved_event(user_id: &str, native_meeting_id: &str, created_at_ms: u64) -> Event {
    Event::MeetingReserved {
        meeting_id: MeetingId::new(),
        user_id: UserId::from(user_id),
        platform: Platform::Zoom,
        native_meeting_id: NativeMeetingId::from(native_meeting_id),
        meeting_url: None,
        config: BotConfig { language: None, task: Task::Transcribe, bot_name: "Notetaker".into() },
        session_uid: SessionUid::new(),
        created_at_ms,
    }
}

pub fn status_advanced_event(meeting_id: MeetingId, to: MeetingStatus, at_ms: u64) -> Event {
    Event::StatusAdvanced { meeting_id, to, at_ms, failure_reason: None }
}

pub fn touched_event(meeting_id: MeetingId, at_ms: u64) -> Event {
    Event::Touched { meeting_id, at_ms }
}
