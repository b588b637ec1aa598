// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use blm_core::{BotConfig, MeetingId, MeetingStatus, NativeMeetingId, Platform, SessionUid, Task, UserId};

fn reserve(state: &mut MaterializedState, meeting_id: MeetingId, user_id: &str, native: &str, at_ms: u64) {
    state.apply_event(&Event::MeetingReserved {
        meeting_id,
        user_id: UserId::from(user_id),
        platform: Platform::Zoom,
        native_meeting_id: NativeMeetingId::from(native),
        meeting_url: None,
        config: BotConfig { language: None, task: Task::Transcribe, bot_name: "Notetaker".into() },
        session_uid: SessionUid::new(),
        created_at_ms: at_ms,
    });
}

#[test]
fn reserve_then_read_has_reserved_status() {
    let mut state = MaterializedState::default();
    let id = MeetingId::new();
    reserve(&mut state, id, "u1", "n1", 100);

    let meeting = state.get_meeting(id.as_str()).unwrap();
    assert_eq!(meeting.status, MeetingStatus::Reserved);
    assert_eq!(meeting.updated_at, 100);
}

#[test]
fn reserve_is_idempotent_under_replay() {
    let mut state = MaterializedState::default();
    let id = MeetingId::new();
    let event = Event::MeetingReserved {
        meeting_id: id,
        user_id: UserId::from("u1"),
        platform: Platform::Zoom,
        native_meeting_id: NativeMeetingId::from("n1"),
        meeting_url: None,
        config: BotConfig { language: None, task: Task::Transcribe, bot_name: "Notetaker".into() },
        session_uid: SessionUid::new(),
        created_at_ms: 100,
    };
    state.apply_event(&event);
    state.apply_event(&Event::StatusAdvanced {
        meeting_id: id,
        to: MeetingStatus::Starting,
        at_ms: 200,
        failure_reason: None,
    });
    // Replaying the original reservation must not reset status back to reserved.
    state.apply_event(&event);

    assert_eq!(state.get_meeting(id.as_str()).unwrap().status, MeetingStatus::Starting);
}

#[test]
fn container_id_is_set_once() {
    let mut state = MaterializedState::default();
    let id = MeetingId::new();
    reserve(&mut state, id, "u1", "n1", 100);

    state.apply_event(&Event::ContainerSet {
        meeting_id: id,
        container_id: "c-1".to_string().into(),
    });
    state.apply_event(&Event::ContainerSet {
        meeting_id: id,
        container_id: "c-2".to_string().into(),
    });

    assert_eq!(state.get_meeting(id.as_str()).unwrap().bot_container_id.as_ref().unwrap().0, "c-1");
}

#[test]
fn end_time_set_iff_terminal() {
    let mut state = MaterializedState::default();
    let id = MeetingId::new();
    reserve(&mut state, id, "u1", "n1", 100);

    state.apply_event(&Event::StatusAdvanced {
        meeting_id: id,
        to: MeetingStatus::Starting,
        at_ms: 200,
        failure_reason: None,
    });
    assert!(state.get_meeting(id.as_str()).unwrap().end_time.is_none());

    state.apply_event(&Event::StatusAdvanced {
        meeting_id: id,
        to: MeetingStatus::Failed,
        at_ms: 300,
        failure_reason: Some("boom".to_string()),
    });
    let meeting = state.get_meeting(id.as_str()).unwrap();
    assert_eq!(meeting.end_time, Some(300));
    assert_eq!(meeting.failure_reason.as_deref(), Some("boom"));
}

#[test]
fn duplicate_exited_style_transition_is_idempotent() {
    let mut state = MaterializedState::default();
    let id = MeetingId::new();
    reserve(&mut state, id, "u1", "n1", 100);
    state.apply_event(&Event::StatusAdvanced {
        meeting_id: id,
        to: MeetingStatus::Failed,
        at_ms: 300,
        failure_reason: Some("boom".to_string()),
    });
    state.apply_event(&Event::StatusAdvanced {
        meeting_id: id,
        to: MeetingStatus::Failed,
        at_ms: 9_000,
        failure_reason: Some("different".to_string()),
    });

    let meeting = state.get_meeting(id.as_str()).unwrap();
    assert_eq!(meeting.end_time, Some(300));
    assert_eq!(meeting.failure_reason.as_deref(), Some("boom"));
}

#[test]
fn non_terminal_count_tracks_cap_usage() {
    let mut state = MaterializedState::default();
    reserve(&mut state, MeetingId::new(), "u1", "n1", 100);
    reserve(&mut state, MeetingId::new(), "u1", "n2", 100);
    reserve(&mut state, MeetingId::new(), "u2", "n3", 100);

    assert_eq!(state.non_terminal_count_for_user("u1"), 2);
    assert_eq!(state.non_terminal_count_for_user("u2"), 1);
}

#[test]
fn find_conflict_ignores_terminal_meetings() {
    let mut state = MaterializedState::default();
    let id = MeetingId::new();
    reserve(&mut state, id, "u1", "n1", 100);
    assert!(state.find_non_terminal_conflict("u1", Platform::Zoom, "n1").is_some());

    state.apply_event(&Event::StatusAdvanced {
        meeting_id: id,
        to: MeetingStatus::Failed,
        at_ms: 200,
        failure_reason: None,
    });
    assert!(state.find_non_terminal_conflict("u1", Platform::Zoom, "n1").is_none());
}

#[test]
fn session_upsert_is_idempotent_on_reconnect() {
    let mut state = MaterializedState::default();
    let id = MeetingId::new();
    reserve(&mut state, id, "u1", "n1", 100);
    let session_uid = SessionUid::new();

    state.apply_event(&Event::SessionUpserted {
        meeting_id: id,
        session_uid: session_uid.clone(),
        start_time_ms: 150,
    });
    state.apply_event(&Event::SessionUpserted {
        meeting_id: id,
        session_uid: session_uid.clone(),
        start_time_ms: 999,
    });

    assert_eq!(state.get_session(session_uid.as_str()).unwrap().session_start_time, 150);
    assert_eq!(state.get_meeting_by_session(session_uid.as_str()).unwrap().meeting_id, id);
}

#[test]
fn session_uid_for_meeting_is_available_before_first_callback() {
    let mut state = MaterializedState::default();
    let id = MeetingId::new();
    let event = Event::MeetingReserved {
        meeting_id: id,
        user_id: UserId::from("u1"),
        platform: Platform::Zoom,
        native_meeting_id: NativeMeetingId::from("n1"),
        meeting_url: None,
        config: BotConfig { language: None, task: Task::Transcribe, bot_name: "Notetaker".into() },
        session_uid: SessionUid::from("tok-1"),
        created_at_ms: 100,
    };
    state.apply_event(&event);
    assert_eq!(state.session_uid_for_meeting(id.as_str()).unwrap().as_str(), "tok-1");
}

#[test]
fn stale_in_status_respects_threshold() {
    let mut state = MaterializedState::default();
    let id = MeetingId::new();
    reserve(&mut state, id, "u1", "n1", 100);

    assert!(state.stale_in_status(MeetingStatus::Reserved, 100_100, 50_000).is_empty());
    assert_eq!(state.stale_in_status(MeetingStatus::Reserved, 200_000, 50_000).len(), 1);
}
