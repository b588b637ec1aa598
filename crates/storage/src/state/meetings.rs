// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Meeting event handlers.

use blm_core::{Event, Meeting};

use super::MaterializedState;

pub(crate) fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::MeetingReserved {
            meeting_id,
            user_id,
            platform,
            native_meeting_id,
            meeting_url,
            config,
            session_uid,
            created_at_ms,
        } => {
            state.session_uid_by_meeting.entry(meeting_id.to_string()).or_insert_with(|| session_uid.clone());

            // Idempotency: a replayed reservation must not clobber a
            // Meeting that has since advanced past `reserved`.
            if state.meetings.contains_key(meeting_id.as_str()) {
                return;
            }
            let meeting = Meeting::new(
                *meeting_id,
                user_id.clone(),
                *platform,
                native_meeting_id.clone(),
                meeting_url.clone(),
                config.clone(),
                *created_at_ms,
            );
            state.meetings.insert(meeting_id.to_string(), meeting);
        }

        Event::ContainerSet { meeting_id, container_id } => {
            if let Some(meeting) = state.meetings.get_mut(meeting_id.as_str()) {
                // I4: set exactly once. A replay of the same event, or a
                // stray second call, must not rewrite it.
                if meeting.bot_container_id.is_none() {
                    meeting.bot_container_id = Some(container_id.clone());
                }
            }
        }

        Event::StatusAdvanced { meeting_id, to, at_ms, failure_reason } => {
            if let Some(meeting) = state.meetings.get_mut(meeting_id.as_str()) {
                // Idempotent: a replayed or duplicated transition to the
                // status we're already in is a no-op beyond the timestamp.
                if meeting.status == *to {
                    meeting.updated_at = (*at_ms).max(meeting.updated_at);
                    return;
                }
                meeting.status = *to;
                meeting.updated_at = *at_ms;
                if *to == blm_core::MeetingStatus::Starting && meeting.start_time.is_none() {
                    meeting.start_time = Some(*at_ms);
                }
                if to.is_terminal() {
                    meeting.end_time.get_or_insert(*at_ms);
                    if failure_reason.is_some() {
                        meeting.failure_reason.clone_from(failure_reason);
                    }
                }
            }
        }

        Event::Touched { meeting_id, at_ms } => {
            if let Some(meeting) = state.meetings.get_mut(meeting_id.as_str()) {
                meeting.updated_at = (*at_ms).max(meeting.updated_at);
            }
        }

        Event::ConfigApplied { meeting_id, language, task } => {
            if let Some(meeting) = state.meetings.get_mut(meeting_id.as_str()) {
                meeting.config.language.clone_from(language);
                meeting.config.task = *task;
            }
        }

        Event::SessionUpserted { .. } => {}
    }
}
