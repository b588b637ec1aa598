// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! C6 Callback Ingress (spec.md §4.6): the worker-facing endpoints. Every
//! call carries a `session_uid`, which both identifies the Meeting and
//! serves as the bearer token — `StateStoreGateway::read_by_session`
//! returns `Unauthorized` for any value it doesn't recognize, which is the
//! entirety of the authentication check this component needs to do.

use blm_core::{BlmError, BlmResult, Clock, MeetingId, MeetingStatus, SessionUid};
use blm_storage::StateStoreGateway;

/// Handles the worker contract of spec.md §6: `started`, `joined`,
/// `heartbeat`, `status`, and `exited`. Every operation here is idempotent,
/// since the worker is expected to retry on any ambiguity (lost response,
/// reconnect).
pub struct CallbackIngress<C: Clock> {
    gateway: std::sync::Arc<StateStoreGateway<C>>,
}

impl<C: Clock> CallbackIngress<C> {
    pub fn new(gateway: std::sync::Arc<StateStoreGateway<C>>) -> Self {
        Self { gateway }
    }

    fn meeting_id_for(&self, session_uid: &SessionUid) -> BlmResult<MeetingId> {
        self.gateway.read_by_session(session_uid).map(|m| m.meeting_id)
    }

    /// `started(session_uid) -> ok`. Creates/reaffirms the MeetingSession
    /// row and advances `reserved -> starting`; a worker that calls this
    /// again while already past `reserved` (reconnect, retried callback)
    /// gets `ok` with no further effect.
    pub fn started(&self, session_uid: &SessionUid) -> BlmResult<()> {
        // Can't go through `meeting_id_for`/`read_by_session` here: that
        // looks the Meeting up via the `sessions` table, which `upsert_session`
        // below is the only thing that ever populates. The reservation-time
        // reverse index is the only lookup available before a worker's first
        // `started` call.
        let meeting_id = self.gateway.meeting_id_for_session_uid(session_uid)?;
        self.gateway.upsert_session(meeting_id, session_uid.clone())?;
        match self.gateway.advance_status(meeting_id, MeetingStatus::Starting, None) {
            Ok(()) => Ok(()),
            Err(BlmError::IllegalTransition { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// `joined(session_uid) -> ok`: `starting -> active`; already-`active`
    /// is a no-op.
    pub fn joined(&self, session_uid: &SessionUid) -> BlmResult<()> {
        let meeting_id = self.meeting_id_for(session_uid)?;
        match self.gateway.advance_status(meeting_id, MeetingStatus::Active, None) {
            Ok(()) => Ok(()),
            Err(BlmError::IllegalTransition { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// `heartbeat(session_uid) -> ok`. Workers send this roughly every
    /// 30 s while `active` or `stopping`.
    pub fn heartbeat(&self, session_uid: &SessionUid) -> BlmResult<()> {
        let meeting_id = self.meeting_id_for(session_uid)?;
        self.gateway.touch(meeting_id)
    }

    /// `status(session_uid, new_status)`: restricted to the one transition
    /// the worker legitimately owns, `active -> stopping`. Any other value
    /// is rejected outright rather than silently ignored.
    pub fn status(&self, session_uid: &SessionUid, new_status: MeetingStatus) -> BlmResult<()> {
        if new_status != MeetingStatus::Stopping {
            return Err(BlmError::InvalidRequest(format!(
                "worker may not set status to {new_status}"
            )));
        }
        let meeting_id = self.meeting_id_for(session_uid)?;
        self.gateway.advance_status(meeting_id, MeetingStatus::Stopping, None)
    }

    /// `exited(session_uid, exit_code, reason) -> ok`. Moves a non-terminal
    /// Meeting to `completed` (`exit_code == 0`) or `failed` (otherwise);
    /// a Meeting that's already terminal treats this as a duplicate
    /// callback and returns `ok`.
    pub fn exited(&self, session_uid: &SessionUid, exit_code: i32, reason: Option<String>) -> BlmResult<()> {
        let meeting = self.gateway.read_by_session(session_uid)?;
        if meeting.is_terminal() {
            return Ok(());
        }
        let (to, failure_reason) = if exit_code == 0 {
            (MeetingStatus::Completed, None)
        } else {
            (MeetingStatus::Failed, Some(reason.unwrap_or_else(|| format!("exit_code {exit_code}"))))
        };
        self.gateway.advance_status(meeting.meeting_id, to, failure_reason)
    }
}
