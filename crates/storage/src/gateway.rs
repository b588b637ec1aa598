// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! C1 State Store Gateway: typed access to the Meeting and MeetingSession
//! tables with transactional reservation semantics (spec.md §4.1).

use std::path::PathBuf;
use std::sync::Arc;

use blm_core::{
    BlmError, BlmResult, BotConfig, BotContainerId, Clock, Event, Meeting, MeetingId,
    MeetingStatus, NativeMeetingId, Platform, SessionUid, Task, UserId,
};
use parking_lot::Mutex;

use crate::state::MaterializedState;
use crate::wal::Wal;

struct Inner {
    state: MaterializedState,
    wal: Wal,
}

/// Optional filters for `list` (spec.md §4.1 `list(filter)`).
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub user_id: Option<UserId>,
    pub platform: Option<Platform>,
    pub status: Option<MeetingStatus>,
}

impl ListFilter {
    fn matches(&self, m: &Meeting) -> bool {
        self.user_id.as_ref().is_none_or(|u| &m.user_id == u)
            && self.platform.is_none_or(|p| m.platform == p)
            && self.status.is_none_or(|s| m.status == s)
    }
}

/// Every operation below is one serialized unit: the gateway holds a single
/// mutex across the whole WAL-append-then-apply sequence, which is what
/// gives the "lock the User row" / "compare-and-set" language of spec.md
/// §4.1 and §5 its literal meaning here — there is exactly one writer.
pub struct StateStoreGateway<C: Clock> {
    inner: Mutex<Inner>,
    clock: C,
}

impl<C: Clock> StateStoreGateway<C> {
    /// Open (or create) the gateway backed by a WAL at `wal_path`, optionally
    /// seeded from a prior snapshot.
    pub fn open(
        wal_path: PathBuf,
        seed: MaterializedState,
        processed_seq: u64,
        clock: C,
    ) -> Result<Self, crate::wal::WalError> {
        let wal = Wal::open(wal_path, processed_seq)?;
        Ok(Self { inner: Mutex::new(Inner { state: seed, wal }), clock })
    }

    /// Replay every unprocessed WAL entry into `state`. Used at startup
    /// after loading a snapshot, and by tests constructing a gateway
    /// in-place over an existing WAL file.
    pub fn replay(&self) {
        let mut inner = self.inner.lock();
        loop {
            let Some(entry) = inner.wal.next_unprocessed().unwrap_or(None) else { break };
            inner.state.apply_event(&entry.event);
            inner.wal.mark_processed(entry.seq);
        }
    }

    fn append(&self, inner: &mut Inner, event: Event) -> BlmResult<()> {
        inner.wal.append(&event).map_err(|e| BlmError::Unavailable(e.to_string()))?;
        inner.wal.flush().map_err(|e| BlmError::Unavailable(e.to_string()))?;
        inner.state.apply_event(&event);
        Ok(())
    }

    /// Admit a new Meeting under `max_concurrent_bots` (I3). The caller
    /// (C4 Admission Controller) is responsible for resolving the user's
    /// cap; Users are consulted but not owned by the BLM (spec.md §3).
    pub fn reserve(
        &self,
        user_id: UserId,
        max_concurrent_bots: u32,
        platform: Platform,
        native_meeting_id: NativeMeetingId,
        meeting_url: Option<String>,
        config: BotConfig,
    ) -> BlmResult<(MeetingId, SessionUid)> {
        let mut inner = self.inner.lock();

        if inner.state.find_non_terminal_conflict(user_id.as_str(), platform, native_meeting_id.as_str()).is_some() {
            return Err(BlmError::Conflict);
        }
        if inner.state.non_terminal_count_for_user(user_id.as_str()) >= max_concurrent_bots {
            return Err(BlmError::LimitExceeded);
        }

        let meeting_id = MeetingId::new();
        let session_uid = SessionUid::new();
        let now_ms = self.clock.epoch_ms();

        self.append(
            &mut inner,
            Event::MeetingReserved {
                meeting_id,
                user_id,
                platform,
                native_meeting_id,
                meeting_url,
                config,
                session_uid: session_uid.clone(),
                created_at_ms: now_ms,
            },
        )?;

        Ok((meeting_id, session_uid))
    }

    /// Single-use: records the orchestrator-assigned container id (I4).
    pub fn set_container(&self, meeting_id: MeetingId, container_id: BotContainerId) -> BlmResult<()> {
        let mut inner = self.inner.lock();
        let meeting = inner.state.get_meeting(meeting_id.as_str()).ok_or(BlmError::NotFound)?;
        if let Some(existing) = &meeting.bot_container_id {
            if *existing == container_id {
                return Ok(());
            }
            return Err(BlmError::AlreadySet { meeting_id });
        }
        self.append(&mut inner, Event::ContainerSet { meeting_id, container_id })
    }

    /// Compare-and-set over the I1 DAG. Idempotent when `current == to`.
    pub fn advance_status(
        &self,
        meeting_id: MeetingId,
        to: MeetingStatus,
        failure_reason: Option<String>,
    ) -> BlmResult<()> {
        let mut inner = self.inner.lock();
        let meeting = inner.state.get_meeting(meeting_id.as_str()).ok_or(BlmError::NotFound)?;
        if meeting.status == to {
            return Ok(());
        }
        if !meeting.status.can_advance_to(to) {
            return Err(BlmError::IllegalTransition { meeting_id });
        }
        let now_ms = self.clock.epoch_ms();
        self.append(&mut inner, Event::StatusAdvanced { meeting_id, to, at_ms: now_ms, failure_reason })
    }

    /// Bumps `updated_at`. Used by heartbeats.
    pub fn touch(&self, meeting_id: MeetingId) -> BlmResult<()> {
        let mut inner = self.inner.lock();
        if inner.state.get_meeting(meeting_id.as_str()).is_none() {
            return Err(BlmError::NotFound);
        }
        let now_ms = self.clock.epoch_ms();
        self.append(&mut inner, Event::Touched { meeting_id, at_ms: now_ms })
    }

    /// Idempotent on `(meeting_id, session_uid)`.
    pub fn upsert_session(&self, meeting_id: MeetingId, session_uid: SessionUid) -> BlmResult<()> {
        let mut inner = self.inner.lock();
        if inner.state.get_meeting(meeting_id.as_str()).is_none() {
            return Err(BlmError::NotFound);
        }
        let now_ms = self.clock.epoch_ms();
        self.append(&mut inner, Event::SessionUpserted { meeting_id, session_uid, start_time_ms: now_ms })
    }

    /// Applies a worker-acknowledged config change (spec.md §9 Open
    /// Question: store accepted config by the next `joined`/`status` call).
    pub fn apply_config(&self, meeting_id: MeetingId, language: Option<String>, task: Task) -> BlmResult<()> {
        let mut inner = self.inner.lock();
        if inner.state.get_meeting(meeting_id.as_str()).is_none() {
            return Err(BlmError::NotFound);
        }
        self.append(&mut inner, Event::ConfigApplied { meeting_id, language, task })
    }

    pub fn read(&self, meeting_id: MeetingId) -> BlmResult<Meeting> {
        self.inner.lock().state.get_meeting(meeting_id.as_str()).cloned().ok_or(BlmError::NotFound)
    }

    /// Look up the Meeting for a `session_uid`, as every C6 callback must
    /// before doing anything else (token check + row lookup).
    pub fn read_by_session(&self, session_uid: &SessionUid) -> BlmResult<Meeting> {
        self.inner
            .lock()
            .state
            .get_meeting_by_session(session_uid.as_str())
            .cloned()
            .ok_or(BlmError::Unauthorized)
    }

    /// The `session_uid` assigned to `meeting_id` at reservation time, for
    /// callers (C5) that need to address the command bus before the
    /// worker's first callback has created the MeetingSession row.
    pub fn session_uid_for(&self, meeting_id: MeetingId) -> BlmResult<SessionUid> {
        self.inner
            .lock()
            .state
            .session_uid_for_meeting(meeting_id.as_str())
            .cloned()
            .ok_or(BlmError::NotFound)
    }

    /// The inverse of `session_uid_for`: the `meeting_id` a `session_uid` was
    /// assigned at reservation time. Used by C6's `started` handler, which
    /// only has a `session_uid` to work with and runs before any
    /// MeetingSession row (and thus before `read_by_session` would work) can
    /// exist.
    pub fn meeting_id_for_session_uid(&self, session_uid: &SessionUid) -> BlmResult<MeetingId> {
        self.inner
            .lock()
            .state
            .meeting_id_for_session_uid(session_uid.as_str())
            .ok_or(BlmError::Unauthorized)
    }

    pub fn list(&self, filter: &ListFilter) -> Vec<Meeting> {
        self.inner.lock().state.meetings.values().filter(|m| filter.matches(m)).cloned().collect()
    }

    /// C7 Reaper's stale scan (spec.md §4.7).
    pub fn scan_stale(&self, status: MeetingStatus, max_age_ms: u64) -> Vec<Meeting> {
        let now_ms = self.clock.epoch_ms();
        self.inner.lock().state.stale_in_status(status, now_ms, max_age_ms).into_iter().cloned().collect()
    }

    pub fn snapshot_state(&self) -> MaterializedState {
        self.inner.lock().state.clone()
    }

    pub fn processed_seq(&self) -> u64 {
        self.inner.lock().wal.processed_seq()
    }

    pub fn flush(&self) -> BlmResult<()> {
        self.inner.lock().wal.flush().map_err(|e| BlmError::Unavailable(e.to_string()))
    }
}

/// Shareable handle, since the gateway is injected into several components
/// (C4, C5, C6, C7) that each need concurrent access.
pub type SharedGateway<C> = Arc<StateStoreGateway<C>>;

#[cfg(test)]
mod tests {
    use super::*;
    use blm_core::{FakeClock, Task};
    use tempfile::tempdir;

    fn test_gateway() -> StateStoreGateway<FakeClock> {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.wal");
        std::mem::forget(dir); // keep the tempdir alive for the test's duration
        StateStoreGateway::open(path, MaterializedState::default(), 0, FakeClock::new()).unwrap()
    }

    fn cfg() -> BotConfig {
        BotConfig { language: None, task: Task::Transcribe, bot_name: "Notetaker".into() }
    }

    #[test]
    fn reserve_respects_concurrency_cap() {
        let gw = test_gateway();
        gw.reserve(UserId::from("u1"), 1, Platform::Zoom, NativeMeetingId::from("n1"), None, cfg()).unwrap();
        let err = gw
            .reserve(UserId::from("u1"), 1, Platform::Zoom, NativeMeetingId::from("n2"), None, cfg())
            .unwrap_err();
        assert_eq!(err, BlmError::LimitExceeded);
    }

    #[test]
    fn reserve_rejects_duplicate_non_terminal_request() {
        let gw = test_gateway();
        gw.reserve(UserId::from("u1"), 5, Platform::Zoom, NativeMeetingId::from("n1"), None, cfg()).unwrap();
        let err = gw
            .reserve(UserId::from("u1"), 5, Platform::Zoom, NativeMeetingId::from("n1"), None, cfg())
            .unwrap_err();
        assert_eq!(err, BlmError::Conflict);
    }

    #[test]
    fn set_container_is_single_use() {
        let gw = test_gateway();
        let (meeting_id, _) =
            gw.reserve(UserId::from("u1"), 1, Platform::Zoom, NativeMeetingId::from("n1"), None, cfg()).unwrap();

        gw.set_container(meeting_id, BotContainerId("c-1".into())).unwrap();
        let err = gw.set_container(meeting_id, BotContainerId("c-2".into())).unwrap_err();
        assert!(matches!(err, BlmError::AlreadySet { .. }));
        assert_eq!(gw.read(meeting_id).unwrap().bot_container_id.unwrap().0, "c-1");
    }

    #[test]
    fn advance_status_rejects_illegal_edges() {
        let gw = test_gateway();
        let (meeting_id, _) =
            gw.reserve(UserId::from("u1"), 1, Platform::Zoom, NativeMeetingId::from("n1"), None, cfg()).unwrap();

        let err = gw.advance_status(meeting_id, MeetingStatus::Active, None).unwrap_err();
        assert!(matches!(err, BlmError::IllegalTransition { .. }));
    }

    #[test]
    fn advance_status_is_idempotent_on_same_target() {
        let gw = test_gateway();
        let (meeting_id, _) =
            gw.reserve(UserId::from("u1"), 1, Platform::Zoom, NativeMeetingId::from("n1"), None, cfg()).unwrap();

        gw.advance_status(meeting_id, MeetingStatus::Starting, None).unwrap();
        gw.advance_status(meeting_id, MeetingStatus::Starting, None).unwrap();
        assert_eq!(gw.read(meeting_id).unwrap().status, MeetingStatus::Starting);
    }

    #[test]
    fn session_uid_for_is_set_at_reservation_time() {
        let gw = test_gateway();
        let (meeting_id, session_uid) =
            gw.reserve(UserId::from("u1"), 1, Platform::Zoom, NativeMeetingId::from("n1"), None, cfg()).unwrap();
        assert_eq!(gw.session_uid_for(meeting_id).unwrap(), session_uid);
    }

    #[test]
    fn read_by_session_requires_known_session_uid() {
        let gw = test_gateway();
        let err = gw.read_by_session(&SessionUid::new()).unwrap_err();
        assert_eq!(err, BlmError::Unauthorized);
    }

    #[test]
    fn meeting_id_for_session_uid_works_before_any_session_row_exists() {
        let gw = test_gateway();
        let (meeting_id, session_uid) =
            gw.reserve(UserId::from("u1"), 1, Platform::Zoom, NativeMeetingId::from("n1"), None, cfg()).unwrap();

        // No MeetingSession row has been created yet (that only happens via
        // `upsert_session`), so `read_by_session` can't find this meeting,
        // but the reservation-time reverse index can.
        assert!(gw.read_by_session(&session_uid).is_err());
        assert_eq!(gw.meeting_id_for_session_uid(&session_uid).unwrap(), meeting_id);
    }

    #[test]
    fn meeting_id_for_session_uid_rejects_unknown_session() {
        let gw = test_gateway();
        let err = gw.meeting_id_for_session_uid(&SessionUid::new()).unwrap_err();
        assert_eq!(err, BlmError::Unauthorized);
    }
}
