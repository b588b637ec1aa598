// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! C5 Lifecycle Coordinator (spec.md §4.5): the three operator-facing
//! entry points that create, stop, and reconfigure a bot attempt. None of
//! these block on worker startup; the worker's own callbacks (C6) and the
//! reaper (C7) carry the Meeting the rest of the way through its lifecycle.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use blm_adapters::{BotSpec, CommandBus, Orchestrator};
use blm_core::{
    BlmError, BlmResult, Clock, Command, Meeting, MeetingId, MeetingStatus, NativeMeetingId,
    Platform, UserId,
};
use blm_storage::{ListFilter, StateStoreGateway};

use crate::admission::AdmissionController;

/// Grace given to a container torn down as part of a failed `start_bot`,
/// before it's ever reached `active` and worth waiting longer for.
const TEARDOWN_GRACE: Duration = Duration::from_secs(5);

/// Wires C1 (via the admission controller), C2, and C3 together to realize
/// `start_bot`/`stop_bot`/`reconfigure_bot`.
pub struct LifecycleCoordinator<C: Clock, O: Orchestrator, B: CommandBus> {
    gateway: Arc<StateStoreGateway<C>>,
    admission: AdmissionController<C>,
    orchestrator: Arc<O>,
    bus: Arc<B>,
    callback_base_url: String,
}

impl<C: Clock, O: Orchestrator, B: CommandBus> LifecycleCoordinator<C, O, B> {
    pub fn new(
        gateway: Arc<StateStoreGateway<C>>,
        orchestrator: Arc<O>,
        bus: Arc<B>,
        callback_base_url: String,
    ) -> Self {
        let admission = AdmissionController::new(gateway.clone());
        Self { gateway, admission, orchestrator, bus, callback_base_url }
    }

    /// `start_bot(user_id, platform, native_meeting_id, config) -> { meeting_id }`.
    ///
    /// Admits the Meeting, then runs C3 through `create` and `start` and
    /// records the assigned container id. Any failure after admission
    /// transitions the row to `failed` and best-effort tears down whatever
    /// container may have been created, per spec.md §4.5 step 5.
    #[allow(clippy::too_many_arguments)]
    pub async fn start_bot(
        &self,
        user_id: UserId,
        max_concurrent_bots: u32,
        platform: Platform,
        native_meeting_id: NativeMeetingId,
        meeting_url: Option<String>,
        bot_name: String,
        language: Option<String>,
        task: Option<blm_core::Task>,
    ) -> BlmResult<MeetingId> {
        let (meeting_id, session_uid) = self.admission.admit(
            user_id,
            max_concurrent_bots,
            platform,
            native_meeting_id.clone(),
            meeting_url.clone(),
            bot_name,
            language,
            task,
        )?;

        let meeting = self.gateway.read(meeting_id)?;
        let spec = BotSpec {
            meeting_id,
            platform,
            native_meeting_id: &native_meeting_id,
            meeting_url: meeting_url.as_deref(),
            config: &meeting.config,
            session_uid: session_uid.as_str(),
            callback_base_url: &self.callback_base_url,
        };

        let container_id = match self.orchestrator.create(spec).await {
            Ok(container_id) => container_id,
            Err(e) => {
                tracing::warn!(%meeting_id, error = %e, "orchestrator create failed");
                self.fail_reserved(meeting_id, "orchestrator_create_failed");
                return Err(e);
            }
        };

        if let Err(e) = self.gateway.set_container(meeting_id, container_id.clone()) {
            tracing::error!(%meeting_id, error = %e, "set_container failed after create");
            let _ = self.orchestrator.stop(&container_id, TEARDOWN_GRACE).await;
            self.fail_reserved(meeting_id, "set_container_failed");
            return Err(e);
        }

        if let Err(e) = self.orchestrator.start(&container_id).await {
            tracing::error!(%meeting_id, %container_id, error = %e, "orchestrator start failed");
            let _ = self.orchestrator.stop(&container_id, TEARDOWN_GRACE).await;
            self.fail_reserved(meeting_id, "orchestrator_start_failed");
            return Err(e);
        }

        tracing::info!(%meeting_id, %container_id, "bot container started");
        Ok(meeting_id)
    }

    fn fail_reserved(&self, meeting_id: MeetingId, reason: &str) {
        if let Err(e) =
            self.gateway.advance_status(meeting_id, MeetingStatus::Failed, Some(reason.to_string()))
        {
            tracing::error!(%meeting_id, error = %e, "failed to mark meeting failed after start_bot error");
        }
    }

    /// `stop_bot(meeting_id) -> ok`: idempotent on terminal Meetings;
    /// otherwise publishes `Leave` and returns without touching `status` —
    /// that is the worker's callback's or the reaper's job (I2).
    pub async fn stop_bot(&self, meeting_id: MeetingId) -> BlmResult<()> {
        let meeting = self.gateway.read(meeting_id)?;
        if meeting.is_terminal() {
            return Ok(());
        }
        let session_uid = self.gateway.session_uid_for(meeting_id)?;
        self.bus.send(&session_uid, Command::Leave).await
    }

    /// `reconfigure_bot(meeting_id, partial_config) -> ok`. Rejects Meetings
    /// outside `{starting, active}`; the command bus conveys intent only,
    /// the Meeting row is updated once the worker acknowledges it (spec.md
    /// §9 Open Question).
    pub async fn reconfigure_bot(
        &self,
        meeting_id: MeetingId,
        partial_config: blm_core::PartialBotConfig,
    ) -> BlmResult<()> {
        let meeting = self.gateway.read(meeting_id)?;
        if !matches!(meeting.status, MeetingStatus::Starting | MeetingStatus::Active) {
            return Err(BlmError::IllegalState { meeting_id });
        }
        let session_uid = self.gateway.session_uid_for(meeting_id)?;
        self.bus.send(&session_uid, Command::Reconfigure(partial_config)).await
    }

    pub fn list_bots_for_user(&self, user_id: &UserId) -> Vec<Meeting> {
        self.gateway.list(&ListFilter { user_id: Some(user_id.clone()), platform: None, status: None })
    }

    pub fn get_meeting(&self, meeting_id: MeetingId) -> BlmResult<Meeting> {
        self.gateway.read(meeting_id)
    }

    pub fn get_active_count(&self, user_id: &UserId) -> u32 {
        self.gateway
            .list(&ListFilter { user_id: Some(user_id.clone()), platform: None, status: None })
            .iter()
            .filter(|m| m.status.is_non_terminal())
            .count() as u32
    }

    /// Delete orchestrator-managed resources that outlived their Meeting
    /// row's bookkeeping, e.g. a daemon crash between `create()` returning
    /// and `set_container` committing (spec.md §4.3 `cleanup_stale`).
    pub async fn cleanup_orphaned_containers(&self) {
        let known: HashSet<_> = self
            .gateway
            .list(&ListFilter::default())
            .into_iter()
            .filter_map(|m| m.bot_container_id)
            .collect();
        self.orchestrator.cleanup_stale(&known).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blm_adapters::{InMemoryCommandBus, LocalOrchestrator};
    use blm_core::FakeClock;
    use tempfile::tempdir;

    fn coordinator() -> LifecycleCoordinator<FakeClock, LocalOrchestrator, InMemoryCommandBus> {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.wal");
        std::mem::forget(dir);
        let gateway = Arc::new(
            StateStoreGateway::open(path, Default::default(), 0, FakeClock::new()).unwrap(),
        );
        LifecycleCoordinator::new(
            gateway,
            Arc::new(LocalOrchestrator::new()),
            Arc::new(InMemoryCommandBus::new()),
            "http://localhost:7420".to_string(),
        )
    }

    #[tokio::test]
    async fn start_bot_moves_reserved_to_failed_on_orchestrator_error() {
        std::env::set_var("BLM_BOT_COMMAND", "/nonexistent/blm-bot-worker-binary");
        let coordinator = coordinator();
        let err = coordinator
            .start_bot(
                UserId::from("u1"),
                1,
                Platform::Zoom,
                NativeMeetingId::from("n1"),
                None,
                "Notetaker".to_string(),
                None,
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BlmError::OrchestratorFailed(_)));
    }

    #[tokio::test]
    async fn stop_bot_is_idempotent_on_terminal_meeting() {
        let coordinator = coordinator();
        let (meeting_id, _) = coordinator
            .gateway
            .reserve(
                UserId::from("u1"),
                1,
                Platform::Zoom,
                NativeMeetingId::from("n1"),
                None,
                blm_core::BotConfig {
                    language: None,
                    task: blm_core::Task::Transcribe,
                    bot_name: "Notetaker".into(),
                },
            )
            .unwrap();
        coordinator.gateway.advance_status(meeting_id, MeetingStatus::Starting, None).unwrap();
        coordinator.gateway.advance_status(meeting_id, MeetingStatus::Failed, None).unwrap();
        coordinator.stop_bot(meeting_id).await.unwrap();
    }

    #[tokio::test]
    async fn reconfigure_bot_rejects_reserved_meeting() {
        let coordinator = coordinator();
        let (meeting_id, _) = coordinator
            .gateway
            .reserve(
                UserId::from("u1"),
                1,
                Platform::Zoom,
                NativeMeetingId::from("n1"),
                None,
                blm_core::BotConfig {
                    language: None,
                    task: blm_core::Task::Transcribe,
                    bot_name: "Notetaker".into(),
                },
            )
            .unwrap();
        let err = coordinator
            .reconfigure_bot(meeting_id, blm_core::PartialBotConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, BlmError::IllegalState { .. }));
    }
}
