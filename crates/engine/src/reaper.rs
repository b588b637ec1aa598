// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! C7 Reaper (spec.md §4.7): periodically fails Meetings that have been
//! stuck in a non-terminal status for longer than that status's configured
//! staleness threshold, and best-effort tears down their container.

use std::sync::Arc;
use std::time::Duration;

use blm_adapters::Orchestrator;
use blm_core::{Clock, MeetingStatus};
use blm_storage::StateStoreGateway;

/// The five threshold knobs of spec.md §4.7/§6, each as a duration rather
/// than already-multiplied milliseconds so callers can read env vars in
/// seconds and not worry about the conversion.
#[derive(Debug, Clone, Copy)]
pub struct ReapThresholds {
    pub t_reap: Duration,
    pub t_reserve_stale: Duration,
    pub t_starting_stale: Duration,
    pub t_heartbeat_stale: Duration,
    pub t_stopping_stale: Duration,
    /// How long `stop` gives a reaped container to exit gracefully before
    /// the orchestrator is allowed to force-kill it.
    pub stop_grace: Duration,
}

impl Default for ReapThresholds {
    fn default() -> Self {
        Self {
            t_reap: Duration::from_secs(60),
            t_reserve_stale: Duration::from_secs(5 * 60),
            t_starting_stale: Duration::from_secs(10 * 60),
            t_heartbeat_stale: Duration::from_secs(2 * 60),
            t_stopping_stale: Duration::from_secs(5 * 60),
            stop_grace: Duration::from_secs(5),
        }
    }
}

pub struct Reaper<C: Clock, O: Orchestrator> {
    gateway: Arc<StateStoreGateway<C>>,
    orchestrator: Arc<O>,
    thresholds: ReapThresholds,
}

impl<C: Clock, O: Orchestrator> Reaper<C, O> {
    pub fn new(gateway: Arc<StateStoreGateway<C>>, orchestrator: Arc<O>, thresholds: ReapThresholds) -> Self {
        Self { gateway, orchestrator, thresholds }
    }

    /// Spawns the periodic tick loop on the current Tokio runtime. Returns
    /// a handle the caller can abort at shutdown; the loop itself has no
    /// exit condition beyond that (the reaper runs for the daemon's life).
    pub fn spawn(self: Arc<Self>) -> tokio::task::JoinHandle<()>
    where
        C: 'static,
        O: 'static,
    {
        let period = self.thresholds.t_reap;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                self.tick().await;
            }
        })
    }

    /// One pass over every non-terminal status bucket. Interruptible at
    /// this granularity only (spec.md §5): a tick always runs to
    /// completion once started.
    pub async fn tick(&self) {
        self.reap_bucket(MeetingStatus::Reserved, self.thresholds.t_reserve_stale, "startup_timeout").await;
        self.reap_bucket(MeetingStatus::Starting, self.thresholds.t_starting_stale, "join_timeout").await;
        self.reap_bucket(MeetingStatus::Active, self.thresholds.t_heartbeat_stale, "heartbeat_lost").await;
        self.reap_bucket(MeetingStatus::Stopping, self.thresholds.t_stopping_stale, "shutdown_timeout").await;
    }

    async fn reap_bucket(&self, status: MeetingStatus, max_age: Duration, reason: &str) {
        let stale = self.gateway.scan_stale(status, max_age.as_millis() as u64);
        for meeting in stale {
            tracing::warn!(meeting_id = %meeting.meeting_id, %status, reason, "reaping stale meeting");
            if let Err(e) = self.gateway.advance_status(
                meeting.meeting_id,
                MeetingStatus::Failed,
                Some(reason.to_string()),
            ) {
                tracing::error!(meeting_id = %meeting.meeting_id, error = %e, "reaper advance_status failed");
                continue;
            }
            if let Some(container_id) = &meeting.bot_container_id {
                if let Err(e) = self.orchestrator.stop(container_id, self.thresholds.stop_grace).await {
                    tracing::warn!(meeting_id = %meeting.meeting_id, error = %e, "reaper stop failed");
                }
            }
        }
    }
}
