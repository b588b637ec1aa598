// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! C3 Container Orchestrator Adapter (spec.md §4.3).

mod kubernetes;
mod local;

pub use kubernetes::KubernetesOrchestrator;
pub use local::LocalOrchestrator;

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use blm_core::{BlmResult, BotConfig, BotContainerId, MeetingId, NativeMeetingId, Platform};

/// Everything C5 needs to ask a bot container to be created.
pub struct BotSpec<'a> {
    pub meeting_id: MeetingId,
    pub platform: Platform,
    pub native_meeting_id: &'a NativeMeetingId,
    pub meeting_url: Option<&'a str>,
    pub config: &'a BotConfig,
    /// The bearer token the worker presents on every callback.
    pub session_uid: &'a str,
    /// Base URL of the callback ingress the worker reports to.
    pub callback_base_url: &'a str,
}

/// Result of `Orchestrator::inspect`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectResult {
    pub running: bool,
    pub exit_code: Option<i32>,
    pub exit_reason: Option<String>,
}

/// Result of `Orchestrator::wait_exit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitResult {
    pub exit_code: i32,
    pub exit_reason: Option<String>,
}

/// Creates, starts, stops, and inspects bot containers: the capability set
/// `{ create, start, stop, inspect, wait_exit }` (spec.md §4.3).
/// Implementations talk to whatever runtime actually hosts the worker
/// process (K8s, a local process backend for development).
#[async_trait]
pub trait Orchestrator: Send + Sync + 'static {
    /// Create a new container for `spec`, in resource requirements
    /// deterministic from `spec` alone. Errors are reported as
    /// `BlmError::OrchestratorFailed`; the caller (C5) transitions the
    /// Meeting to `failed` on error (I1's Reserved -> Failed edge).
    async fn create(&self, spec: BotSpec<'_>) -> BlmResult<BotContainerId>;

    /// Start `container_id` running. Idempotent on an already-running
    /// container.
    async fn start(&self, container_id: &BotContainerId) -> BlmResult<()>;

    /// Request graceful termination of `container_id`, allowing up to
    /// `grace` before forcing it. Idempotent: stopping an already-stopped
    /// container is not an error.
    async fn stop(&self, container_id: &BotContainerId, grace: Duration) -> BlmResult<()>;

    /// Point-in-time liveness and exit status, with no blocking wait.
    async fn inspect(&self, container_id: &BotContainerId) -> BlmResult<InspectResult>;

    /// Suspend until `container_id` exits or `timeout` elapses (spec.md §5
    /// suspension point).
    async fn wait_exit(&self, container_id: &BotContainerId, timeout: Duration) -> BlmResult<ExitResult>;

    /// Best-effort liveness probe built on `inspect`, used by C7's reaper to
    /// distinguish a stuck worker from one that silently exited.
    async fn is_alive(&self, container_id: &BotContainerId) -> bool {
        self.inspect(container_id).await.map(|r| r.running).unwrap_or(false)
    }

    /// Delete any orchestrator-managed resource not in `known` — containers
    /// left behind by a daemon crash between `create()` returning and
    /// `set_container` committing.
    async fn cleanup_stale(&self, known: &HashSet<BotContainerId>);
}
