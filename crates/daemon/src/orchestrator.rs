// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestrator backend selection (spec.md §6.4 `ORCH_KIND`).

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use blm_adapters::{BotSpec, ExitResult, InspectResult, KubernetesOrchestrator, LocalOrchestrator, Orchestrator};
use blm_core::{BlmResult, BotContainerId};

use crate::config::OrchestratorKind;

/// Dispatches to one of the two orchestrator backends chosen at startup. A
/// plain enum rather than a trait object: `Orchestrator`'s async methods are
/// already boxed by `async_trait`, so matching on a closed set of two
/// backends costs nothing extra and keeps `LifecycleCoordinator` monomorphic.
pub enum OrchestratorHandle {
    Local(LocalOrchestrator),
    Kubernetes(KubernetesOrchestrator),
}

impl OrchestratorHandle {
    pub async fn connect(kind: OrchestratorKind) -> BlmResult<Self> {
        Ok(match kind {
            OrchestratorKind::Local => Self::Local(LocalOrchestrator::new()),
            OrchestratorKind::Cluster => Self::Kubernetes(KubernetesOrchestrator::connect().await?),
        })
    }
}

#[async_trait]
impl Orchestrator for OrchestratorHandle {
    async fn create(&self, spec: BotSpec<'_>) -> BlmResult<BotContainerId> {
        match self {
            Self::Local(o) => o.create(spec).await,
            Self::Kubernetes(o) => o.create(spec).await,
        }
    }

    async fn start(&self, container_id: &BotContainerId) -> BlmResult<()> {
        match self {
            Self::Local(o) => o.start(container_id).await,
            Self::Kubernetes(o) => o.start(container_id).await,
        }
    }

    async fn stop(&self, container_id: &BotContainerId, grace: Duration) -> BlmResult<()> {
        match self {
            Self::Local(o) => o.stop(container_id, grace).await,
            Self::Kubernetes(o) => o.stop(container_id, grace).await,
        }
    }

    async fn inspect(&self, container_id: &BotContainerId) -> BlmResult<InspectResult> {
        match self {
            Self::Local(o) => o.inspect(container_id).await,
            Self::Kubernetes(o) => o.inspect(container_id).await,
        }
    }

    async fn wait_exit(&self, container_id: &BotContainerId, timeout: Duration) -> BlmResult<ExitResult> {
        match self {
            Self::Local(o) => o.wait_exit(container_id, timeout).await,
            Self::Kubernetes(o) => o.wait_exit(container_id, timeout).await,
        }
    }

    async fn cleanup_stale(&self, known: &HashSet<BotContainerId>) {
        match self {
            Self::Local(o) => o.cleanup_stale(known).await,
            Self::Kubernetes(o) => o.cleanup_stale(known).await,
        }
    }
}
