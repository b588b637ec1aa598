// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local process orchestrator, for development and integration tests: runs
//! the worker as a plain child process instead of a container.

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use blm_core::{BlmError, BlmResult, BotContainerId};
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use parking_lot::Mutex;
use tokio::process::Child;

use super::{ExitResult, InspectResult};

/// How often `wait_exit` re-checks the child while it's still running.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

fn worker_command() -> String {
    std::env::var("BLM_BOT_COMMAND").unwrap_or_else(|_| "blm-bot-worker".to_string())
}

/// Tracks spawned child processes by the `local-<pid>` container id handed
/// back from `create`.
#[derive(Default)]
pub struct LocalOrchestrator {
    children: Arc<Mutex<HashMap<String, Child>>>,
}

impl LocalOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    fn pid_of(container_id: &BotContainerId) -> BlmResult<Pid> {
        container_id
            .0
            .strip_prefix("local-")
            .and_then(|s| s.parse::<i32>().ok())
            .map(Pid::from_raw)
            .ok_or_else(|| BlmError::OrchestratorFailed(format!("bad container id: {}", container_id.0)))
    }
}

#[async_trait]
impl super::Orchestrator for LocalOrchestrator {
    async fn create(&self, spec: super::BotSpec<'_>) -> BlmResult<BotContainerId> {
        let mut cmd = tokio::process::Command::new(worker_command());
        cmd.env("BLM_CALLBACK_BASE_URL", spec.callback_base_url)
            .env("BLM_SESSION_UID", spec.session_uid)
            .env("BLM_MEETING_ID", spec.meeting_id.to_string())
            .env("BLM_PLATFORM", spec.platform.to_string())
            .env("BLM_NATIVE_MEETING_ID", spec.native_meeting_id.as_str())
            .env("BLM_BOT_NAME", &spec.config.bot_name)
            .env("BLM_TASK", spec.config.task.to_string())
            .kill_on_drop(true);
        if let Some(url) = spec.meeting_url {
            cmd.env("BLM_MEETING_URL", url);
        }
        if let Some(lang) = &spec.config.language {
            cmd.env("BLM_LANGUAGE", lang);
        }

        let child = cmd
            .spawn()
            .map_err(|e| BlmError::OrchestratorFailed(format!("spawn failed: {e}")))?;
        let pid = child.id().ok_or_else(|| {
            BlmError::OrchestratorFailed("spawned process has no pid".to_string())
        })?;
        let container_id = BotContainerId(format!("local-{pid}"));
        self.children.lock().insert(container_id.0.clone(), child);
        tracing::info!(meeting_id = %spec.meeting_id, %pid, "spawned local bot process");
        Ok(container_id)
    }

    async fn start(&self, container_id: &BotContainerId) -> BlmResult<()> {
        // The child process is already running once `create` returns;
        // `start` here is a readiness check, idempotent on a process that's
        // still alive.
        if self.inspect(container_id).await?.running {
            Ok(())
        } else {
            Err(BlmError::OrchestratorFailed(format!("{} exited before start", container_id.0)))
        }
    }

    async fn stop(&self, container_id: &BotContainerId, grace: Duration) -> BlmResult<()> {
        let pid = Self::pid_of(container_id)?;
        // SIGTERM first so the worker can flush and exit cleanly; escalate
        // to SIGKILL only if it's still alive after `grace`.
        let _ = signal::kill(pid, Signal::SIGTERM);
        let deadline = tokio::time::Instant::now() + grace;
        while self.inspect(container_id).await?.running {
            if tokio::time::Instant::now() >= deadline {
                let _ = signal::kill(pid, Signal::SIGKILL);
                break;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
        self.children.lock().remove(&container_id.0);
        Ok(())
    }

    async fn inspect(&self, container_id: &BotContainerId) -> BlmResult<InspectResult> {
        let mut children = self.children.lock();
        match children.get_mut(&container_id.0) {
            Some(child) => match child.try_wait() {
                Ok(None) => Ok(InspectResult { running: true, exit_code: None, exit_reason: None }),
                Ok(Some(status)) => Ok(InspectResult {
                    running: false,
                    exit_code: status.code(),
                    exit_reason: (!status.success()).then(|| format!("exited with {status}")),
                }),
                Err(e) => Err(BlmError::OrchestratorFailed(format!("wait failed: {e}"))),
            },
            None => Ok(InspectResult { running: false, exit_code: None, exit_reason: None }),
        }
    }

    async fn wait_exit(&self, container_id: &BotContainerId, timeout: Duration) -> BlmResult<ExitResult> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let result = self.inspect(container_id).await?;
            if !result.running {
                return Ok(ExitResult {
                    exit_code: result.exit_code.unwrap_or(-1),
                    exit_reason: result.exit_reason,
                });
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(BlmError::OrchestratorFailed(format!("{} did not exit within timeout", container_id.0)));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn cleanup_stale(&self, known: &HashSet<BotContainerId>) {
        let stale: Vec<String> = {
            let children = self.children.lock();
            children.keys().filter(|id| !known.contains(&BotContainerId((*id).clone()))).cloned().collect()
        };
        for id in stale {
            let _ = self.stop(&BotContainerId(id), Duration::from_secs(5)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::{BotSpec, Orchestrator};
    use blm_core::{BotConfig, MeetingId, NativeMeetingId, Platform, Task};

    fn cfg() -> BotConfig {
        BotConfig { language: None, task: Task::Transcribe, bot_name: "Notetaker".into() }
    }

    #[tokio::test]
    async fn create_then_stop_is_idempotent() {
        std::env::set_var("BLM_BOT_COMMAND", "sleep");
        let orch = LocalOrchestrator::new();
        let meeting_id = MeetingId::new();
        let native = NativeMeetingId::from("n1");
        let config = cfg();
        let spec = BotSpec {
            meeting_id,
            platform: Platform::Zoom,
            native_meeting_id: &native,
            meeting_url: None,
            config: &config,
            session_uid: "tok",
            callback_base_url: "http://localhost:9",
        };
        let container_id = orch.create(spec).await.unwrap();
        orch.stop(&container_id, Duration::from_millis(50)).await.unwrap();
        orch.stop(&container_id, Duration::from_millis(50)).await.unwrap();
    }

    #[tokio::test]
    async fn inspect_reports_exit_code_after_process_exits() {
        std::env::set_var("BLM_BOT_COMMAND", "true");
        let orch = LocalOrchestrator::new();
        let meeting_id = MeetingId::new();
        let native = NativeMeetingId::from("n1");
        let config = cfg();
        let spec = BotSpec {
            meeting_id,
            platform: Platform::Zoom,
            native_meeting_id: &native,
            meeting_url: None,
            config: &config,
            session_uid: "tok",
            callback_base_url: "http://localhost:9",
        };
        let container_id = orch.create(spec).await.unwrap();
        let result = orch.wait_exit(&container_id, Duration::from_secs(5)).await.unwrap();
        assert_eq!(result.exit_code, 0);

        let inspect = orch.inspect(&container_id).await.unwrap();
        assert!(!inspect.running);
        assert_eq!(inspect.exit_code, Some(0));
    }
}
