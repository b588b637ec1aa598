// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Kubernetes-backed orchestrator: one Pod per bot attempt.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use blm_core::{BlmError, BlmResult, BotContainerId};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EnvVar, HTTPGetAction, Pod, PodSpec, Probe,
};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::api::{Api, DeleteParams, ListParams, PostParams};
use kube::Client;

use super::{BotSpec, ExitResult, InspectResult, Orchestrator};
use crate::retry::RetryPolicy;

/// How often `wait_exit` re-polls the pod's status.
const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// The terminated state of a pod's single `bot` container, if it has one.
fn terminated_result(pod: &Pod) -> Option<ExitResult> {
    let statuses = pod.status.as_ref()?.container_statuses.as_ref()?;
    let terminated = statuses.first()?.state.as_ref()?.terminated.as_ref()?;
    Some(ExitResult { exit_code: terminated.exit_code, exit_reason: terminated.reason.clone() })
}

const LABEL_APP: &str = "app";
const LABEL_APP_VALUE: &str = "blm-bot";
const LABEL_MEETING: &str = "blm.dev/meeting-id";

fn k8s_namespace() -> String {
    std::env::var("BLM_K8S_NAMESPACE").unwrap_or_else(|_| "default".to_string())
}

fn image() -> String {
    std::env::var("BLM_BOT_IMAGE").unwrap_or_else(|_| "blm-bot:latest".to_string())
}

fn container_port() -> i32 {
    std::env::var("BLM_BOT_PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(8080)
}

/// The API server explicitly rejecting a request (bad spec, 409 conflict,
/// ...) is not worth retrying; anything else (connection refused, timeout,
/// transport-level failure) is the transient case spec.md §7 wants retried.
fn classify_kube_error(e: kube::Error) -> BlmError {
    match &e {
        kube::Error::Api(api_err) => BlmError::OrchestratorFailed(format!("{} ({})", e, api_err.code)),
        _ => BlmError::Unavailable(e.to_string()),
    }
}

fn env_var(name: &str, value: impl Into<String>) -> EnvVar {
    EnvVar { name: name.to_string(), value: Some(value.into()), ..Default::default() }
}

fn build_pod(pod_name: &str, namespace: &str, spec: &BotSpec<'_>) -> Pod {
    let port = container_port();
    let mut env = vec![
        env_var("BLM_CALLBACK_BASE_URL", spec.callback_base_url),
        env_var("BLM_SESSION_UID", spec.session_uid),
        env_var("BLM_MEETING_ID", spec.meeting_id.to_string()),
        env_var("BLM_PLATFORM", spec.platform.to_string()),
        env_var("BLM_NATIVE_MEETING_ID", spec.native_meeting_id.as_str()),
        env_var("BLM_BOT_NAME", spec.config.bot_name.clone()),
        env_var("BLM_TASK", spec.config.task.to_string()),
    ];
    if let Some(url) = spec.meeting_url {
        env.push(env_var("BLM_MEETING_URL", url));
    }
    if let Some(lang) = &spec.config.language {
        env.push(env_var("BLM_LANGUAGE", lang.clone()));
    }

    let container = Container {
        name: "bot".to_string(),
        image: Some(image()),
        ports: Some(vec![ContainerPort { container_port: port, ..Default::default() }]),
        env: Some(env),
        readiness_probe: Some(Probe {
            http_get: Some(HTTPGetAction {
                path: Some("/healthz".to_string()),
                port: IntOrString::Int(port),
                ..Default::default()
            }),
            period_seconds: Some(5),
            ..Default::default()
        }),
        liveness_probe: Some(Probe {
            http_get: Some(HTTPGetAction {
                path: Some("/healthz".to_string()),
                port: IntOrString::Int(port),
                ..Default::default()
            }),
            period_seconds: Some(30),
            ..Default::default()
        }),
        ..Default::default()
    };

    Pod {
        metadata: k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta {
            name: Some(pod_name.to_string()),
            namespace: Some(namespace.to_string()),
            labels: Some(
                [
                    (LABEL_APP.to_string(), LABEL_APP_VALUE.to_string()),
                    (LABEL_MEETING.to_string(), spec.meeting_id.to_string()),
                ]
                .into_iter()
                .collect(),
            ),
            ..Default::default()
        },
        spec: Some(PodSpec {
            containers: vec![container],
            restart_policy: Some("Never".to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Runs one bot per Kubernetes Pod, named `blm-bot-<meeting_id>`.
pub struct KubernetesOrchestrator {
    client: Client,
    retry: RetryPolicy,
}

impl KubernetesOrchestrator {
    pub async fn connect() -> BlmResult<Self> {
        let client = Client::try_default()
            .await
            .map_err(|e| BlmError::OrchestratorFailed(format!("kube client init: {e}")))?;
        Ok(Self { client, retry: RetryPolicy::default() })
    }

    fn pod_name(container_id: &BotContainerId) -> &str {
        &container_id.0
    }
}

#[async_trait]
impl Orchestrator for KubernetesOrchestrator {
    async fn create(&self, spec: BotSpec<'_>) -> BlmResult<BotContainerId> {
        let namespace = k8s_namespace();
        let pod_name = format!("blm-bot-{}", spec.meeting_id.suffix().to_lowercase());
        let pod = build_pod(&pod_name, &namespace, &spec);

        let pods: Api<Pod> = Api::namespaced(self.client.clone(), &namespace);
        self.retry
            .retry(|| async {
                pods.create(&PostParams::default(), &pod).await.map(|_| ()).map_err(classify_kube_error)
            })
            .await?;

        tracing::info!(meeting_id = %spec.meeting_id, %pod_name, %namespace, "created bot pod");
        Ok(BotContainerId(pod_name))
    }

    async fn start(&self, container_id: &BotContainerId) -> BlmResult<()> {
        // Pods run as soon as they're admitted; `start` is a readiness
        // check, idempotent on an already-running Pod.
        if self.inspect(container_id).await?.running {
            Ok(())
        } else {
            Err(BlmError::OrchestratorFailed(format!("pod {} not running after create", Self::pod_name(container_id))))
        }
    }

    async fn stop(&self, container_id: &BotContainerId, grace: Duration) -> BlmResult<()> {
        let namespace = k8s_namespace();
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), &namespace);
        let pod_name = Self::pod_name(container_id);
        let delete_params = DeleteParams { grace_period_seconds: Some(grace.as_secs() as u32), ..Default::default() };
        let result = self
            .retry
            .retry(|| async { pods.delete(pod_name, &delete_params).await.map(|_| ()).map_err(classify_kube_error) })
            .await;
        match result {
            Ok(()) => Ok(()),
            Err(BlmError::OrchestratorFailed(msg)) if msg.contains("404") => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn inspect(&self, container_id: &BotContainerId) -> BlmResult<InspectResult> {
        let namespace = k8s_namespace();
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), &namespace);
        let pod = match pods.get(Self::pod_name(container_id)).await {
            Ok(pod) => pod,
            Err(kube::Error::Api(api_err)) if api_err.code == 404 => {
                return Ok(InspectResult { running: false, exit_code: None, exit_reason: None })
            }
            Err(e) => return Err(classify_kube_error(e)),
        };
        if let Some(exit) = terminated_result(&pod) {
            return Ok(InspectResult { running: false, exit_code: Some(exit.exit_code), exit_reason: exit.exit_reason });
        }
        let running = pod
            .status
            .as_ref()
            .and_then(|s| s.phase.as_deref())
            .is_some_and(|phase| phase == "Running" || phase == "Pending");
        Ok(InspectResult { running, exit_code: None, exit_reason: None })
    }

    async fn wait_exit(&self, container_id: &BotContainerId, timeout: Duration) -> BlmResult<ExitResult> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let result = self.inspect(container_id).await?;
            if !result.running {
                return Ok(ExitResult { exit_code: result.exit_code.unwrap_or(-1), exit_reason: result.exit_reason });
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(BlmError::OrchestratorFailed(format!(
                    "pod {} did not exit within timeout",
                    Self::pod_name(container_id)
                )));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn cleanup_stale(&self, known: &HashSet<BotContainerId>) {
        let namespace = k8s_namespace();
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), &namespace);
        let lp = ListParams::default().labels(&format!("{LABEL_APP}={LABEL_APP_VALUE}"));
        let list = match pods.list(&lp).await {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!(error = %e, "failed to list pods for stale cleanup");
                return;
            }
        };
        for pod in list {
            let Some(name) = pod.metadata.name else { continue };
            if known.contains(&BotContainerId(name.clone())) {
                continue;
            }
            tracing::info!(pod = %name, "deleting orphaned bot pod");
            if let Err(e) = pods.delete(&name, &DeleteParams::default()).await {
                tracing::warn!(pod = %name, error = %e, "failed to delete orphaned pod");
            }
        }
    }
}
