// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `POST /bots`, `DELETE /bots/{platform}/{native_meeting_id}`,
//! `PATCH /bots/{platform}/{native_meeting_id}/config` (spec.md §6.2).
//!
//! User identity is assumed pre-resolved upstream (spec.md §9 Non-goal:
//! "authentication of end users"); it and the caller's concurrency cap
//! arrive as headers rather than body fields.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use blm_core::{BlmError, Meeting, MeetingId, MeetingStatus, NativeMeetingId, Platform, Task, UserId};
use serde::{Deserialize, Serialize};

use super::error::AppError;
use crate::lifecycle::DaemonState;

fn user_id_from_headers(headers: &HeaderMap) -> Result<UserId, AppError> {
    headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(UserId::from)
        .ok_or(AppError(BlmError::Unauthorized))
}

fn max_concurrent_bots_from_headers(headers: &HeaderMap) -> u32 {
    headers
        .get("x-max-concurrent-bots")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(1)
}

#[derive(Debug, Deserialize)]
pub struct StartBotRequest {
    pub platform: String,
    pub native_meeting_id: String,
    pub bot_name: String,
    #[serde(default)]
    pub meeting_url: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub task: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StartBotResponse {
    pub meeting_id: MeetingId,
    pub status: MeetingStatus,
}

pub async fn start_bot(
    State(state): State<Arc<DaemonState>>,
    headers: HeaderMap,
    Json(body): Json<StartBotRequest>,
) -> Result<(StatusCode, Json<StartBotResponse>), AppError> {
    let user_id = user_id_from_headers(&headers)?;
    let max_concurrent_bots = max_concurrent_bots_from_headers(&headers);

    let platform = Platform::parse(&body.platform)
        .ok_or_else(|| AppError(BlmError::InvalidRequest(format!("unknown platform {}", body.platform))))?;
    let task = body
        .task
        .map(|t| Task::parse(&t).ok_or_else(|| BlmError::InvalidRequest(format!("unknown task {t}"))))
        .transpose()?;

    let meeting_id = state
        .coordinator
        .start_bot(
            user_id,
            max_concurrent_bots,
            platform,
            NativeMeetingId::from(body.native_meeting_id),
            body.meeting_url,
            body.bot_name,
            body.language,
            task,
        )
        .await?;
    let status = state.coordinator.get_meeting(meeting_id)?.status;

    Ok((StatusCode::OK, Json(StartBotResponse { meeting_id, status })))
}

/// Neither `StateStoreGateway` nor `ListFilter` can look a Meeting up by
/// `(platform, native_meeting_id)` alone (there is no secondary index),
/// so this scans the platform-filtered list for the first non-terminal
/// match — bounded by one user's/platform's concurrency, never unbounded.
fn find_non_terminal(state: &DaemonState, platform: Platform, native_meeting_id: &str) -> Result<Meeting, AppError> {
    state
        .gateway
        .list(&blm_storage::ListFilter { platform: Some(platform), ..Default::default() })
        .into_iter()
        .find(|m| m.native_meeting_id.as_str() == native_meeting_id && m.status.is_non_terminal())
        .ok_or(AppError(BlmError::NotFound))
}

pub async fn stop_bot(
    State(state): State<Arc<DaemonState>>,
    Path((platform, native_meeting_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let platform = Platform::parse(&platform)
        .ok_or_else(|| AppError(BlmError::InvalidRequest(format!("unknown platform {platform}"))))?;
    let meeting = find_non_terminal(&state, platform, &native_meeting_id)?;
    state.coordinator.stop_bot(meeting.meeting_id).await?;
    Ok(StatusCode::ACCEPTED)
}

#[derive(Debug, Deserialize)]
pub struct ReconfigureBotRequest {
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub task: Option<String>,
}

pub async fn reconfigure_bot(
    State(state): State<Arc<DaemonState>>,
    Path((platform, native_meeting_id)): Path<(String, String)>,
    Json(body): Json<ReconfigureBotRequest>,
) -> Result<StatusCode, AppError> {
    let platform = Platform::parse(&platform)
        .ok_or_else(|| AppError(BlmError::InvalidRequest(format!("unknown platform {platform}"))))?;
    let meeting = find_non_terminal(&state, platform, &native_meeting_id)?;

    let task = body
        .task
        .map(|t| Task::parse(&t).ok_or_else(|| BlmError::InvalidRequest(format!("unknown task {t}"))))
        .transpose()?;
    let partial = blm_core::PartialBotConfig { language: body.language, task };

    state.coordinator.reconfigure_bot(meeting.meeting_id, partial).await?;
    Ok(StatusCode::ACCEPTED)
}
