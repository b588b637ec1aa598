// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `GET /meetings`, `GET /meetings/{id}` (spec.md §6.2): read-only
//! operator views over C1.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use blm_core::{Meeting, MeetingId, Platform, UserId};
use serde::Deserialize;

use super::error::AppError;
use super::parse_status;
use crate::lifecycle::DaemonState;

#[derive(Debug, Deserialize)]
pub struct ListMeetingsQuery {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

pub async fn list_meetings(
    State(state): State<Arc<DaemonState>>,
    Query(query): Query<ListMeetingsQuery>,
) -> Result<Json<Vec<Meeting>>, AppError> {
    let platform = query
        .platform
        .map(|p| {
            Platform::parse(&p)
                .ok_or_else(|| blm_core::BlmError::InvalidRequest(format!("unknown platform {p}")))
        })
        .transpose()?;
    let status = query.status.map(|s| parse_status(&s)).transpose()?;

    let filter = blm_storage::ListFilter { user_id: query.user_id.map(UserId::from), platform, status };
    Ok(Json(state.gateway.list(&filter)))
}

pub async fn get_meeting(
    State(state): State<Arc<DaemonState>>,
    Path(id): Path<String>,
) -> Result<Json<Meeting>, AppError> {
    let meeting = state.gateway.read(MeetingId::from_string(id))?;
    Ok(Json(meeting))
}
