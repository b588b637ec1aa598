// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Axum HTTP/WS server: the operator-facing REST surface (spec.md §6.2) and
//! the worker-facing callback ingress (spec.md §6.1).

pub mod bots;
pub mod callback;
mod error;
pub mod meetings;

use std::sync::Arc;

use axum::routing::{delete, get, patch, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::lifecycle::DaemonState;

pub use error::AppError;

/// `MeetingStatus` has no `.parse()` counterpart to `Platform`/`Task`
/// (it isn't wire input anywhere in the storage layer), so query-string and
/// callback-body status values are parsed here instead.
pub(crate) fn parse_status(s: &str) -> Result<blm_core::MeetingStatus, blm_core::BlmError> {
    use blm_core::MeetingStatus::*;
    match s {
        "reserved" => Ok(Reserved),
        "starting" => Ok(Starting),
        "active" => Ok(Active),
        "stopping" => Ok(Stopping),
        "completed" => Ok(Completed),
        "failed" => Ok(Failed),
        other => Err(blm_core::BlmError::InvalidRequest(format!("unknown status {other}"))),
    }
}

pub fn router(state: Arc<DaemonState>) -> Router {
    Router::new()
        .route("/bots", post(bots::start_bot))
        .route("/bots/{platform}/{native_meeting_id}", delete(bots::stop_bot))
        .route("/bots/{platform}/{native_meeting_id}/config", patch(bots::reconfigure_bot))
        .route("/meetings", get(meetings::list_meetings))
        .route("/meetings/{id}", get(meetings::get_meeting))
        .route("/callback/started", post(callback::started))
        .route("/callback/joined", post(callback::joined))
        .route("/callback/heartbeat", post(callback::heartbeat))
        .route("/callback/exited", post(callback::exited))
        .route("/callback/status", patch(callback::status))
        .route("/callback/commands", get(callback::commands_ws))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
