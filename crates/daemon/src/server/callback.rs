// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker-facing endpoints (spec.md §6.1): `started`/`joined`/`heartbeat`/
//! `status`/`exited`, plus the long-lived `/callback/commands` channel C2
//! pushes `reconfigure`/`leave` over.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use blm_adapters::CommandBus;
use blm_core::SessionUid;
use serde::Deserialize;

use super::error::AppError;
use super::parse_status;
use crate::lifecycle::DaemonState;

#[derive(Debug, Deserialize)]
pub struct SessionOnly {
    pub session_uid: String,
}

pub async fn started(
    State(state): State<Arc<DaemonState>>,
    Json(body): Json<SessionOnly>,
) -> Result<(), AppError> {
    Ok(state.callback.started(&SessionUid::from(body.session_uid))?)
}

pub async fn joined(
    State(state): State<Arc<DaemonState>>,
    Json(body): Json<SessionOnly>,
) -> Result<(), AppError> {
    Ok(state.callback.joined(&SessionUid::from(body.session_uid))?)
}

pub async fn heartbeat(
    State(state): State<Arc<DaemonState>>,
    Json(body): Json<SessionOnly>,
) -> Result<(), AppError> {
    Ok(state.callback.heartbeat(&SessionUid::from(body.session_uid))?)
}

#[derive(Debug, Deserialize)]
pub struct ExitedRequest {
    pub session_uid: String,
    pub exit_code: i32,
    #[serde(default)]
    pub reason: Option<String>,
}

pub async fn exited(
    State(state): State<Arc<DaemonState>>,
    Json(body): Json<ExitedRequest>,
) -> Result<(), AppError> {
    Ok(state.callback.exited(&SessionUid::from(body.session_uid), body.exit_code, body.reason)?)
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub session_uid: String,
    pub status: String,
}

pub async fn status(
    State(state): State<Arc<DaemonState>>,
    Json(body): Json<StatusRequest>,
) -> Result<(), AppError> {
    let status = parse_status(&body.status)?;
    Ok(state.callback.status(&SessionUid::from(body.session_uid), status)?)
}

#[derive(Debug, Deserialize)]
pub struct CommandsQuery {
    pub session_uid: String,
}

/// Upgrades to a WebSocket once the `session_uid` is a recognized bearer
/// token; the socket then carries `Command` JSON values pushed by C2 for as
/// long as the worker stays connected.
pub async fn commands_ws(
    State(state): State<Arc<DaemonState>>,
    Query(query): Query<CommandsQuery>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, AppError> {
    let session_uid = SessionUid::from(query.session_uid);
    state.gateway.read_by_session(&session_uid)?;
    Ok(ws.on_upgrade(move |socket| handle_commands_socket(socket, state, session_uid)))
}

async fn handle_commands_socket(mut socket: WebSocket, state: Arc<DaemonState>, session_uid: SessionUid) {
    let mut rx = state.bus.register(session_uid.clone());

    loop {
        tokio::select! {
            command = rx.recv() => {
                let Some(command) = command else { break };
                let Ok(text) = serde_json::to_string(&command) else { continue };
                if socket.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {}
                }
            }
        }
    }

    state.bus.deregister(&session_uid);
}
