// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local control socket (spec.md §10.3): a trusted, same-host Unix socket
//! serving `blm-cli`'s `Ping`/`Status`/`Query`/`Shutdown` requests.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::{UnixListener, UnixStream};

use blm_core::{BlmError, MeetingId, Platform};
use blm_storage::ListFilter;
use blm_wire::{ProtocolError, Query, Request, Response};

use crate::config::control_timeout;
use crate::lifecycle::DaemonState;
use crate::server::parse_status;

pub async fn run(socket_path: PathBuf, state: Arc<DaemonState>) -> std::io::Result<()> {
    let _ = std::fs::remove_file(&socket_path);
    if let Some(parent) = socket_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let listener = UnixListener::bind(&socket_path)?;
    tracing::info!(path = %socket_path.display(), "control socket listening");

    loop {
        let (stream, _) = listener.accept().await?;
        let state = state.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, state).await {
                tracing::debug!(error = %e, "control connection closed");
            }
        });
    }
}

async fn handle_connection(mut stream: UnixStream, state: Arc<DaemonState>) -> Result<(), ProtocolError> {
    loop {
        let request = match blm_wire::read_request(&mut stream, control_timeout()).await {
            Ok(req) => req,
            Err(ProtocolError::ConnectionClosed) => return Ok(()),
            Err(e) => return Err(e),
        };
        let is_shutdown = matches!(request, Request::Shutdown);
        let response = dispatch(&state, request);
        blm_wire::write_response(&mut stream, &response, control_timeout()).await?;
        if is_shutdown {
            return Ok(());
        }
    }
}

fn dispatch(state: &DaemonState, request: Request) -> Response {
    match request {
        Request::Ping => Response::Pong,
        Request::Status => Response::Status {
            uptime_secs: state.started_at.elapsed().as_secs(),
            meetings_active: state
                .gateway
                .list(&ListFilter::default())
                .iter()
                .filter(|m| m.status.is_non_terminal())
                .count(),
        },
        Request::Query { query } => dispatch_query(state, query),
        Request::Shutdown => {
            state.request_shutdown();
            Response::ShuttingDown
        }
    }
}

fn dispatch_query(state: &DaemonState, query: Query) -> Response {
    match query {
        Query::ListMeetings { user_id, platform, status } => match build_filter(user_id, platform, status) {
            Ok(filter) => Response::Meetings { meetings: state.gateway.list(&filter) },
            Err(e) => Response::Error { message: e.to_string() },
        },
        Query::GetMeeting { id } => match state.gateway.read(MeetingId::from_string(id)) {
            Ok(meeting) => Response::Meeting { meeting: Some(Box::new(meeting)) },
            Err(BlmError::NotFound) => Response::Meeting { meeting: None },
            Err(e) => Response::Error { message: e.to_string() },
        },
    }
}

fn build_filter(
    user_id: Option<String>,
    platform: Option<String>,
    status: Option<String>,
) -> Result<ListFilter, BlmError> {
    let platform = platform
        .map(|p| Platform::parse(&p).ok_or_else(|| BlmError::InvalidRequest(format!("unknown platform {p}"))))
        .transpose()?;
    let status = status.map(|s| parse_status(&s)).transpose()?;
    Ok(ListFilter { user_id: user_id.map(blm_core::UserId::from), platform, status })
}
