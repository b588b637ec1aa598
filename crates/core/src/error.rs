// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error kinds shared across every layer (spec.md §7).

use thiserror::Error;

use crate::ids::MeetingId;

/// All error kinds a BLM operation can surface. Every layer above
/// `blm-storage` propagates these without wrapping, so the HTTP binding in
/// `blm-daemon` can map them to the status codes of spec.md §6/§7 in one
/// place.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BlmError {
    /// Admission refused; the user is already at their concurrency cap.
    /// Not retryable.
    #[error("user already has the maximum number of concurrent bots")]
    LimitExceeded,

    /// A non-terminal Meeting already exists for this
    /// `(user, platform, native_meeting_id)`.
    #[error("a non-terminal meeting already exists for this request")]
    Conflict,

    /// A `compare_and_set`-style status transition failed because `to` is
    /// not reachable from the current status (I1). Callers that find
    /// `current == to` treat the call as an idempotent no-op instead of
    /// constructing this variant.
    #[error("illegal status transition for meeting {meeting_id}")]
    IllegalTransition { meeting_id: MeetingId },

    /// Reconfigure requested while the Meeting is not in `{starting,
    /// active}`.
    #[error("meeting {meeting_id} is not in a reconfigurable state")]
    IllegalState { meeting_id: MeetingId },

    /// Unknown meeting or session.
    #[error("not found")]
    NotFound,

    /// `set_container` called a second time with a different value (I4).
    #[error("bot_container_id already set for meeting {meeting_id}")]
    AlreadySet { meeting_id: MeetingId },

    /// Transient store/bus/orchestrator failure; retried with capped
    /// exponential backoff at the call site before this is ever surfaced.
    #[error("temporarily unavailable: {0}")]
    Unavailable(String),

    /// The orchestrator refused to create or start a container.
    #[error("orchestrator failed: {0}")]
    OrchestratorFailed(String),

    /// Callback token did not match the Meeting's recorded `session_uid`.
    #[error("unauthorized")]
    Unauthorized,

    /// Request body failed admission-time validation (bad platform, bad
    /// config, oversized bot_name, ...).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

pub type BlmResult<T> = Result<T, BlmError>;
