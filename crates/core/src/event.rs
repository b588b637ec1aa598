// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events that drive the materialized state (WAL entries).
//!
//! Every mutating operation of the State Store Gateway (C1, spec.md §4.1)
//! is recorded as one of these before the in-memory state is updated, so
//! that state can be rebuilt from the log on crash recovery. Handlers that
//! apply these (see `blm_storage::state`) MUST be idempotent: the same
//! event replayed twice must produce the same state as once.

use serde::{Deserialize, Serialize};

use crate::ids::{BotContainerId, MeetingId, NativeMeetingId, SessionUid, UserId};
use crate::meeting::{BotConfig, MeetingStatus};
use crate::platform::Platform;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// A Meeting was admitted. Always the first event for a `meeting_id`.
    MeetingReserved {
        meeting_id: MeetingId,
        user_id: UserId,
        platform: Platform,
        native_meeting_id: NativeMeetingId,
        meeting_url: Option<String>,
        config: BotConfig,
        session_uid: SessionUid,
        created_at_ms: u64,
    },

    /// C5 recorded the orchestrator-assigned container id (I4: set once).
    ContainerSet { meeting_id: MeetingId, container_id: BotContainerId },

    /// A status transition accepted by the gateway's compare-and-set (I1).
    StatusAdvanced {
        meeting_id: MeetingId,
        to: MeetingStatus,
        at_ms: u64,
        failure_reason: Option<String>,
    },

    /// A heartbeat or other liveness signal bumped `updated_at` without
    /// changing `status`.
    Touched { meeting_id: MeetingId, at_ms: u64 },

    /// The worker's `started` callback created or re-affirmed the
    /// MeetingSession row. Idempotent on `(meeting_id, session_uid)`.
    SessionUpserted { meeting_id: MeetingId, session_uid: SessionUid, start_time_ms: u64 },

    /// Config accepted by `reconfigure_bot` was applied by the worker and
    /// reflected back into the store on its next `joined`/`status`
    /// callback (spec.md §9, Open Question: persist-on-ack).
    ConfigApplied { meeting_id: MeetingId, language: Option<String>, task: crate::platform::Task },
}

impl Event {
    /// The Meeting this event concerns, used for WAL indexing/log lines.
    pub fn meeting_id(&self) -> &MeetingId {
        match self {
            Event::MeetingReserved { meeting_id, .. }
            | Event::ContainerSet { meeting_id, .. }
            | Event::StatusAdvanced { meeting_id, .. }
            | Event::Touched { meeting_id, .. }
            | Event::SessionUpserted { meeting_id, .. }
            | Event::ConfigApplied { meeting_id, .. } => meeting_id,
        }
    }
}
