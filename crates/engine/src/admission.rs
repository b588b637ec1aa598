// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! C4 Admission Controller (spec.md §4.4): the only place that translates
//! `LimitExceeded` into a user-visible refusal, and where platform-specific
//! preflight and config defaulting happen before anything touches the store.

use blm_core::{BlmError, BlmResult, BotConfig, Clock, MeetingId, NativeMeetingId, Platform, SessionUid, Task, UserId};
use blm_storage::StateStoreGateway;

/// Wraps C1 with the admission-time validation and defaulting spec.md §4.4
/// requires before a reservation is attempted.
pub struct AdmissionController<C: Clock> {
    gateway: std::sync::Arc<StateStoreGateway<C>>,
}

impl<C: Clock> AdmissionController<C> {
    pub fn new(gateway: std::sync::Arc<StateStoreGateway<C>>) -> Self {
        Self { gateway }
    }

    /// Admit a new bot attempt. `max_concurrent_bots` is resolved by the
    /// caller from the User record (users are consulted but not owned by
    /// the BLM, spec.md §3).
    #[allow(clippy::too_many_arguments)]
    pub fn admit(
        &self,
        user_id: UserId,
        max_concurrent_bots: u32,
        platform: Platform,
        native_meeting_id: NativeMeetingId,
        meeting_url: Option<String>,
        bot_name: String,
        language: Option<String>,
        task: Option<Task>,
    ) -> BlmResult<(MeetingId, SessionUid)> {
        let config = BotConfig { language, task: task.unwrap_or_default(), bot_name };
        config.validate().map_err(BlmError::InvalidRequest)?;

        self.gateway.reserve(user_id, max_concurrent_bots, platform, native_meeting_id, meeting_url, config)
    }
}
