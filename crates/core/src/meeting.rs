// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Meeting record: the single authoritative record for one bot attempt.

use serde::{Deserialize, Serialize};

use crate::ids::{BotContainerId, MeetingId, NativeMeetingId, UserId};
use crate::platform::{Platform, Task};

/// `status` transitions are a DAG (spec.md I1). `Failed` and `Completed`
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingStatus {
    Reserved,
    Starting,
    Active,
    Stopping,
    Completed,
    Failed,
}

crate::simple_display! {
    MeetingStatus {
        Reserved => "reserved",
        Starting => "starting",
        Active => "active",
        Stopping => "stopping",
        Completed => "completed",
        Failed => "failed",
    }
}

impl MeetingStatus {
    /// Whether no further transition out of this status is legal (I1).
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether `self -> to` is an edge of the I1 DAG. Reflexive transitions
    /// (`self == to`) are never "legal" edges by this check — callers that
    /// want idempotent compare-and-set semantics check equality separately
    /// (see `blm_storage::gateway::advance_status`).
    pub fn can_advance_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Reserved, Self::Starting)
                | (Self::Reserved, Self::Failed)
                | (Self::Starting, Self::Active)
                | (Self::Starting, Self::Failed)
                | (Self::Active, Self::Stopping)
                | (Self::Active, Self::Failed)
                | (Self::Active, Self::Completed)
                | (Self::Stopping, Self::Completed)
                | (Self::Stopping, Self::Failed)
        )
    }

    /// Non-terminal statuses count against a user's concurrency cap (I3).
    pub fn is_non_terminal(self) -> bool {
        !self.is_terminal()
    }
}

/// Recognized bot configuration options (spec.md §3, §4.4).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotConfig {
    /// `None` means "auto-detect"; pass-through, never defaulted.
    pub language: Option<String>,
    #[serde(default)]
    pub task: Task,
    pub bot_name: String,
}

impl BotConfig {
    /// Length bound on `bot_name` from spec.md §4.4: 1..64 printable chars.
    pub fn validate(&self) -> Result<(), String> {
        let len = self.bot_name.chars().count();
        if !(1..=64).contains(&len) {
            return Err(format!(
                "bot_name must be 1..=64 printable characters, got {len}"
            ));
        }
        if self.bot_name.chars().any(|c| c.is_control()) {
            return Err("bot_name must not contain control characters".to_string());
        }
        Ok(())
    }
}

/// A partial update accepted by `reconfigure_bot` (spec.md §4.5).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialBotConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<Task>,
}

/// The single authoritative record for one bot attempt (spec.md §3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meeting {
    pub meeting_id: MeetingId,
    pub user_id: UserId,
    pub platform: Platform,
    pub native_meeting_id: NativeMeetingId,
    pub meeting_url: Option<String>,
    pub status: MeetingStatus,
    pub bot_container_id: Option<BotContainerId>,
    pub start_time: Option<u64>,
    pub end_time: Option<u64>,
    pub updated_at: u64,
    pub created_at: u64,
    pub config: BotConfig,
    pub failure_reason: Option<String>,
}

impl Meeting {
    pub fn new(
        meeting_id: MeetingId,
        user_id: UserId,
        platform: Platform,
        native_meeting_id: NativeMeetingId,
        meeting_url: Option<String>,
        config: BotConfig,
        created_at_ms: u64,
    ) -> Self {
        Self {
            meeting_id,
            user_id,
            platform,
            native_meeting_id,
            meeting_url,
            status: MeetingStatus::Reserved,
            bot_container_id: None,
            start_time: None,
            end_time: None,
            updated_at: created_at_ms,
            created_at: created_at_ms,
            config,
            failure_reason: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    #[cfg(any(test, feature = "test-support"))]
    pub fn builder(user_id: impl Into<String>) -> MeetingBuilder {
        MeetingBuilder {
            meeting_id: MeetingId::new(),
            user_id: UserId::from(user_id.into()),
            platform: Platform::Zoom,
            native_meeting_id: NativeMeetingId::from("native-1"),
            meeting_url: None,
            config: BotConfig {
                language: None,
                task: Task::Transcribe,
                bot_name: "Notetaker".to_string(),
            },
            created_at_ms: 0,
        }
    }
}

/// Test-only builder. Production construction always goes through
/// [`Meeting::new`] inside the gateway's `reserve` operation so that
/// `meeting_id`/`status`/`updated_at` stay consistent with the rest of the
/// invariants.
#[cfg(any(test, feature = "test-support"))]
pub struct MeetingBuilder {
    meeting_id: MeetingId,
    user_id: UserId,
    platform: Platform,
    native_meeting_id: NativeMeetingId,
    meeting_url: Option<String>,
    config: BotConfig,
    created_at_ms: u64,
}

#[cfg(any(test, feature = "test-support"))]
impl MeetingBuilder {
    pub fn platform(mut self, p: Platform) -> Self {
        self.platform = p;
        self
    }

    pub fn native_meeting_id(mut self, id: impl Into<String>) -> Self {
        self.native_meeting_id = NativeMeetingId::from(id.into());
        self
    }

    pub fn bot_name(mut self, name: impl Into<String>) -> Self {
        self.config.bot_name = name.into();
        self
    }

    pub fn created_at_ms(mut self, ms: u64) -> Self {
        self.created_at_ms = ms;
        self
    }

    pub fn build(self) -> Meeting {
        Meeting::new(
            self.meeting_id,
            self.user_id,
            self.platform,
            self.native_meeting_id,
            self.meeting_url,
            self.config,
            self.created_at_ms,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_dag_matches_spec() {
        use MeetingStatus::*;
        assert!(Reserved.can_advance_to(Starting));
        assert!(Reserved.can_advance_to(Failed));
        assert!(!Reserved.can_advance_to(Active));
        assert!(Starting.can_advance_to(Active));
        assert!(Starting.can_advance_to(Failed));
        assert!(!Starting.can_advance_to(Stopping));
        assert!(Active.can_advance_to(Stopping));
        assert!(Active.can_advance_to(Failed));
        assert!(Active.can_advance_to(Completed));
        assert!(Stopping.can_advance_to(Completed));
        assert!(Stopping.can_advance_to(Failed));
        assert!(!Stopping.can_advance_to(Starting));
    }

    #[test]
    fn terminal_statuses_have_no_outgoing_edges() {
        for to in [
            MeetingStatus::Reserved,
            MeetingStatus::Starting,
            MeetingStatus::Active,
            MeetingStatus::Stopping,
            MeetingStatus::Completed,
            MeetingStatus::Failed,
        ] {
            assert!(!MeetingStatus::Completed.can_advance_to(to));
            assert!(!MeetingStatus::Failed.can_advance_to(to));
        }
    }

    #[test]
    fn bot_config_rejects_empty_or_oversized_name() {
        let mut cfg = BotConfig { language: None, task: Task::Transcribe, bot_name: String::new() };
        assert!(cfg.validate().is_err());
        cfg.bot_name = "x".repeat(65);
        assert!(cfg.validate().is_err());
        cfg.bot_name = "Notetaker".to_string();
        assert!(cfg.validate().is_ok());
    }
}
