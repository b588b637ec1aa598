// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Closed set of conferencing platforms the BLM knows how to admit.

use serde::{Deserialize, Serialize};

/// A conferencing platform a bot can attend a session on.
///
/// Closed set: unknown wire values are rejected at the admission boundary
/// rather than accepted and stored, per the "unknown keys are rejected"
/// rule of spec.md §9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Zoom,
    GoogleMeet,
    Teams,
}

crate::simple_display! {
    Platform {
        Zoom => "zoom",
        GoogleMeet => "google_meet",
        Teams => "teams",
    }
}

impl Platform {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "zoom" => Some(Self::Zoom),
            "google_meet" => Some(Self::GoogleMeet),
            "teams" => Some(Self::Teams),
            _ => None,
        }
    }
}

/// What the bot should do with the captured audio stream. Closed set;
/// defaults to `Transcribe` per spec.md §4.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Task {
    Transcribe,
    Translate,
}

crate::simple_display! {
    Task {
        Transcribe => "transcribe",
        Translate => "translate",
    }
}

impl Default for Task {
    fn default() -> Self {
        Self::Transcribe
    }
}

impl Task {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "transcribe" => Some(Self::Transcribe),
            "translate" => Some(Self::Translate),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_round_trips() {
        for p in [Platform::Zoom, Platform::GoogleMeet, Platform::Teams] {
            let parsed = Platform::parse(&p.to_string()).unwrap();
            assert_eq!(p, parsed);
        }
    }

    #[test]
    fn task_defaults_to_transcribe() {
        assert_eq!(Task::default(), Task::Transcribe);
    }
}
