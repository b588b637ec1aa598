// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifier types for the bot lifecycle domain.

use base64::Engine;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

crate::define_id! {
    /// Stable unique handle for one bot attempt.
    pub struct MeetingId("mtg-");
}

/// Opaque string identifier for the end user on whose behalf a bot runs.
///
/// Owned outside the BLM (see `User` in [`crate::user`]); never generated
/// here, only round-tripped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for UserId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Platform-assigned identifier of the target conferencing session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NativeMeetingId(pub String);

impl NativeMeetingId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NativeMeetingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NativeMeetingId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NativeMeetingId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Opaque identifier returned by the container orchestrator on successful
/// creation. Set exactly once per Meeting (I4).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BotContainerId(pub String);

impl fmt::Display for BotContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for BotContainerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Number of random bytes backing a [`SessionUid`]. 256 bits, comfortably
/// above the spec's ≥122-bit requirement.
const SESSION_UID_BYTES: usize = 32;

/// Unguessable identifier generated at reservation time, shared between the
/// worker, the command channel, and the Meeting row.
///
/// Doubles as the callback bearer token (spec.md §4.6): the worker presents
/// this value verbatim on every callback, and the ingress rejects any call
/// whose token does not match the Meeting's recorded `session_uid`.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionUid(pub String);

impl SessionUid {
    /// Generate a fresh, cryptographically random session UID.
    pub fn new() -> Self {
        let mut bytes = [0u8; SESSION_UID_BYTES];
        rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes);
        Self(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionUid {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Debug intentionally does not print the token value: it is a bearer
// credential and must not end up in logs via a stray `{:?}`.
impl fmt::Debug for SessionUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionUid({}...)", crate::id::short(&self.0, 6))
    }
}

impl From<&str> for SessionUid {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SessionUid {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for SessionUid {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_uid_has_at_least_122_bits_of_entropy() {
        let uid = SessionUid::new();
        // base64url without padding: 4 chars per 3 bytes, 32 bytes -> 43 chars.
        // log2(64) * 43 ~= 258 bits of representational space.
        assert!(uid.0.len() >= 40);
    }

    #[test]
    fn session_uid_debug_does_not_leak_token() {
        let uid = SessionUid::new();
        let debug = format!("{uid:?}");
        assert!(!debug.contains(&uid.0));
    }

    #[test]
    fn meeting_id_round_trips_through_string() {
        let id = MeetingId::new();
        let parsed = MeetingId::from_string(id.to_string());
        assert_eq!(id, parsed);
    }
}
