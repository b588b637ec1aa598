// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local control protocol between `blm-cli` and `blm-daemon` (spec.md §10.3).
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload. This is
//! deliberately separate from the public worker/operator REST surface
//! served by `blm-daemon::server` — it is a trusted, same-host Unix socket
//! protocol for operator conveniences only.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod query;
mod request;
mod response;
mod wire;

pub use query::Query;
pub use request::Request;
pub use response::Response;
pub use wire::{decode, encode, read_message, read_request, write_message, write_response, ProtocolError};
