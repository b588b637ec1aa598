// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Storage layer for the Bot Lifecycle Manager: C1 State Store Gateway.
//!
//! A single authoritative, in-memory materialized state, derived purely by
//! replaying an append-only WAL. Every mutating gateway call appends an
//! event, fsyncs it, then applies it to the in-memory state under the same
//! lock — giving crash-durable, serialized ("ACID unit") semantics without
//! a SQL engine (see DESIGN.md for the rationale).

mod gateway;
mod snapshot;
mod state;
mod wal;

pub use gateway::{ListFilter, SharedGateway, StateStoreGateway};
pub use snapshot::{load_snapshot, Checkpointer, Snapshot, SnapshotError, CURRENT_SNAPSHOT_VERSION};
pub use state::MaterializedState;
pub use wal::{Wal, WalEntry, WalError};
