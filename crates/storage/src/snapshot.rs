// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot persistence for crash recovery.
//!
//! Snapshots store the complete materialized state at a point in time,
//! identified by the WAL sequence number. Recovery loads the snapshot and
//! replays WAL entries after that sequence.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::MaterializedState;

/// Current snapshot schema version.
pub const CURRENT_SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A snapshot of the materialized state at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "v")]
    pub version: u32,
    /// WAL sequence number at the time of snapshot.
    pub seq: u64,
    pub state: MaterializedState,
    /// Epoch milliseconds when this snapshot was created.
    pub created_at_ms: u64,
}

const MAX_BAK_FILES: u32 = 3;

/// Pick the next `.bak` / `.bak.N` path, rotating older backups out.
///
/// Keeps up to [`MAX_BAK_FILES`] backups. The oldest backup is removed
/// when the limit is reached.
pub(crate) fn rotate_bak_path(path: &Path) -> PathBuf {
    let bak = |n: u32| {
        if n == 1 {
            path.with_extension("bak")
        } else {
            path.with_extension(format!("bak.{n}"))
        }
    };

    let oldest = bak(MAX_BAK_FILES);
    if oldest.exists() {
        let _ = fs::remove_file(&oldest);
    }

    for n in (1..MAX_BAK_FILES).rev() {
        let src = bak(n);
        if src.exists() {
            let _ = fs::rename(&src, bak(n + 1));
        }
    }

    bak(1)
}

/// Load the snapshot at `path`, if one exists.
pub fn load_snapshot(path: &Path) -> Result<Option<Snapshot>, SnapshotError> {
    if !path.exists() {
        return Ok(None);
    }
    let data = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&data)?))
}

pub struct CheckpointResult {
    pub seq: u64,
    pub size_bytes: u64,
}

/// Writes snapshots to disk, rotating the previous snapshot to a `.bak`
/// file rather than overwriting it in place.
pub struct Checkpointer {
    path: PathBuf,
}

impl Checkpointer {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Write a snapshot synchronously. Safe to call from a shutdown path
    /// that cannot await an async task.
    pub fn checkpoint_sync(
        &self,
        seq: u64,
        state: &MaterializedState,
    ) -> Result<CheckpointResult, SnapshotError> {
        let created_at_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64;
        let snapshot = Snapshot { version: CURRENT_SNAPSHOT_VERSION, seq, state: state.clone(), created_at_ms };
        let json = serde_json::to_vec_pretty(&snapshot)?;

        if self.path.exists() {
            let bak = rotate_bak_path(&self.path);
            let _ = fs::rename(&self.path, bak);
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = File::create(&self.path)?;
        file.write_all(&json)?;
        file.sync_data()?;

        Ok(CheckpointResult { seq, size_bytes: json.len() as u64 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn checkpoint_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        let checkpointer = Checkpointer::new(path.clone());

        let state = MaterializedState::default();
        let result = checkpointer.checkpoint_sync(5, &state).unwrap();
        assert_eq!(result.seq, 5);

        let loaded = load_snapshot(&path).unwrap().unwrap();
        assert_eq!(loaded.seq, 5);
    }

    #[test]
    fn missing_snapshot_returns_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nope.json");
        assert!(load_snapshot(&path).unwrap().is_none());
    }

    #[test]
    fn second_checkpoint_rotates_previous_to_bak() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        let checkpointer = Checkpointer::new(path.clone());
        let state = MaterializedState::default();

        checkpointer.checkpoint_sync(1, &state).unwrap();
        checkpointer.checkpoint_sync(2, &state).unwrap();

        assert!(path.with_extension("bak").exists());
        let loaded = load_snapshot(&path).unwrap().unwrap();
        assert_eq!(loaded.seq, 2);
    }
}
