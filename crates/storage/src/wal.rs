// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only write-ahead log of [`Event`]s.
//!
//! One line of JSON per entry. `append` buffers; `flush` fsyncs. On
//! `open`, any existing entries are read back so a replayed WAL (after a
//! snapshot load) can resume exactly where it left off.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use blm_core::Event;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A single WAL entry: a sequence number paired with the event it records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalEntry {
    pub seq: u64,
    pub event: Event,
}

/// Append-only event log backing the State Store Gateway.
pub struct Wal {
    path: PathBuf,
    writer: BufWriter<File>,
    entries: Vec<WalEntry>,
    write_seq: u64,
    processed_seq: u64,
}

impl Wal {
    /// Open (creating if absent) the WAL at `path`, resuming the write
    /// cursor from whatever entries are already on disk and the read
    /// cursor from `processed_seq` (typically the sequence number recorded
    /// in the last snapshot).
    pub fn open(path: impl AsRef<Path>, processed_seq: u64) -> Result<Self, WalError> {
        let path = path.as_ref().to_path_buf();

        let mut entries = Vec::new();
        if path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            for line in reader.lines() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                entries.push(serde_json::from_str::<WalEntry>(&line)?);
            }
        }
        let write_seq = entries.last().map(|e| e.seq).unwrap_or(0);

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, writer: BufWriter::new(file), entries, write_seq, processed_seq })
    }

    pub fn write_seq(&self) -> u64 {
        self.write_seq
    }

    pub fn processed_seq(&self) -> u64 {
        self.processed_seq
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `event`, returning its assigned sequence number. Buffered;
    /// call [`Wal::flush`] for durability.
    pub fn append(&mut self, event: &Event) -> Result<u64, WalError> {
        self.write_seq += 1;
        let entry = WalEntry { seq: self.write_seq, event: event.clone() };
        let line = serde_json::to_string(&entry)?;
        writeln!(self.writer, "{line}")?;
        self.entries.push(entry);
        Ok(self.write_seq)
    }

    /// Flush buffered writes to the underlying file and fsync.
    pub fn flush(&mut self) -> Result<(), WalError> {
        self.writer.flush()?;
        self.writer.get_ref().sync_data()?;
        Ok(())
    }

    /// The next entry after `processed_seq`, if any. Does not advance the
    /// cursor — call [`Wal::mark_processed`] once the caller has applied it.
    pub fn next_unprocessed(&self) -> Result<Option<WalEntry>, WalError> {
        Ok(self.entries.iter().find(|e| e.seq > self.processed_seq).cloned())
    }

    pub fn mark_processed(&mut self, seq: u64) {
        if seq > self.processed_seq {
            self.processed_seq = seq;
        }
    }

    /// All entries with `seq > after`, in order.
    pub fn entries_after(&self, after: u64) -> Result<Vec<WalEntry>, WalError> {
        Ok(self.entries.iter().filter(|e| e.seq > after).cloned().collect())
    }
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
