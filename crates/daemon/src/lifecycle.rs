// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-level lifecycle: acquiring the daemon lock, recovering state
//! from WAL + snapshot at startup, and flushing a final snapshot at
//! shutdown.

use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use blm_core::SystemClock;
use fs2::FileExt;
use thiserror::Error;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::orchestrator::OrchestratorHandle;

pub type Gateway = blm_storage::StateStoreGateway<SystemClock>;
pub type Coordinator = blm_engine::LifecycleCoordinator<SystemClock, OrchestratorHandle, blm_adapters::InMemoryCommandBus>;
pub type Callback = blm_engine::CallbackIngress<SystemClock>;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("another daemon instance already holds the lock at {0}")]
    AlreadyRunning(PathBuf),
    #[error("snapshot error: {0}")]
    Snapshot(#[from] blm_storage::SnapshotError),
    #[error("wal error: {0}")]
    Wal(#[from] blm_storage::WalError),
    #[error("store error: {0}")]
    Store(#[from] blm_core::BlmError),
}

/// Everything a running daemon needs, shared behind `Arc` as Axum state and
/// by the control socket and reaper tasks.
pub struct DaemonState {
    pub config: Config,
    pub gateway: Arc<Gateway>,
    pub coordinator: Arc<Coordinator>,
    pub callback: Arc<Callback>,
    pub bus: Arc<blm_adapters::InMemoryCommandBus>,
    pub started_at: Instant,
    checkpointer: blm_storage::Checkpointer,
    shutdown_notify: Arc<Notify>,
    _lock_file: File,
}

impl DaemonState {
    /// Signal that a graceful shutdown has been requested (control socket
    /// `Shutdown`, or an OS signal caught by `main`).
    pub fn request_shutdown(&self) {
        self.shutdown_notify.notify_one();
    }

    /// Resolves once `request_shutdown` has been called.
    pub async fn shutdown_requested(&self) {
        self.shutdown_notify.notified().await;
    }
}

fn acquire_lock(path: &Path) -> Result<File, LifecycleError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).read(true).write(true).open(path)?;
    file.try_lock_exclusive().map_err(|_| LifecycleError::AlreadyRunning(path.to_path_buf()))?;
    Ok(file)
}

fn write_pid(file: &mut File) -> std::io::Result<()> {
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    write!(file, "{}", std::process::id())?;
    file.flush()
}

/// Recovers state from the last snapshot + WAL tail, wires up the
/// orchestrator/bus/coordinator/reaper, and returns the shared state plus
/// the reaper's join handle.
pub async fn startup(config: Config) -> Result<(Arc<DaemonState>, JoinHandle<()>), LifecycleError> {
    std::fs::create_dir_all(&config.state_dir)?;

    let mut lock_file = acquire_lock(&config.lock_path)?;
    write_pid(&mut lock_file)?;
    std::fs::write(&config.version_path, env!("CARGO_PKG_VERSION"))?;

    if let Some(parent) = config.wal_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let snapshot = blm_storage::load_snapshot(&config.snapshot_path)?;
    let (seed, processed_seq) = match snapshot {
        Some(snapshot) => (snapshot.state, snapshot.seq),
        None => (blm_storage::MaterializedState::default(), 0),
    };

    let gateway = Arc::new(blm_storage::StateStoreGateway::open(
        config.wal_path.clone(),
        seed,
        processed_seq,
        SystemClock,
    )?);
    gateway.replay();

    let orchestrator = Arc::new(OrchestratorHandle::connect(config.orch_kind).await?);
    let bus = Arc::new(blm_adapters::InMemoryCommandBus::new());

    let coordinator = Arc::new(Coordinator::new(
        gateway.clone(),
        orchestrator.clone(),
        bus.clone(),
        config.callback_base_url.clone(),
    ));
    let callback = Arc::new(Callback::new(gateway.clone()));

    coordinator.cleanup_orphaned_containers().await;

    let reaper = Arc::new(blm_engine::Reaper::new(
        gateway.clone(),
        orchestrator,
        blm_engine::ReapThresholds {
            t_reap: config.t_reap,
            t_reserve_stale: config.t_reserve_stale,
            t_starting_stale: config.t_starting_stale,
            t_heartbeat_stale: config.t_heartbeat_stale,
            t_stopping_stale: config.t_stopping_stale,
            stop_grace: config.stop_grace,
        },
    ));
    let reaper_handle = reaper.spawn();

    let checkpointer = blm_storage::Checkpointer::new(config.snapshot_path.clone());

    let state = Arc::new(DaemonState {
        config,
        gateway,
        coordinator,
        callback,
        bus,
        started_at: Instant::now(),
        checkpointer,
        shutdown_notify: Arc::new(Notify::new()),
        _lock_file: lock_file,
    });

    Ok((state, reaper_handle))
}

/// Flushes the WAL, writes a final snapshot, and best-effort removes the
/// control socket and lock/version files. Called once, on the way out.
pub fn shutdown(state: &DaemonState) -> Result<(), LifecycleError> {
    state.gateway.flush()?;
    let seq = state.gateway.processed_seq();
    let snapshot_state = state.gateway.snapshot_state();
    state.checkpointer.checkpoint_sync(seq, &snapshot_state)?;

    let _ = std::fs::remove_file(&state.config.control_socket_path);
    let _ = std::fs::remove_file(&state.config.lock_path);
    let _ = std::fs::remove_file(&state.config.version_path);
    Ok(())
}
