// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access and path layout for the daemon
//! (spec.md §6.4, §7.2).

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine a state directory: set BLM_STATE_DIR or HOME")]
    NoStateDir,
    #[error("BLM_CALLBACK_BASE_URL must be set")]
    NoCallbackBaseUrl,
    #[error("BLM_BOT_IMAGE must be set when BLM_ORCH_KIND=cluster")]
    NoBotImage,
    #[error("invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

/// Which `Orchestrator` backend to construct at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorKind {
    Local,
    Cluster,
}

impl OrchestratorKind {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "local" => Some(Self::Local),
            "cluster" => Some(Self::Cluster),
            _ => None,
        }
    }
}

/// Resolve the state directory: `BLM_STATE_DIR` > `$XDG_STATE_HOME/blm` >
/// `~/.local/state/blm`.
pub fn state_dir() -> Result<PathBuf, ConfigError> {
    if let Ok(dir) = std::env::var("BLM_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("blm"));
    }
    let home = std::env::var("HOME").map_err(|_| ConfigError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/blm"))
}

fn env_duration_secs(name: &str, default_secs: u64) -> Duration {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(default_secs))
}

/// Daemon configuration, resolved once at startup from the environment
/// (spec.md §6.4). Mirrors the teacher's fixed-path-under-state-dir layout.
#[derive(Debug, Clone)]
pub struct Config {
    pub state_dir: PathBuf,
    pub lock_path: PathBuf,
    pub version_path: PathBuf,
    pub control_socket_path: PathBuf,
    pub wal_path: PathBuf,
    pub snapshot_path: PathBuf,

    pub orch_kind: OrchestratorKind,
    pub callback_base_url: String,
    pub http_addr: SocketAddr,

    pub t_reap: Duration,
    pub t_reserve_stale: Duration,
    pub t_starting_stale: Duration,
    pub t_heartbeat_stale: Duration,
    pub t_stopping_stale: Duration,
    pub stop_grace: Duration,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let state_dir = state_dir()?;

        let orch_kind = match std::env::var("BLM_ORCH_KIND") {
            Ok(v) => OrchestratorKind::parse(&v)
                .ok_or_else(|| ConfigError::InvalidValue("BLM_ORCH_KIND", v))?,
            Err(_) => OrchestratorKind::Local,
        };
        if orch_kind == OrchestratorKind::Cluster && std::env::var("BLM_BOT_IMAGE").is_err() {
            return Err(ConfigError::NoBotImage);
        }

        let callback_base_url =
            std::env::var("BLM_CALLBACK_BASE_URL").map_err(|_| ConfigError::NoCallbackBaseUrl)?;

        let http_addr: SocketAddr = std::env::var("BLM_HTTP_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:7420".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("BLM_HTTP_ADDR", "not a socket address".into()))?;

        Ok(Self {
            lock_path: state_dir.join("daemon.pid"),
            version_path: state_dir.join("daemon.version"),
            control_socket_path: state_dir.join("daemon.sock"),
            wal_path: state_dir.join("wal").join("events.wal"),
            snapshot_path: state_dir.join("snapshot.json"),
            state_dir,
            orch_kind,
            callback_base_url,
            http_addr,
            t_reap: env_duration_secs("BLM_T_REAP_SECS", 60),
            t_reserve_stale: env_duration_secs("BLM_T_RESERVE_STALE_SECS", 5 * 60),
            t_starting_stale: env_duration_secs("BLM_T_STARTING_STALE_SECS", 10 * 60),
            t_heartbeat_stale: env_duration_secs("BLM_T_HEARTBEAT_STALE_SECS", 2 * 60),
            t_stopping_stale: env_duration_secs("BLM_T_STOPPING_STALE_SECS", 5 * 60),
            stop_grace: env_duration_secs("BLM_STOP_GRACE_SECS", 5),
        })
    }
}

/// Timeout for one control-socket request/response round trip.
pub fn control_timeout() -> Duration {
    std::env::var("BLM_CONTROL_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn state_dir_prefers_blm_state_dir() {
        std::env::set_var("BLM_STATE_DIR", "/tmp/blm-test-state");
        assert_eq!(state_dir().unwrap(), PathBuf::from("/tmp/blm-test-state"));
        std::env::remove_var("BLM_STATE_DIR");
    }

    #[test]
    #[serial]
    fn load_requires_callback_base_url() {
        std::env::remove_var("BLM_CALLBACK_BASE_URL");
        std::env::set_var("BLM_STATE_DIR", "/tmp/blm-test-state-2");
        let err = Config::load().unwrap_err();
        assert!(matches!(err, ConfigError::NoCallbackBaseUrl));
        std::env::remove_var("BLM_STATE_DIR");
    }

    #[test]
    #[serial]
    fn load_requires_bot_image_for_cluster_orchestrator() {
        std::env::set_var("BLM_STATE_DIR", "/tmp/blm-test-state-3");
        std::env::set_var("BLM_CALLBACK_BASE_URL", "http://localhost:7420");
        std::env::set_var("BLM_ORCH_KIND", "cluster");
        std::env::remove_var("BLM_BOT_IMAGE");
        let err = Config::load().unwrap_err();
        assert!(matches!(err, ConfigError::NoBotImage));
        std::env::remove_var("BLM_STATE_DIR");
        std::env::remove_var("BLM_CALLBACK_BASE_URL");
        std::env::remove_var("BLM_ORCH_KIND");
    }
}
