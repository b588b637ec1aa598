// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `blmd`: the Bot Lifecycle Manager daemon process.

use blm_daemon::{config::Config, lifecycle, logging, server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let config = Config::load()?;
    let (state, reaper_handle) = lifecycle::startup(config).await?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "blm-daemon starting");

    let http_addr = state.config.http_addr;
    let listener = tokio::net::TcpListener::bind(http_addr).await?;
    let app = server::router(state.clone());
    tracing::info!(%http_addr, "http server listening");

    let control_state = state.clone();
    let control_socket_path = state.config.control_socket_path.clone();
    let control_handle = tokio::spawn(async move {
        if let Err(e) = blm_daemon::control::run(control_socket_path, control_state).await {
            tracing::error!(error = %e, "control socket listener exited");
        }
    });

    let http_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "http server exited");
        }
    });

    wait_for_shutdown(&state).await;
    tracing::info!("shutting down");

    reaper_handle.abort();
    control_handle.abort();
    http_handle.abort();

    lifecycle::shutdown(&state)?;
    Ok(())
}

/// Resolves on SIGTERM, Ctrl+C, or a control-socket `Shutdown` request,
/// whichever comes first.
async fn wait_for_shutdown(state: &blm_daemon::DaemonState) {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        let Ok(mut sigterm) = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        else {
            std::future::pending::<()>().await;
            return;
        };
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
        _ = state.shutdown_requested() => {},
    }
}
