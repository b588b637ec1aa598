// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin client over `blm-wire`'s local control protocol (spec.md §10.3).

use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use blm_wire::{Request, Response};
use tokio::net::UnixStream;

pub struct DaemonClient {
    stream: UnixStream,
    timeout: Duration,
}

impl DaemonClient {
    pub async fn connect(socket_path: &Path, timeout: Duration) -> Result<Self> {
        let stream = UnixStream::connect(socket_path)
            .await
            .with_context(|| format!("daemon not running at {}", socket_path.display()))?;
        Ok(Self { stream, timeout })
    }

    pub async fn call(&mut self, request: Request) -> Result<Response> {
        let payload = blm_wire::encode(&request)?;
        blm_wire::write_message(&mut self.stream, &payload).await?;
        let bytes = tokio::time::timeout(self.timeout, blm_wire::read_message(&mut self.stream))
            .await
            .map_err(|_| anyhow!("timed out waiting for daemon response"))??;
        Ok(blm_wire::decode(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::UnixListener;

    #[tokio::test]
    async fn connect_fails_when_nothing_is_listening() {
        let dir = tempfile::tempdir().unwrap();
        let socket_path = dir.path().join("daemon.sock");
        let err = DaemonClient::connect(&socket_path, Duration::from_millis(100)).await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn call_round_trips_a_request_response_pair() {
        let dir = tempfile::tempdir().unwrap();
        let socket_path = dir.path().join("daemon.sock");
        let listener = UnixListener::bind(&socket_path).unwrap();

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let request: Request =
                blm_wire::decode(&blm_wire::read_message(&mut stream).await.unwrap()).unwrap();
            assert_eq!(request, Request::Ping);
            let payload = blm_wire::encode(&Response::Pong).unwrap();
            blm_wire::write_message(&mut stream, &payload).await.unwrap();
        });

        let mut client = DaemonClient::connect(&socket_path, Duration::from_secs(1)).await.unwrap();
        let response = client.call(Request::Ping).await.unwrap();
        assert_eq!(response, Response::Pong);

        server.await.unwrap();
    }
}
