// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! C2 Command Bus Adapter (spec.md §4.2): delivers `reconfigure`/`leave`
//! commands to a running worker over its `/callback/commands` channel.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use blm_core::{BlmResult, Command, SessionUid};
use parking_lot::Mutex;
use tokio::sync::mpsc;

/// Bound on the channel handed to a connected worker; a worker slow enough
/// to fill this has bigger problems than a dropped `reconfigure`.
const CHANNEL_CAPACITY: usize = 16;

/// Sends commands (reconfigure, leave) to a live worker connection.
#[async_trait]
pub trait CommandBus: Send + Sync + 'static {
    /// Enqueue `command` for delivery to the worker handling `session_uid`.
    /// There is no persistence: if no channel is registered for
    /// `session_uid` (the worker hasn't connected yet, or already
    /// disconnected), the command is dropped silently.
    async fn send(&self, session_uid: &SessionUid, command: Command) -> BlmResult<()>;

    /// Register the live channel for a freshly (re)connected worker.
    fn register(&self, session_uid: SessionUid) -> mpsc::Receiver<Command>;

    /// Drop the channel for a worker that disconnected.
    fn deregister(&self, session_uid: &SessionUid);
}

/// In-process command bus: one bounded mpsc channel per connected worker.
/// No offline queue — a command sent while no worker is registered is
/// lost, matching the worker's own reconnect-and-reread-state contract.
#[derive(Clone, Default)]
pub struct InMemoryCommandBus {
    senders: Arc<Mutex<HashMap<String, mpsc::Sender<Command>>>>,
}

impl InMemoryCommandBus {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CommandBus for InMemoryCommandBus {
    async fn send(&self, session_uid: &SessionUid, command: Command) -> BlmResult<()> {
        let sender = self.senders.lock().get(session_uid.as_str()).cloned();
        if let Some(sender) = sender {
            // A full or closed channel means the worker is unreachable
            // regardless; dropping the command here is the same outcome as
            // never having had a registered channel at all.
            let _ = sender.send(command).await;
        }
        Ok(())
    }

    fn register(&self, session_uid: SessionUid) -> mpsc::Receiver<Command> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        self.senders.lock().insert(session_uid.to_string(), tx);
        rx
    }

    fn deregister(&self, session_uid: &SessionUid) {
        self.senders.lock().remove(session_uid.as_str());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blm_core::PartialBotConfig;

    #[tokio::test]
    async fn command_sent_with_no_registered_worker_is_dropped() {
        let bus = InMemoryCommandBus::new();
        let session_uid = SessionUid::new();
        bus.send(&session_uid, Command::Leave).await.unwrap();

        let mut rx = bus.register(session_uid);
        // Nothing was buffered while the worker was unregistered.
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn connected_worker_receives_immediately() {
        let bus = InMemoryCommandBus::new();
        let session_uid = SessionUid::new();
        let mut rx = bus.register(session_uid.clone());

        bus.send(&session_uid, Command::Reconfigure(PartialBotConfig::default())).await.unwrap();
        assert!(matches!(rx.recv().await, Some(Command::Reconfigure(_))));
    }

    #[tokio::test]
    async fn deregister_drops_the_channel_and_later_sends_are_lost() {
        let bus = InMemoryCommandBus::new();
        let session_uid = SessionUid::new();
        let _rx = bus.register(session_uid.clone());
        bus.deregister(&session_uid);

        bus.send(&session_uid, Command::Leave).await.unwrap();
        let mut rx2 = bus.register(session_uid);
        assert!(rx2.try_recv().is_err());
    }
}
