// Notify Channel
//
// Coalescing growth notifier. Any number of appends between two
// length checks collapse into one notification carrying the
// latest length.

use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::{ChannelExit, ConnectionId, Wake, Waiter};
use crate::config::ChannelConfig;
use crate::log::{AppendLog, MemoryStore, RecordStore};
use crate::sink::Sink;

pub const NEW_DATA: &str = "new data";

/// Wire message: `{"message": "new data", "cursor": <length>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub message: String,
    pub cursor: u64,
}

impl Notification {
    pub fn new_data(cursor: u64) -> Self {
        Self {
            message: NEW_DATA.into(),
            cursor,
        }
    }
}

/// Per-connection length watcher.
pub struct NotifyChannel<S: RecordStore = MemoryStore> {
    id: ConnectionId,
    log: Arc<AppendLog<S>>,
    last_seen: u64,
    waiter: Waiter,
}

impl<S: RecordStore> NotifyChannel<S> {
    /// Open a channel. Records already in the log are never announced.
    pub fn connect(log: Arc<AppendLog<S>>, config: &ChannelConfig) -> Self {
        let waiter = Waiter::new(log.subscribe(), config);
        let last_seen = log.len();
        let id = ConnectionId::new();
        tracing::info!(connection = %id, last_seen, "notify channel connected");

        Self {
            id,
            log,
            last_seen,
            waiter,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Length reported by the most recent notification (or seen at connect).
    pub fn last_seen(&self) -> u64 {
        self.last_seen
    }

    /// Wait until the log has grown past `last_seen`.
    ///
    /// Returns `None` once `cancel` fires.
    pub async fn next(&mut self, cancel: &CancellationToken) -> Option<Notification> {
        self.next_until(cancel, &mut std::future::pending()).await.ok()
    }

    async fn next_until<F>(
        &mut self,
        cancel: &CancellationToken,
        closed: &mut F,
    ) -> Result<Notification, ChannelExit>
    where
        F: Future<Output = ()> + Unpin,
    {
        loop {
            self.waiter.settle();
            let current = self.log.len();
            if current > self.last_seen {
                self.last_seen = current;
                return Ok(Notification::new_data(current));
            }

            if let Wake::Exit(exit) = self.waiter.wait(cancel, closed).await {
                return Err(exit);
            }
        }
    }

    /// Deliver notifications into `sink` until the peer leaves or `cancel` fires.
    pub async fn run<K>(mut self, sink: &mut K, cancel: CancellationToken) -> ChannelExit
    where
        K: Sink<Notification> + ?Sized,
    {
        let exit = loop {
            if cancel.is_cancelled() {
                break ChannelExit::Cancelled;
            }
            let next = {
                let mut closed = sink.closed();
                self.next_until(&cancel, &mut closed).await
            };
            let notification = match next {
                Ok(notification) => notification,
                Err(exit) => break exit,
            };
            let cursor = notification.cursor;
            if sink.deliver(notification).await.is_err() {
                break ChannelExit::Closed;
            }
            tracing::trace!(connection = %self.id, cursor, "growth notified");
        };

        tracing::info!(connection = %self.id, last_seen = self.last_seen, ?exit, "notify channel finished");
        exit
    }
}
