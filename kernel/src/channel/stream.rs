// Stream Channel
//
// Cursor-based replay. Drains everything available without waiting,
// then waits for the log to grow. Delivery order is append order and
// each index is delivered at most once per connection.

use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::{ChannelExit, ConnectionId, Wake, Waiter};
use crate::config::ChannelConfig;
use crate::log::{AppendLog, MemoryStore, Record, RecordStore};
use crate::sink::Sink;

/// Wire message: `{"record": <value>}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamItem {
    pub record: Record,
}

/// Per-connection replay cursor over the log.
pub struct StreamChannel<S: RecordStore = MemoryStore> {
    id: ConnectionId,
    log: Arc<AppendLog<S>>,
    cursor: u64,
    waiter: Waiter,
}

impl<S: RecordStore> StreamChannel<S> {
    /// Open a channel at `cursor`. A cursor past the end is legal; the
    /// channel waits until the log reaches it.
    pub fn open(log: Arc<AppendLog<S>>, cursor: u64, config: &ChannelConfig) -> Self {
        let waiter = Waiter::new(log.subscribe(), config);
        let id = ConnectionId::new();
        tracing::info!(connection = %id, cursor, length = log.len(), "stream channel opened");

        Self {
            id,
            log,
            cursor,
            waiter,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Index of the next record to deliver.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Next record in cursor order, waiting if the log has not reached it.
    ///
    /// Advances the cursor by one. Returns `None` once `cancel` fires.
    pub async fn next(&mut self, cancel: &CancellationToken) -> Option<StreamItem> {
        self.next_until(cancel, &mut std::future::pending()).await.ok()
    }

    async fn next_until<F>(
        &mut self,
        cancel: &CancellationToken,
        closed: &mut F,
    ) -> Result<StreamItem, ChannelExit>
    where
        F: Future<Output = ()> + Unpin,
    {
        loop {
            self.waiter.settle();
            if let Some(record) = self.log.get(self.cursor) {
                self.cursor += 1;
                return Ok(StreamItem { record });
            }

            if let Wake::Exit(exit) = self.waiter.wait(cancel, closed).await {
                return Err(exit);
            }
        }
    }

    /// Deliver records into `sink` until the peer leaves or `cancel` fires.
    pub async fn run<K>(mut self, sink: &mut K, cancel: CancellationToken) -> ChannelExit
    where
        K: Sink<StreamItem> + ?Sized,
    {
        let start = self.cursor;
        let exit = loop {
            if cancel.is_cancelled() {
                break ChannelExit::Cancelled;
            }
            let next = {
                let mut closed = sink.closed();
                self.next_until(&cancel, &mut closed).await
            };
            let item = match next {
                Ok(item) => item,
                Err(exit) => break exit,
            };
            if sink.deliver(item).await.is_err() {
                break ChannelExit::Closed;
            }
        };

        tracing::info!(
            connection = %self.id,
            start,
            cursor = self.cursor,
            ?exit,
            "stream channel finished"
        );
        exit
    }
}
