// Reader Channels
//
// Per-connection delivery loops over the shared append log.
// Both channels wait for data only inside `Waiter::wait`, which is
// also where cancellation and peer disconnects are observed.

pub mod notify;
pub mod stream;

pub use notify::{NotifyChannel, Notification};
pub use stream::{StreamChannel, StreamItem};

use std::fmt;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::ChannelConfig;

/// Identifier of one reader connection, for log correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Why a channel loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelExit {
    /// The cancellation token fired.
    Cancelled,

    /// The sink reported the peer is gone.
    Closed,
}

/// Outcome of one `Waiter::wait`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Wake {
    /// Time to re-check the log length.
    Recheck,

    /// Stop the loop.
    Exit(ChannelExit),
}

/// Suspends a reader until the log may have grown.
///
/// Returns after the poll interval at the latest. With `wake_on_append`
/// it also returns as soon as an append publishes a new length.
#[derive(Debug)]
pub(crate) struct Waiter {
    lengths: watch::Receiver<u64>,
    poll_interval: Duration,
    wake_on_append: bool,
}

impl Waiter {
    pub(crate) fn new(lengths: watch::Receiver<u64>, config: &ChannelConfig) -> Self {
        Self {
            lengths,
            poll_interval: config.poll_interval(),
            wake_on_append: config.wake_on_append,
        }
    }

    /// Mark the current length as seen.
    ///
    /// Must be called before each length check, so an append that lands
    /// after the check still wakes the next `wait`.
    pub(crate) fn settle(&mut self) {
        self.lengths.borrow_and_update();
    }

    /// Wait for the next re-check, or until `cancel` fires or `closed`
    /// resolves.
    pub(crate) async fn wait<F>(&mut self, cancel: &CancellationToken, closed: &mut F) -> Wake
    where
        F: Future<Output = ()> + Unpin,
    {
        let tick = tokio::time::sleep(self.poll_interval);
        let wake_on_append = self.wake_on_append;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Wake::Exit(ChannelExit::Cancelled),
            _ = closed => Wake::Exit(ChannelExit::Closed),
            Ok(()) = self.lengths.changed(), if wake_on_append => Wake::Recheck,
            _ = tick => Wake::Recheck,
        }
    }
}
