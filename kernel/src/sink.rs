// Delivery Sink
//
// The seam between a reader channel and its connection.
// A failed delivery, or `closed` resolving, means the peer went away.

use async_trait::async_trait;
use tokio::sync::mpsc;

/// The peer disconnected; the channel loop should stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("connection closed")]
pub struct ConnectionClosed;

/// Destination for messages produced by a reader channel.
#[async_trait]
pub trait Sink<M: Send + 'static>: Send {
    async fn deliver(&mut self, message: M) -> Result<(), ConnectionClosed>;

    /// Resolves once the peer is gone. Must be cancel-safe: readers race
    /// it against the poll interval and drop it when the log grows.
    async fn closed(&mut self) {
        std::future::pending::<()>().await
    }
}

/// In-process connection. Dropping the receiver closes it.
#[async_trait]
impl<M: Send + 'static> Sink<M> for mpsc::Sender<M> {
    async fn deliver(&mut self, message: M) -> Result<(), ConnectionClosed> {
        mpsc::Sender::send(self, message)
            .await
            .map_err(|_| ConnectionClosed)
    }

    async fn closed(&mut self) {
        mpsc::Sender::closed(self).await
    }
}
