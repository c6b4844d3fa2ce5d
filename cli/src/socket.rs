// WebSocket Sink
//
// Sends channel messages to a client as JSON text frames, and
// watches the inbound half for the client going away.

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use serde::Serialize;

use tally_kernel::sink::{ConnectionClosed, Sink};

pub struct JsonSocket {
    socket: WebSocket,
}

impl JsonSocket {
    pub fn new(socket: WebSocket) -> Self {
        Self { socket }
    }
}

#[async_trait]
impl<M> Sink<M> for JsonSocket
where
    M: Serialize + Send + 'static,
{
    async fn deliver(&mut self, message: M) -> Result<(), ConnectionClosed> {
        let text = match serde_json::to_string(&message) {
            Ok(text) => text,
            Err(err) => {
                tracing::error!(error = %err, "cannot encode message, closing connection");
                return Err(ConnectionClosed);
            }
        };

        self.socket
            .send(Message::Text(text.into()))
            .await
            .map_err(|_| ConnectionClosed)
    }

    async fn closed(&mut self) {
        // Inbound frames carry no meaning; only the end of the stream does.
        loop {
            match self.socket.recv().await {
                None | Some(Err(_)) | Some(Ok(Message::Close(_))) => return,
                Some(Ok(_)) => continue,
            }
        }
    }
}
