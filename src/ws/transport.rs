//! Message transport seen by the push loop.
//!
//! [`Transport`] is the bidirectional, message-oriented connection a
//! client is served over. Receiving distinguishes a closed peer from a
//! failure explicitly instead of signalling it through errors.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;

use super::messages::WsMessage;
use crate::error::PushError;

/// Outcome of a successful receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// One text message.
    Text(String),
    /// The peer closed the connection.
    Closed,
}

/// A bidirectional message connection.
pub trait Transport: Send {
    /// Waits for the next inbound message, without timeout.
    fn recv(&mut self) -> impl Future<Output = Result<Inbound, PushError>> + Send;

    /// Sends one text frame.
    fn send_text(&mut self, text: String) -> impl Future<Output = Result<(), PushError>> + Send;

    /// Completes the closing handshake. Failures are ignored.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

/// Serializes `msg` and sends it.
///
/// # Errors
///
/// Returns [`PushError::Encode`] when the payload has no JSON form, or
/// whatever the transport reports.
pub async fn send_frame<T, P>(transport: &mut T, msg: &WsMessage<P>) -> Result<(), PushError>
where
    T: Transport,
    P: Serialize + Sync,
{
    let text = serde_json::to_string(msg)?;
    transport.send_text(text).await
}

impl Transport for WebSocket {
    async fn recv(&mut self) -> Result<Inbound, PushError> {
        loop {
            match StreamExt::next(self).await {
                None | Some(Ok(Message::Close(_))) => return Ok(Inbound::Closed),
                Some(Ok(Message::Text(text))) => return Ok(Inbound::Text(text.as_str().to_owned())),
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => return Ok(Inbound::Text(text)),
                    Err(_) => tracing::debug!("ignoring non-utf8 binary frame"),
                },
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                Some(Err(e)) => return Err(PushError::Transport(e.to_string())),
            }
        }
    }

    async fn send_text(&mut self, text: String) -> Result<(), PushError> {
        SinkExt::send(self, Message::text(text))
            .await
            .map_err(|e| PushError::Transport(e.to_string()))
    }

    async fn close(&mut self) {
        let _ = SinkExt::close(self).await;
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! In-memory transport driven by channels.

    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::mpsc;

    use super::{Inbound, Transport};
    use crate::error::PushError;

    /// Test-side ends of a [`ChannelTransport`].
    pub(crate) struct Peer {
        pub inbound: mpsc::UnboundedSender<String>,
        pub outbound: mpsc::UnboundedReceiver<String>,
        pub reads: Arc<AtomicUsize>,
    }

    impl Peer {
        pub(crate) fn send(&self, text: &str) {
            let _ = self.inbound.send(text.to_string());
        }

        pub(crate) fn reads(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }
    }

    /// Transport whose frames travel over unbounded channels.
    #[derive(Debug)]
    pub(crate) struct ChannelTransport {
        inbound: mpsc::UnboundedReceiver<String>,
        outbound: mpsc::UnboundedSender<String>,
        reads: Arc<AtomicUsize>,
    }

    pub(crate) fn pair() -> (ChannelTransport, Peer) {
        let (in_tx, in_rx) = mpsc::unbounded_channel();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let reads = Arc::new(AtomicUsize::new(0));
        let transport = ChannelTransport {
            inbound: in_rx,
            outbound: out_tx,
            reads: Arc::clone(&reads),
        };
        let peer = Peer {
            inbound: in_tx,
            outbound: out_rx,
            reads,
        };
        (transport, peer)
    }

    impl Transport for ChannelTransport {
        async fn recv(&mut self) -> Result<Inbound, PushError> {
            let _ = self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(match self.inbound.recv().await {
                Some(text) => Inbound::Text(text),
                None => Inbound::Closed,
            })
        }

        async fn send_text(&mut self, text: String) -> Result<(), PushError> {
            self.outbound.send(text).map_err(|_| PushError::Closed)
        }

        async fn close(&mut self) {}
    }
}
