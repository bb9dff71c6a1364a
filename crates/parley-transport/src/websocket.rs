//! WebSocket client channel using `tokio-tungstenite`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{Notify, mpsc};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;

use crate::{
    Channel, ChannelConfig, ChannelEvent, ChannelEvents, ChannelState,
    ConnectionId, TransportError,
};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

const CONNECTING: u8 = 0;
const OPEN: u8 = 1;
const CLOSED: u8 = 2;

const CLOSED_LOCALLY: &str = "closed locally";

/// State shared between the handle and its driver task.
struct Shared {
    state: AtomicU8,
    close: Notify,
}

impl Shared {
    fn state(&self) -> ChannelState {
        match self.state.load(Ordering::Acquire) {
            CONNECTING => ChannelState::Connecting,
            OPEN => ChannelState::Open,
            _ => ChannelState::Closed,
        }
    }

    /// Moves `Connecting → Open`. Fails if the channel was closed meanwhile.
    fn mark_open(&self) -> bool {
        self.state
            .compare_exchange(CONNECTING, OPEN, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Moves to `Closed`, returning `false` if it already was.
    fn mark_closed(&self) -> bool {
        self.state.swap(CLOSED, Ordering::AcqRel) != CLOSED
    }
}

/// A WebSocket connection to the chat server.
///
/// The socket itself lives in a background task; this handle only holds
/// the bounded outbound queue and the shared lifecycle state. Dropping the
/// handle closes the connection.
pub struct WebSocketChannel {
    id: ConnectionId,
    shared: Arc<Shared>,
    outbound: mpsc::Sender<String>,
}

impl WebSocketChannel {
    /// Starts connecting to `url` and returns immediately.
    ///
    /// The returned channel is in [`ChannelState::Connecting`]. Progress is
    /// reported on the [`ChannelEvents`] receiver: [`ChannelEvent::Opened`]
    /// once the handshake completes, or [`ChannelEvent::Closed`] if it
    /// fails.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    /// Returns [`TransportError::InvalidUrl`] if `url` is not a usable
    /// `ws://` or `wss://` URL. Every later failure arrives as
    /// [`ChannelEvent::Closed`].
    pub fn open(
        url: impl Into<String>,
        config: &ChannelConfig,
    ) -> Result<(Self, ChannelEvents), TransportError> {
        let url = url.into();
        url.as_str()
            .into_client_request()
            .map_err(|e| TransportError::InvalidUrl(format!("{url}: {e}")))?;
        let id = ConnectionId::new(
            NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
        );
        let shared = Arc::new(Shared {
            state: AtomicU8::new(CONNECTING),
            close: Notify::new(),
        });
        let (outbound_tx, outbound_rx) =
            mpsc::channel(config.outbound_capacity.max(1));
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        tracing::debug!(%id, %url, "opening WebSocket channel");
        tokio::spawn(drive(url, id, Arc::clone(&shared), outbound_rx, events_tx));

        let channel = Self {
            id,
            shared,
            outbound: outbound_tx,
        };
        Ok((channel, events_rx))
    }
}

impl Channel for WebSocketChannel {
    type Error = TransportError;

    fn send(&self, frame: &str) -> Result<(), Self::Error> {
        let state = self.shared.state();
        if state != ChannelState::Open {
            return Err(TransportError::NotReady(state));
        }
        self.outbound
            .try_send(frame.to_owned())
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => {
                    TransportError::Backpressure
                }
                mpsc::error::TrySendError::Closed(_) => {
                    TransportError::ConnectionClosed(
                        "writer task gone".into(),
                    )
                }
            })
    }

    fn close(&self) {
        if self.shared.mark_closed() {
            tracing::debug!(id = %self.id, "closing channel");
            self.shared.close.notify_one();
        }
    }

    fn state(&self) -> ChannelState {
        self.shared.state()
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for WebSocketChannel {
    fn drop(&mut self) {
        self.close();
    }
}

/// Owns the socket for the lifetime of the connection and emits exactly
/// one `Closed` event when it ends.
async fn drive(
    url: String,
    id: ConnectionId,
    shared: Arc<Shared>,
    mut outbound: mpsc::Receiver<String>,
    events: mpsc::UnboundedSender<ChannelEvent>,
) {
    let reason = run(&url, id, &shared, &mut outbound, &events).await;
    shared.mark_closed();
    tracing::info!(%id, reason = reason.as_deref().unwrap_or("none"), "channel closed");
    // The receiver may already be gone; nobody is left to tell.
    let _ = events.send(ChannelEvent::Closed { reason });
}

/// Runs the connection. Returns the close reason, if any.
async fn run(
    url: &str,
    id: ConnectionId,
    shared: &Shared,
    outbound: &mut mpsc::Receiver<String>,
    events: &mpsc::UnboundedSender<ChannelEvent>,
) -> Option<String> {
    let connected = tokio::select! {
        result = tokio_tungstenite::connect_async(url) => result,
        () = shared.close.notified() => return Some(CLOSED_LOCALLY.into()),
    };

    let mut ws = match connected {
        Ok((ws, _response)) => ws,
        Err(e) => {
            let err = TransportError::ConnectFailed(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                e,
            ));
            tracing::warn!(%id, error = %err, "connect failed");
            return Some(err.to_string());
        }
    };

    if !shared.mark_open() {
        let _ = ws.close(None).await;
        return Some(CLOSED_LOCALLY.into());
    }
    tracing::info!(%id, %url, "channel open");
    let _ = events.send(ChannelEvent::Opened);

    let (mut sink, mut stream) = ws.split();

    loop {
        tokio::select! {
            frame = outbound.recv() => match frame {
                Some(text) => {
                    tracing::trace!(%id, bytes = text.len(), "sending frame");
                    if let Err(e) = sink.send(Message::Text(text.into())).await {
                        let err = TransportError::SendFailed(std::io::Error::new(
                            std::io::ErrorKind::BrokenPipe,
                            e,
                        ));
                        return Some(err.to_string());
                    }
                }
                // Every handle is gone.
                None => {
                    let _ = sink.close().await;
                    return Some(CLOSED_LOCALLY.into());
                }
            },

            msg = stream.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    let _ = events.send(ChannelEvent::Frame(text.as_str().to_owned()));
                }
                Some(Ok(Message::Binary(data))) => {
                    match String::from_utf8(data.to_vec()) {
                        Ok(text) => {
                            let _ = events.send(ChannelEvent::Frame(text));
                        }
                        Err(_) => {
                            tracing::debug!(%id, "discarding non-UTF-8 binary frame");
                        }
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    return frame
                        .map(|f| f.reason.as_str().to_owned())
                        .filter(|reason| !reason.is_empty());
                }
                None => return None,
                Some(Ok(_)) => continue, // ping/pong/raw frame
                Some(Err(e)) => {
                    let err = TransportError::ReceiveFailed(std::io::Error::new(
                        std::io::ErrorKind::ConnectionReset,
                        e,
                    ));
                    return Some(err.to_string());
                }
            },

            () = shared.close.notified() => {
                // Frames `send` already accepted still go out before the Close.
                while let Ok(text) = outbound.try_recv() {
                    if sink.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                let _ = sink.close().await;
                return Some(CLOSED_LOCALLY.into());
            }
        }
    }
}
