//! Transport abstraction for spot feeds.
//!
//! A transport performs the initial bulk fetch and opens the push-update
//! channel. Implementations:
//! - `HttpTransport` (HTTP fetch + WebSocket channel)
//! - `MemoryTransport` (in-process, fed through an mpsc sender)

use std::future::Future;
use std::pin::Pin;

use parking_lot::Mutex;
use spots::{MessageDecodeError, SpotRecord, decode_frame};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::error::TransportError;

/// Type alias for a boxed future that can be sent between threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Frames buffered between the socket reader and the session.
pub const FRAME_BUFFER: usize = 256;

/// Source of spot state: bulk fetch plus push updates.
///
/// Methods return boxed futures for dyn-compatibility.
pub trait SpotTransport: Send + Sync {
    /// Fetch the full spot collection, in the order received.
    fn load_initial_state(&self) -> BoxFuture<'_, Result<Vec<SpotRecord>, TransportError>>;

    /// Open the push-update channel.
    fn open_update_channel(&self) -> BoxFuture<'_, Result<UpdateChannel, TransportError>>;
}

/// Inbound side of an open update channel.
///
/// Raw text frames arrive from a reader task; decoding happens here so
/// every transport drops malformed and foreign frames the same way.
/// Delivery is at-most-once with no acknowledgment and no replay.
pub struct UpdateChannel {
    frames: mpsc::Receiver<String>,
    close_tx: Option<oneshot::Sender<()>>,
    reader: Option<JoinHandle<()>>,
}

impl UpdateChannel {
    pub(crate) fn with_reader(
        frames: mpsc::Receiver<String>,
        close_tx: oneshot::Sender<()>,
        reader: JoinHandle<()>,
    ) -> Self {
        Self {
            frames,
            close_tx: Some(close_tx),
            reader: Some(reader),
        }
    }

    /// Channel fed directly by the holder of the matching sender.
    pub fn from_frames(frames: mpsc::Receiver<String>) -> Self {
        Self {
            frames,
            close_tx: None,
            reader: None,
        }
    }

    /// Next decoded spot update, skipping frames that are not one.
    ///
    /// Returns `None` once the channel is closed. Cancel-safe.
    pub async fn next_update(&mut self) -> Option<SpotRecord> {
        while let Some(text) = self.frames.recv().await {
            match decode_frame(&text) {
                Ok(event) => return Some(event.into_payload()),
                Err(MessageDecodeError::UnexpectedType(ty)) => {
                    trace!("ignoring {ty} frame");
                }
                Err(e) => debug!("dropping update frame: {e}"),
            }
        }
        None
    }

    /// Close the channel and wait for the reader to finish.
    pub async fn close(mut self) {
        if let Some(tx) = self.close_tx.take() {
            let _ = tx.send(());
        }
        self.frames.close();
        if let Some(reader) = self.reader.take() {
            let _ = reader.await;
        }
    }
}

/// In-process transport for tests and demos.
///
/// The initial state is returned as configured on every fetch; the update
/// channel can be opened once and is fed through the sender returned by
/// [`MemoryTransport::new`].
pub struct MemoryTransport {
    initial: Result<Vec<SpotRecord>, TransportError>,
    frames: Mutex<Option<mpsc::Receiver<String>>>,
    connect_error: Option<TransportError>,
}

impl MemoryTransport {
    pub fn new(initial: Result<Vec<SpotRecord>, TransportError>) -> (Self, mpsc::Sender<String>) {
        let (tx, rx) = mpsc::channel(FRAME_BUFFER);
        let transport = Self {
            initial,
            frames: Mutex::new(Some(rx)),
            connect_error: None,
        };
        (transport, tx)
    }

    /// Make `open_update_channel` fail with `error`.
    pub fn with_connect_error(mut self, error: TransportError) -> Self {
        self.connect_error = Some(error);
        self
    }
}

impl SpotTransport for MemoryTransport {
    fn load_initial_state(&self) -> BoxFuture<'_, Result<Vec<SpotRecord>, TransportError>> {
        let initial = self.initial.clone();
        Box::pin(async move { initial })
    }

    fn open_update_channel(&self) -> BoxFuture<'_, Result<UpdateChannel, TransportError>> {
        Box::pin(async move {
            if let Some(err) = &self.connect_error {
                return Err(err.clone());
            }
            self.frames
                .lock()
                .take()
                .map(UpdateChannel::from_frames)
                .ok_or_else(|| TransportError::Connect("memory channel already taken".to_string()))
        })
    }
}
