use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Broadcast channel capacity; slow clients past this skip frames.
pub const HUB_CAPACITY: usize = 64;

pub fn hub() -> broadcast::Sender<String> {
    broadcast::channel(HUB_CAPACITY).0
}

/// Push every hub frame to one client until either side goes away.
/// Inbound text is read and ignored.
pub async fn serve_client(socket: WebSocket, mut frames: broadcast::Receiver<String>) {
    let conn_id = Uuid::new_v4();
    let (mut ws_tx, mut ws_rx) = socket.split();
    info!("ws client {conn_id} connected");

    loop {
        tokio::select! {
            frame = frames.recv() => match frame {
                Ok(text) => {
                    if let Err(e) = ws_tx.send(Message::Text(text)).await {
                        debug!("ws client {conn_id} send failed: {e}");
                        break;
                    }
                }
                Err(RecvError::Lagged(n)) => {
                    warn!("ws client {conn_id} lagged, skipped {n} updates");
                }
                Err(RecvError::Closed) => break,
            },
            msg = ws_rx.next() => match msg {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!("ws client {conn_id} receive error: {e}");
                    break;
                }
            },
        }
    }

    info!("ws client {conn_id} disconnected");
}
