use futures_util::{SinkExt, StreamExt};
use spots::SpotRecord;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::config::FeedConfig;
use crate::error::TransportError;
use crate::transport::{BoxFuture, FRAME_BUFFER, SpotTransport, UpdateChannel};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Bulk fetch over HTTP, updates over a WebSocket.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    spots_url: String,
    ws_url: String,
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &FeedConfig) -> Self {
        Self::with_client(config, reqwest::Client::new())
    }

    pub fn with_client(config: &FeedConfig, http: reqwest::Client) -> Self {
        Self {
            spots_url: config.spots_url(),
            ws_url: config.ws_url(),
            http,
        }
    }

    pub fn spots_url(&self) -> &str {
        &self.spots_url
    }

    pub fn ws_url(&self) -> &str {
        &self.ws_url
    }

    async fn fetch_spots(&self) -> Result<Vec<SpotRecord>, TransportError> {
        let resp = self
            .http
            .get(&self.spots_url)
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(TransportError::Fetch {
                status: resp.status().as_u16(),
            });
        }

        let items: Vec<serde_json::Value> = resp
            .json()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;
        let received = items.len();
        let spots = decode_spots(items);
        debug!(
            "fetched {} of {received} spots from {}",
            spots.len(),
            self.spots_url
        );
        Ok(spots)
    }

    async fn connect(&self) -> Result<UpdateChannel, TransportError> {
        let (stream, _resp) = tokio_tungstenite::connect_async(self.ws_url.as_str())
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        info!("update channel open: {}", self.ws_url);

        let (frames_tx, frames_rx) = mpsc::channel(FRAME_BUFFER);
        let (close_tx, close_rx) = oneshot::channel();
        let reader = tokio::spawn(read_frames(stream, frames_tx, close_rx));
        Ok(UpdateChannel::with_reader(frames_rx, close_tx, reader))
    }
}

impl SpotTransport for HttpTransport {
    fn load_initial_state(&self) -> BoxFuture<'_, Result<Vec<SpotRecord>, TransportError>> {
        Box::pin(self.fetch_spots())
    }

    fn open_update_channel(&self) -> BoxFuture<'_, Result<UpdateChannel, TransportError>> {
        Box::pin(self.connect())
    }
}

/// Decode each list entry on its own; an entry that is not a valid spot is
/// skipped so the rest of the list still loads.
fn decode_spots(items: Vec<serde_json::Value>) -> Vec<SpotRecord> {
    items
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| match serde_json::from_value::<SpotRecord>(item) {
            Ok(spot) => Some(spot),
            Err(e) => {
                debug!("dropping spot #{i}: {e}");
                None
            }
        })
        .collect()
}

/// Forward text frames until the server closes, the socket fails, the
/// consumer goes away or a close is requested.
async fn read_frames(
    stream: WsStream,
    frames: mpsc::Sender<String>,
    mut close_rx: oneshot::Receiver<()>,
) {
    let (mut sink, mut source) = stream.split();

    loop {
        tokio::select! {
            _ = &mut close_rx => {
                if let Err(e) = sink.send(Message::Close(None)).await {
                    debug!("close frame not sent: {e}");
                }
                break;
            }
            msg = source.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    if frames.send(text).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    info!("update channel closed by server");
                    break;
                }
                Some(Ok(_)) => {
                    // Binary, ping and pong frames carry no spot updates.
                }
                Some(Err(e)) => {
                    warn!("update channel error: {e}");
                    break;
                }
            }
        }
    }
}
