use std::sync::Arc;

use axum::Router;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Json;
use chrono::{TimeZone, Utc};
use feed::{
    BootstrapState, ChannelState, FeedConfig, HttpTransport, SessionOptions, SpotTransport,
    TransportError, spawn_session,
};
use pretty_assertions::assert_eq;
use spots::{SpotRecord, SpotStatus, UpdateEvent, encode_event};
use tokio::sync::mpsc;

async fn serve(app: Router) -> FeedConfig {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    FeedConfig::default()
        .with_api_url(format!("http://{addr}"))
        .unwrap()
}

fn at(id: &str, lat: f64, lng: f64, status: SpotStatus) -> SpotRecord {
    let mut spot = SpotRecord::new(id, lat, lng, status);
    spot.updated_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    spot
}

fn seeds() -> Vec<SpotRecord> {
    vec![
        at("A1", 47.62319, -122.3546, SpotStatus::Available),
        at("B1", 47.62190, -122.3527, SpotStatus::Occupied),
        at("C1", 47.62160, -122.3515, SpotStatus::Soon),
    ]
}

fn update(id: &str, status: SpotStatus) -> SpotRecord {
    at(id, 47.6223, -122.3519, status)
}

async fn push_then_close(mut socket: WebSocket, frames: Vec<String>) {
    for frame in frames {
        if socket.send(Message::Text(frame)).await.is_err() {
            return;
        }
    }
    let _ = socket.send(Message::Close(None)).await;
}

fn ws_route(frames: Vec<String>) -> axum::routing::MethodRouter {
    get(move |ws: WebSocketUpgrade| {
        let frames = frames.clone();
        async move { ws.on_upgrade(move |socket| push_then_close(socket, frames)) }
    })
}

#[tokio::test]
async fn fetch_returns_spots_in_received_order() {
    let app = Router::new().route("/spots", get(|| async { Json(seeds()) }));
    let cfg = serve(app).await;

    let spots = HttpTransport::new(&cfg).load_initial_state().await.unwrap();
    assert_eq!(spots, seeds());
}

#[tokio::test]
async fn non_success_status_is_fetch_error() {
    let app = Router::new().route(
        "/spots",
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down").into_response() }),
    );
    let cfg = serve(app).await;

    let err = HttpTransport::new(&cfg).load_initial_state().await.unwrap_err();
    assert_eq!(err, TransportError::Fetch { status: 503 });
}

#[tokio::test]
async fn body_that_is_not_a_list_is_rejected() {
    let app = Router::new().route("/spots", get(|| async { "{\"spots\": []}" }));
    let cfg = serve(app).await;

    let err = HttpTransport::new(&cfg).load_initial_state().await.unwrap_err();
    assert!(matches!(err, TransportError::Body(_)), "got {err:?}");
}

#[tokio::test]
async fn undecodable_records_are_dropped_individually() {
    let body = r#"[
        {"id":"A1","lat":47.62319,"lng":-122.3546,"status":"available","confidence":1.0,"updatedAt":"2024-05-01T12:00:00Z"},
        {"id":"B1","lat":47.6219,"lng":-122.3527,"status":"occupied","confidence":1.0,"updatedAt":"2024-05-01T12:00:00"},
        {"id":3}
    ]"#;
    let app = Router::new().route("/spots", get(move || async move { body }));
    let cfg = serve(app).await;

    let spots = HttpTransport::new(&cfg).load_initial_state().await.unwrap();
    let ids: Vec<&str> = spots.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["A1"]);
}

#[tokio::test]
async fn channel_delivers_only_spot_updates() {
    let wanted = update("B1", SpotStatus::Available);
    let frames = vec![
        r#"{"type":"ping"}"#.to_string(),
        "definitely not json".to_string(),
        encode_event(&UpdateEvent::spot_update(wanted.clone())),
    ];
    let app = Router::new().route("/ws", ws_route(frames));
    let cfg = serve(app).await;

    let mut channel = HttpTransport::new(&cfg).open_update_channel().await.unwrap();
    assert_eq!(channel.next_update().await, Some(wanted));
    assert_eq!(channel.next_update().await, None);
}

#[tokio::test]
async fn missing_ws_endpoint_is_connect_error() {
    let app = Router::new().route("/spots", get(|| async { Json(seeds()) }));
    let cfg = serve(app).await;

    let result = HttpTransport::new(&cfg).open_update_channel().await;
    assert!(matches!(result, Err(TransportError::Connect(_))));
}

#[tokio::test]
async fn close_sends_close_frame() {
    let (seen_tx, mut seen_rx) = mpsc::channel::<()>(1);
    let app = Router::new().route(
        "/ws",
        get(move |ws: WebSocketUpgrade| {
            let seen_tx = seen_tx.clone();
            async move {
                ws.on_upgrade(move |mut socket: WebSocket| async move {
                    while let Some(Ok(msg)) = socket.recv().await {
                        if let Message::Close(_) = msg {
                            let _ = seen_tx.send(()).await;
                            break;
                        }
                    }
                })
            }
        }),
    );
    let cfg = serve(app).await;

    let channel = HttpTransport::new(&cfg).open_update_channel().await.unwrap();
    channel.close().await;
    assert_eq!(seen_rx.recv().await, Some(()));
}

#[tokio::test]
async fn session_bootstraps_then_applies_pushed_updates() {
    let frames = vec![encode_event(&UpdateEvent::spot_update(update(
        "N1",
        SpotStatus::Soon,
    )))];
    let app = Router::new()
        .route("/spots", get(|| async { Json(seeds()) }))
        .route("/ws", ws_route(frames));
    let cfg = serve(app).await;

    let handle = spawn_session(
        Arc::new(HttpTransport::new(&cfg)),
        SessionOptions::from(&cfg),
    );
    let mut view = handle.view();
    let v = view
        .wait_for(|v| v.get("N1").is_some())
        .await
        .unwrap()
        .clone();
    let ids: Vec<&str> = v.spots.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["N1", "A1", "B1", "C1"]);
    assert!(v.is_suppressed("B1"));

    let mut health = handle.health();
    let h = health
        .wait_for(|h| h.channel == ChannelState::Closed)
        .await
        .unwrap()
        .clone();
    assert_eq!(h.bootstrap, BootstrapState::Loaded { count: 3 });
    handle.shutdown().await;
}
