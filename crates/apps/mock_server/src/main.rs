//! Demo backend for the live spot map.
//!
//! - `GET /health`
//! - `GET /spots`
//! - `WS /ws` pushes `spot.update` events from the simulator

mod board;
mod hub;
mod simulator;

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::http::{HeaderValue, Method, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde_json::json;
use tokio::sync::broadcast;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::board::{SpotBoard, seed_spots};

const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5173,http://127.0.0.1:5173";
const DEFAULT_SIM_INTERVAL_MS: u64 = 2000;

#[derive(Clone)]
struct AppState {
    board: Arc<SpotBoard>,
    hub: broadcast::Sender<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let addr: SocketAddr = env::var("MOCK_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:8000".to_string())
        .parse()
        .expect("invalid MOCK_ADDR");
    let origins = env::var("CORS_ORIGINS").unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.to_string());
    let period = sim_period(env_var_u64("SIM_INTERVAL_MS", DEFAULT_SIM_INTERVAL_MS));

    let state = AppState {
        board: Arc::new(SpotBoard::new(seed_spots())),
        hub: hub::hub(),
    };
    info!("seeded {} demo spots", state.board.len());
    tokio::spawn(simulator::run(
        state.board.clone(),
        state.hub.clone(),
        period,
    ));

    let app = router(state, cors_layer(&origins));

    info!("mock spot backend listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind MOCK_ADDR");
    axum::serve(listener, app).await.expect("server error");
}

fn router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/spots", get(list_spots))
        .route("/ws", get(ws_upgrade))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `*` anywhere in the list opens the API to every origin. Credentials are
/// only allowed for an explicit origin list.
fn cors_layer(origins: &str) -> CorsLayer {
    let origins: Vec<&str> = origins
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .collect();
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if origins.contains(&"*") {
        return base.allow_origin(AllowOrigin::any());
    }

    let origins: Vec<HeaderValue> = origins
        .into_iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("ignoring invalid CORS origin {o:?}");
                None
            }
        })
        .collect();

    base.allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
}

/// Simulator period; zero would stall the ticker, so it falls back to the default.
fn sim_period(ms: u64) -> Duration {
    if ms == 0 {
        warn!("SIM_INTERVAL_MS must be positive, using {DEFAULT_SIM_INTERVAL_MS}");
        return Duration::from_millis(DEFAULT_SIM_INTERVAL_MS);
    }
    Duration::from_millis(ms)
}

async fn health() -> Response {
    Json(json!({ "ok": true, "time": Utc::now().to_rfc3339() })).into_response()
}

async fn list_spots(State(state): State<AppState>) -> Response {
    Json(state.board.list()).into_response()
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let frames = state.hub.subscribe();
    ws.on_upgrade(move |socket| hub::serve_client(socket, frames))
}

fn env_var_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn state() -> AppState {
        AppState {
            board: Arc::new(SpotBoard::new(seed_spots())),
            hub: hub::hub(),
        }
    }

    /// Serve `app` on an ephemeral port and return the raw response to a
    /// cross-origin `GET /health`.
    async fn get_health_from(app: Router, origin: &str) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        let request = format!(
            "GET /health HTTP/1.1\r\nHost: {addr}\r\nOrigin: {origin}\r\nConnection: close\r\n\r\n"
        );
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response.to_ascii_lowercase()
    }

    #[tokio::test]
    async fn wildcard_origin_allows_any_without_credentials() {
        let app = router(state(), cors_layer("*"));
        let response = get_health_from(app, "http://anywhere.test").await;

        assert!(response.starts_with("http/1.1 200"), "{response}");
        assert!(response.contains("access-control-allow-origin: *"));
        assert!(!response.contains("access-control-allow-credentials"));
    }

    #[tokio::test]
    async fn wildcard_mixed_into_list_still_means_any() {
        let app = router(state(), cors_layer("http://localhost:5173, *"));
        let response = get_health_from(app, "http://anywhere.test").await;
        assert!(response.contains("access-control-allow-origin: *"));
    }

    #[tokio::test]
    async fn listed_origin_is_echoed_with_credentials() {
        let app = router(state(), cors_layer(DEFAULT_CORS_ORIGINS));
        let response = get_health_from(app, "http://localhost:5173").await;

        assert!(response.contains("access-control-allow-origin: http://localhost:5173"));
        assert!(response.contains("access-control-allow-credentials: true"));
    }

    #[test]
    fn zero_sim_interval_falls_back_to_default() {
        assert_eq!(sim_period(0), Duration::from_millis(DEFAULT_SIM_INTERVAL_MS));
        assert_eq!(sim_period(250), Duration::from_millis(250));
    }
}
