//! Shared test helpers for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::{Request, Response};
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use liveview_api::{AppState, build_app};
use liveview_cache::PresenceManager;
use liveview_core::config::AppConfig;
use liveview_realtime::RealtimeEngine;

/// Client side of a product stream.
pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Signing key used by servers built with [`TestServer::spawn`].
pub const JWT_SECRET: &str = "integration-secret";

/// A live server on an ephemeral port, backed by in-process presence.
pub struct TestServer {
    /// Bound address.
    pub addr: SocketAddr,
    /// Engine behind the server.
    pub engine: Arc<RealtimeEngine>,
}

impl TestServer {
    /// Start a server with the in-process presence store.
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    /// Start a server after adjusting its configuration.
    pub async fn spawn_with(configure: impl FnOnce(&mut AppConfig)) -> Self {
        let mut config = AppConfig::default();
        config.presence.provider = "memory".to_string();
        config.session.jwt_secret = JWT_SECRET.to_string();
        configure(&mut config);

        let presence = PresenceManager::new(&config.presence)
            .await
            .expect("Failed to init presence");
        let engine = Arc::new(
            RealtimeEngine::new(&config, presence)
                .await
                .expect("Failed to init engine"),
        );
        let app = build_app(AppState::new(Arc::new(config), Arc::clone(&engine)));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("No local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, engine }
    }

    /// Build an upgrade request for a product.
    pub fn request(&self, product: &str) -> Request {
        format!("ws://{}/ws/product/{product}/", self.addr)
            .into_client_request()
            .expect("Invalid request")
    }

    /// Open a product stream with default headers.
    pub async fn connect(&self, product: &str) -> (Client, Response) {
        self.connect_with(self.request(product))
            .await
            .expect("Upgrade failed")
    }

    /// Open a product stream with a prepared request.
    pub async fn connect_with(&self, request: Request) -> Result<(Client, Response), WsError> {
        connect_async(request).await
    }
}

/// Set a header on an upgrade request.
pub fn with_header(mut request: Request, name: &'static str, value: &str) -> Request {
    request
        .headers_mut()
        .insert(name, HeaderValue::from_str(value).expect("Bad header"));
    request
}

/// Next JSON text frame, failing after a second.
pub async fn next_json(client: &mut Client) -> Value {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(1), client.next())
            .await
            .expect("Timed out waiting for a frame")
            .expect("Stream ended")
            .expect("WebSocket error");
        if let Message::Text(text) = frame {
            return serde_json::from_str(&text).expect("Frame is not JSON");
        }
    }
}

/// Next `count_update` value.
pub async fn next_count(client: &mut Client) -> u64 {
    let msg = next_json(client).await;
    assert_eq!(msg["type"], "count_update", "unexpected frame: {msg}");
    msg["count"].as_u64().expect("count is not a number")
}

/// Assert no text frame arrives within a short window.
pub async fn assert_silent(client: &mut Client) {
    let frame = tokio::time::timeout(Duration::from_millis(200), client.next()).await;
    if let Ok(Some(Ok(Message::Text(text)))) = frame {
        panic!("expected silence, got {}", text.as_str());
    }
}

/// Send a text frame.
pub async fn send_text(client: &mut Client, text: &str) {
    client
        .send(Message::Text(text.into()))
        .await
        .expect("Send failed");
}

/// Wait for the server to close the stream; `false` if it stays open.
pub async fn wait_closed(client: &mut Client, within: Duration) -> bool {
    tokio::time::timeout(within, async {
        loop {
            match client.next().await {
                Some(Ok(msg)) if msg.is_close() => break,
                Some(Ok(_)) => continue,
                _ => break,
            }
        }
    })
    .await
    .is_ok()
}
