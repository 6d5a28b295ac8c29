//! WebSocket upgrade handler for the product viewer stream.

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::http::HeaderValue;
use axum::http::header::SET_COOKIE;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::{debug, error, warn};

use liveview_core::error::AppError;
use liveview_realtime::connection::{
    ConnectRequest, Inbound, PendingConnection, Rejection, next_inbound,
};
use liveview_realtime::message::serializer::serialize_outbound;

use crate::error::ApiError;
use crate::extractors::{ProductTopic, UserAgent, Viewer};
use crate::state::AppState;

/// GET /ws/product/{id}/: WebSocket upgrade
///
/// Crawlers are refused with 403 before the upgrade. A session cookie
/// minted for an anonymous viewer is set on the upgrade response.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    ProductTopic(topic): ProductTopic,
    Viewer(viewer): Viewer,
    UserAgent(user_agent): UserAgent,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let request = ConnectRequest {
        topic,
        viewer: viewer.identity,
        user_agent,
    };

    let pending = match state.realtime.connections.admit(request) {
        Ok(pending) => pending,
        Err(Rejection::Bot) => {
            return Err(AppError::forbidden("Automated clients are not counted").into());
        }
    };

    let session = &state.config.session;
    let cookie = viewer.minted_session.map(|token| {
        format!(
            "{}={token}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
            session.cookie_name, session.cookie_max_age_seconds
        )
    });

    let mut response = ws.on_upgrade(move |socket| handle_ws_connection(state, pending, socket));

    if let Some(cookie) = cookie {
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => warn!(error = %e, "Could not encode session cookie"),
        }
    }

    Ok(response)
}

/// Runs an upgraded connection until either side closes it or the client
/// stays silent for a whole presence TTL window.
async fn handle_ws_connection(state: AppState, pending: PendingConnection, socket: WebSocket) {
    let connections = state.realtime.connections.clone();
    let idle_window = Duration::from_secs(state.config.presence.ttl_seconds);
    let (mut ws_tx, mut ws_rx) = socket.split();

    let (guard, mut outbound_rx) = connections.activate(pending).await;
    let handle = guard.handle().clone();
    let closed = handle.closed_token();
    let conn_id = handle.id;

    // Spawn outbound message forwarder
    let writer_closed = closed.clone();
    let outbound_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                msg = outbound_rx.recv() => {
                    let Some(msg) = msg else { break };
                    let text = match serialize_outbound(&msg) {
                        Ok(text) => text,
                        Err(e) => {
                            error!(conn_id = %conn_id, error = %e, "Failed to serialize outbound message");
                            continue;
                        }
                    };
                    if ws_tx.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                _ = writer_closed.cancelled() => {
                    let _ = ws_tx.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    });

    // Process inbound messages
    loop {
        tokio::select! {
            _ = closed.cancelled() => break,
            frame = next_inbound(&mut ws_rx, idle_window) => match frame {
                Inbound::Frame(Ok(Message::Text(text))) => {
                    connections.handle_inbound(&handle, text.as_str()).await;
                }
                Inbound::Frame(Ok(Message::Close(_))) | Inbound::Ended => break,
                // protocol pings are answered by axum
                Inbound::Frame(Ok(_)) => {}
                Inbound::Frame(Err(e)) => {
                    debug!(conn_id = %conn_id, error = %e, "WebSocket error");
                    break;
                }
                Inbound::Idle => {
                    debug!(conn_id = %conn_id, "No traffic for a TTL window; closing");
                    break;
                }
            },
        }
    }

    guard.close().await;
    let _ = outbound_task.await;
}
