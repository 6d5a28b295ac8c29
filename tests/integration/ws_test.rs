//! Integration tests for the product viewer stream.

mod helpers;

use std::time::Duration;

use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::json;
use tokio_tungstenite::tungstenite::Error as WsError;

use helpers::{
    TestServer, assert_silent, next_count, next_json, send_text, wait_closed, with_header,
};

#[tokio::test]
async fn test_counts_follow_joins_and_leaves() {
    let server = TestServer::spawn().await;

    let (mut a, _) = server.connect("42").await;
    assert_eq!(next_count(&mut a).await, 1);

    let (mut b, _) = server.connect("42").await;
    assert_eq!(next_count(&mut a).await, 2);
    assert_eq!(next_count(&mut b).await, 2);

    a.close(None).await.expect("Close failed");
    assert_eq!(next_count(&mut b).await, 1);
}

#[tokio::test]
async fn test_products_are_independent() {
    let server = TestServer::spawn().await;

    let (mut a, _) = server.connect("1").await;
    assert_eq!(next_count(&mut a).await, 1);

    let (mut b, _) = server.connect("2").await;
    assert_eq!(next_count(&mut b).await, 1);
    assert_silent(&mut a).await;
}

#[tokio::test]
async fn test_ping_gets_exactly_pong() {
    let server = TestServer::spawn().await;
    let (mut client, _) = server.connect("7").await;
    let _ = next_count(&mut client).await;

    send_text(&mut client, r#"{"type":"ping"}"#).await;
    assert_eq!(next_json(&mut client).await, json!({"type": "pong"}));
    assert_silent(&mut client).await;
}

#[tokio::test]
async fn test_garbage_is_ignored_and_connection_survives() {
    let server = TestServer::spawn().await;
    let (mut client, _) = server.connect("7").await;
    let _ = next_count(&mut client).await;

    send_text(&mut client, "not json at all").await;
    send_text(&mut client, r#"{"type":"subscribe","channel":"x"}"#).await;
    assert_silent(&mut client).await;

    send_text(&mut client, r#"{"type":"ping"}"#).await;
    assert_eq!(next_json(&mut client).await["type"], "pong");
}

#[tokio::test]
async fn test_crawler_is_refused_before_upgrade() {
    let server = TestServer::spawn().await;
    let (mut shopper, _) = server.connect("42").await;
    assert_eq!(next_count(&mut shopper).await, 1);

    let request = with_header(
        server.request("42"),
        "user-agent",
        "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)",
    );
    match server.connect_with(request).await {
        Err(WsError::Http(response)) => assert_eq!(response.status(), 403),
        Err(e) => panic!("unexpected error: {e}"),
        Ok(_) => panic!("crawler was upgraded"),
    }

    assert_silent(&mut shopper).await;
    assert_eq!(server.engine.connections.connection_count(), 1);
    assert_eq!(server.engine.metrics.snapshot().bots_rejected, 1);
}

#[tokio::test]
async fn test_non_numeric_product_is_not_found() {
    let server = TestServer::spawn().await;
    match server.connect_with(server.request("abc")).await {
        Err(WsError::Http(response)) => assert_eq!(response.status(), 404),
        Err(e) => panic!("unexpected error: {e}"),
        Ok(_) => panic!("upgraded for a non-numeric product"),
    }
}

#[tokio::test]
async fn test_session_cookie_is_minted_and_reused() {
    let server = TestServer::spawn().await;

    let (mut first, response) = server.connect("5").await;
    assert_eq!(next_count(&mut first).await, 1);

    let set_cookie = response
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .expect("no session cookie minted")
        .to_string();
    assert!(set_cookie.starts_with("sessionid="));
    let cookie = set_cookie.split(';').next().unwrap().to_string();

    // a second tab with the same cookie is the same viewer
    let request = with_header(server.request("5"), "cookie", &cookie);
    let (mut second, response) = server.connect_with(request).await.unwrap();
    assert!(response.headers().get("set-cookie").is_none());
    assert_eq!(next_count(&mut second).await, 1);
    assert_eq!(next_count(&mut first).await, 1);
}

#[tokio::test]
async fn test_authenticated_viewer_counts_once_across_devices() {
    #[derive(serde::Serialize)]
    struct Claims {
        sub: String,
        exp: u64,
    }

    let server = TestServer::spawn().await;
    let token = encode(
        &Header::default(),
        &Claims {
            sub: "1001".to_string(),
            exp: (chrono::Utc::now().timestamp() + 600) as u64,
        },
        &EncodingKey::from_secret(helpers::JWT_SECRET.as_bytes()),
    )
    .unwrap();

    let phone = with_header(server.request("9"), "authorization", &format!("Bearer {token}"));
    let (mut phone, response) = server.connect_with(phone).await.unwrap();
    assert!(response.headers().get("set-cookie").is_none());
    assert_eq!(next_count(&mut phone).await, 1);

    let laptop = format!("ws://{}/ws/product/9/?token={token}", server.addr);
    let (mut laptop, _) = tokio_tungstenite::connect_async(laptop).await.unwrap();
    assert_eq!(next_count(&mut laptop).await, 1);
}

#[tokio::test]
async fn test_shutdown_closes_live_connections() {
    let server = TestServer::spawn().await;
    let (mut client, _) = server.connect("3").await;
    let _ = next_count(&mut client).await;

    server.engine.shutdown().await;
    assert_eq!(server.engine.connections.connection_count(), 0);

    assert!(
        wait_closed(&mut client, Duration::from_secs(1)).await,
        "client was not closed"
    );
}

#[tokio::test]
async fn test_upgrade_after_shutdown_is_closed_at_once() {
    let server = TestServer::spawn().await;
    server.engine.shutdown().await;

    let (mut late, _) = server.connect("3").await;
    assert!(
        wait_closed(&mut late, Duration::from_secs(1)).await,
        "late client was not closed"
    );
    assert_eq!(server.engine.connections.connection_count(), 0);
    assert_eq!(server.engine.metrics.snapshot().connections_active, 0);
}

#[tokio::test]
async fn test_silent_client_is_reaped_after_ttl_window() {
    let server = TestServer::spawn_with(|config| config.presence.ttl_seconds = 1).await;
    let (mut silent, _) = server.connect("8").await;
    let (mut chatty, _) = server.connect("8").await;
    let _ = next_count(&mut silent).await;

    let pinger = tokio::spawn(async move {
        loop {
            send_text(&mut chatty, r#"{"type":"ping"}"#).await;
            tokio::time::sleep(Duration::from_millis(300)).await;
        }
    });

    assert!(
        wait_closed(&mut silent, Duration::from_secs(3)).await,
        "silent client was not reaped"
    );
    let remaining = tokio::time::timeout(Duration::from_secs(1), async {
        while server.engine.connections.connection_count() != 1 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(remaining.is_ok(), "pinging client should stay connected");
    pinger.abort();
}
