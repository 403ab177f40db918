//! AISstream consumer against a local WebSocket server

use futures_util::{SinkExt, StreamExt};
use omnifeed_core::config::MaritimeConfig;
use omnifeed_core::error::{ConnectionError, TimeoutError};
use omnifeed_core::types::Numeric;
use omnifeed_core::OmniFeedError;
use omnifeed_source::{AisStreamSource, ObservationSource, StreamState};
use serde_json::{json, Value};
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, WebSocketStream};

fn config(addr: SocketAddr) -> MaritimeConfig {
    MaritimeConfig {
        endpoint: format!("ws://{}", addr),
        api_key: Some("test-key".to_string()),
        connect_timeout_secs: 2,
        idle_timeout_secs: 2,
        ..Default::default()
    }
}

fn position_report(mmsi: u64) -> String {
    json!({
        "MessageType": "PositionReport",
        "MetaData": {"MMSI": mmsi, "ShipName": "PATROL ONE   "},
        "Message": {"PositionReport": {
            "Latitude": 36.85, "Longitude": -76.3, "TrueHeading": 270, "Sog": 12.5
        }}
    })
    .to_string()
}

/// Accept one client and check its subscription frame
async fn accept_subscribed(listener: &TcpListener) -> WebSocketStream<TcpStream> {
    let (stream, _) = listener.accept().await.unwrap();
    let mut ws = accept_async(stream).await.unwrap();
    let subscription = match ws.next().await.unwrap().unwrap() {
        Message::Text(text) => text.as_str().to_owned(),
        other => panic!("expected subscription text frame, got {:?}", other),
    };
    let subscription: Value = serde_json::from_str(&subscription).unwrap();
    assert_eq!(subscription["APIKey"], "test-key");
    assert_eq!(subscription["BoundingBoxes"], json!([[[-180.0, -90.0], [180.0, 90.0]]]));
    ws
}

#[tokio::test]
async fn test_subscribe_and_receive() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let mut ws = accept_subscribed(&listener).await;
        ws.send(Message::Ping(vec![1, 2, 3].into())).await.unwrap();
        ws.send(Message::Text(position_report(338123456).into())).await.unwrap();
        let static_data = json!({
            "MessageType": "StaticData",
            "MetaData": {"MMSI": 244660000, "ShipName": "EVER GIVEN"},
            "Message": {"StaticData": {"Type": 70}}
        });
        ws.send(Message::Binary(static_data.to_string().into_bytes().into())).await.unwrap();
        ws.send(Message::Text(r#"{"MessageType": "UnknownMessage"}"#.into())).await.unwrap();
        ws.send(Message::Text("{broken".into())).await.unwrap();
        // keep the socket open until the client is done
        while let Some(Ok(_)) = ws.next().await {}
    });

    let mut source = AisStreamSource::new(config(addr)).unwrap();

    let batch = source.next_batch().await.unwrap();
    assert_eq!(source.state(), StreamState::Receiving);
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].id.as_deref(), Some("338123456"));
    assert_eq!(batch[0].name.as_deref(), Some("PATROL ONE"));
    assert_eq!(batch[0].course, Some(Numeric::Integer(270)));
    assert_eq!(batch[0].speed, Some(Numeric::Real(12.5)));

    let batch = source.next_batch().await.unwrap();
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].type_code, Some(70));

    assert!(source.next_batch().await.unwrap().is_empty());
    assert!(source.next_batch().await.unwrap().is_empty());

    source.reset().await;
    assert_eq!(source.state(), StreamState::Disconnected);
    server.await.unwrap();
}

#[tokio::test]
async fn test_close_is_error_then_reconnects() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let mut ws = accept_subscribed(&listener).await;
        ws.close(None).await.unwrap();
        drop(ws);

        let mut ws = accept_subscribed(&listener).await;
        ws.send(Message::Text(position_report(366999999).into())).await.unwrap();
        while let Some(Ok(_)) = ws.next().await {}
    });

    let mut source = AisStreamSource::new(config(addr)).unwrap();

    let err = source.next_batch().await.unwrap_err();
    assert!(matches!(
        err,
        OmniFeedError::Connection(ConnectionError::ConnectionClosed { .. })
    ));
    assert_eq!(source.state(), StreamState::Disconnected);

    source.reset().await;
    let batch = source.next_batch().await.unwrap();
    assert_eq!(batch[0].id.as_deref(), Some("366999999"));

    source.reset().await;
    server.await.unwrap();
}

#[tokio::test]
async fn test_idle_stream_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let mut ws = accept_subscribed(&listener).await;
        while let Some(Ok(_)) = ws.next().await {}
    });

    let mut cfg = config(addr);
    cfg.idle_timeout_secs = 1;
    let mut source = AisStreamSource::new(cfg).unwrap();

    let err = source.next_batch().await.unwrap_err();
    assert!(matches!(
        err,
        OmniFeedError::Timeout(TimeoutError::IdleTimeout { timeout_secs: 1 })
    ));
    assert_eq!(source.state(), StreamState::Disconnected);
    server.await.unwrap();
}

#[tokio::test]
async fn test_provider_error_message_is_auth_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let mut ws = accept_subscribed(&listener).await;
        ws.send(Message::Text(r#"{"error": "Api Key Is Not Valid"}"#.into())).await.unwrap();
        while let Some(Ok(_)) = ws.next().await {}
    });

    let mut source = AisStreamSource::new(config(addr)).unwrap();
    let err = source.next_batch().await.unwrap_err();
    assert!(matches!(
        err,
        OmniFeedError::Connection(ConnectionError::AuthenticationFailed { .. })
    ));
    assert!(!err.is_transient());
    server.await.unwrap();
}

#[tokio::test]
async fn test_connect_refused() {
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let mut source = AisStreamSource::new(config(addr)).unwrap();
    let err = source.next_batch().await.unwrap_err();
    assert!(matches!(
        err,
        OmniFeedError::Connection(ConnectionError::ConnectionFailed { .. })
    ));
    assert_eq!(source.state(), StreamState::Disconnected);
}
