//! Sinks against local receivers

use omnifeed_client::{sink_for, CotSink, SinkConfig, TcpSink, UdpSink};
use omnifeed_core::types::Protocol;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{TcpListener, UdpSocket};

fn config(addr: std::net::SocketAddr, protocol: Protocol) -> SinkConfig {
    SinkConfig {
        server_addr: addr.to_string(),
        protocol,
        connect_timeout: Duration::from_secs(2),
        write_timeout: Duration::from_secs(2),
        keepalive: Some(Duration::from_secs(30)),
    }
}

#[tokio::test]
async fn test_tcp_frames_are_newline_terminated() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let receiver = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut lines = BufReader::new(stream).lines();
        let mut received = Vec::new();
        while let Some(line) = lines.next_line().await.unwrap() {
            received.push(line);
        }
        received
    });

    let mut sink = TcpSink::new(config(addr, Protocol::Tcp));
    sink.connect().await.unwrap();
    sink.send(b"<event uid=\"a\"/>").await.unwrap();
    sink.send(b"<event uid=\"b\"/>").await.unwrap();
    sink.disconnect().await.unwrap();

    let received = receiver.await.unwrap();
    assert_eq!(received, vec!["<event uid=\"a\"/>", "<event uid=\"b\"/>"]);

    let metrics = sink.metrics();
    assert_eq!(metrics.messages_sent, 2);
    assert_eq!(metrics.connects, 1);
}

#[tokio::test]
async fn test_tcp_connect_refused() {
    // bind then drop to get a port nobody listens on
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let mut sink = TcpSink::new(config(addr, Protocol::Tcp));
    assert!(sink.connect().await.is_err());
    assert!(!sink.is_connected());
    assert!(sink.status().is_failed());
}

#[tokio::test]
async fn test_tcp_send_fails_after_peer_closes() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let mut sink = TcpSink::new(config(addr, Protocol::Tcp));
    sink.connect().await.unwrap();

    let (peer, _) = listener.accept().await.unwrap();
    drop(peer);
    drop(listener);

    // the first writes may still land in the kernel buffer; a reset surfaces soon after
    let payload = vec![b'x'; 64 * 1024];
    let mut failed = false;
    for _ in 0..50 {
        if sink.send(&payload).await.is_err() {
            failed = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(failed, "send kept succeeding against a closed peer");
    assert!(!sink.is_connected());

    sink.disconnect().await.unwrap();
    assert!(sink.send(b"late").await.is_err());
}

#[tokio::test]
async fn test_tcp_reconnect_after_disconnect() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let mut sink = TcpSink::new(config(addr, Protocol::Tcp));
    sink.connect().await.unwrap();
    sink.disconnect().await.unwrap();
    sink.connect().await.unwrap();

    let accepted = tokio::spawn(async move {
        let (first, _) = listener.accept().await.unwrap();
        drop(first);
        let (second, _) = listener.accept().await.unwrap();
        let mut lines = BufReader::new(second).lines();
        lines.next_line().await.unwrap()
    });

    sink.send(b"<event/>").await.unwrap();
    assert_eq!(accepted.await.unwrap(), Some("<event/>".to_string()));
    assert_eq!(sink.metrics().connects, 2);
}

#[tokio::test]
async fn test_udp_one_datagram_per_event() {
    let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = receiver.local_addr().unwrap();

    let mut sink = UdpSink::new(config(addr, Protocol::Udp));
    sink.connect().await.unwrap();
    sink.send(b"<event uid=\"one\"/>").await.unwrap();
    sink.send(b"<event uid=\"two\"/>").await.unwrap();

    let mut buf = [0u8; 2048];
    let (n, _) = receiver.recv_from(&mut buf).await.unwrap();
    assert_eq!(&buf[..n], b"<event uid=\"one\"/>");
    let (n, _) = receiver.recv_from(&mut buf).await.unwrap();
    assert_eq!(&buf[..n], b"<event uid=\"two\"/>");

    assert_eq!(sink.metrics().messages_sent, 2);
}

#[tokio::test]
async fn test_boxed_sink_by_protocol() {
    let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = receiver.local_addr().unwrap();

    let mut sink: Box<dyn CotSink> = sink_for(config(addr, Protocol::Udp));
    sink.connect().await.unwrap();
    sink.send(b"<event/>").await.unwrap();

    let mut buf = [0u8; 64];
    let (n, _) = receiver.recv_from(&mut buf).await.unwrap();
    assert_eq!(&buf[..n], b"<event/>");
}
