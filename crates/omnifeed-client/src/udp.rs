use crate::client::{CotSink, SinkConfig};
use crate::state::{ConnectionState, ConnectionStatus, MetricsSnapshot};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::net::{lookup_host, UdpSocket};
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

/// Datagrams above this size are likely to be fragmented (1500 MTU - IP and UDP headers)
const MAX_UDP_PACKET_SIZE: usize = 1472;

/// Connectionless sink: one datagram per event to a fixed destination
///
/// "Connecting" binds a local socket and resolves the destination once.
pub struct UdpSink {
    config: SinkConfig,
    status: ConnectionStatus,
    socket: Option<UdpSocket>,
    remote_addr: Option<SocketAddr>,
}

impl UdpSink {
    pub fn new(config: SinkConfig) -> Self {
        Self {
            config,
            status: ConnectionStatus::new(),
            socket: None,
            remote_addr: None,
        }
    }

    pub fn status(&self) -> &ConnectionStatus {
        &self.status
    }

    /// Address datagrams are sent to, once connected
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    async fn resolve(&self) -> Result<SocketAddr> {
        timeout(self.config.connect_timeout, lookup_host(&self.config.server_addr))
            .await
            .context("Address resolution timeout")?
            .with_context(|| format!("Failed to resolve {}", self.config.server_addr))?
            .next()
            .ok_or_else(|| anyhow!("No address found for {}", self.config.server_addr))
    }

    async fn bind_for(remote: &SocketAddr) -> Result<UdpSocket> {
        let local = match remote.ip() {
            IpAddr::V4(_) => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
            IpAddr::V6(_) => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
        };
        UdpSocket::bind(local)
            .await
            .with_context(|| format!("Failed to bind UDP socket on {}", local))
    }
}

#[async_trait]
impl CotSink for UdpSink {
    #[instrument(skip(self), fields(addr = %self.config.server_addr))]
    async fn connect(&mut self) -> Result<()> {
        self.status.set_state(ConnectionState::Connecting);

        let bound = match self.resolve().await {
            Ok(remote) => Self::bind_for(&remote).await.map(|socket| (socket, remote)),
            Err(e) => Err(e),
        };
        let (socket, remote) = match bound {
            Ok(pair) => pair,
            Err(e) => {
                self.status.set_failed();
                return Err(e);
            }
        };

        info!(
            local = ?socket.local_addr().ok(),
            remote = %remote,
            "UDP socket ready"
        );

        self.socket = Some(socket);
        self.remote_addr = Some(remote);
        self.status.set_state(ConnectionState::Connected);
        self.status.metrics().mark_connected();
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        if self.socket.take().is_some() {
            info!("Closing UDP socket");
        }
        self.remote_addr = None;
        self.status.set_state(ConnectionState::Disconnected);
        self.status.metrics().mark_disconnected();
        Ok(())
    }

    async fn send(&mut self, frame: &[u8]) -> Result<()> {
        let (socket, remote) = match (&self.socket, self.remote_addr) {
            (Some(socket), Some(remote)) if self.status.is_connected() => (socket, remote),
            _ => return Err(anyhow!("Socket not bound for {}", self.config.server_addr)),
        };

        if frame.len() > MAX_UDP_PACKET_SIZE {
            debug!(
                size = frame.len(),
                max_size = MAX_UDP_PACKET_SIZE,
                "Datagram exceeds MTU, may be fragmented"
            );
        }

        let result = timeout(self.config.write_timeout, socket.send_to(frame, remote))
            .await
            .context("Send timeout")
            .and_then(|r| r.context("Send error"));

        match result {
            Ok(sent) => {
                if sent != frame.len() {
                    warn!(expected = frame.len(), actual = sent, "Partial UDP datagram sent");
                }
                self.status.metrics().record_sent(sent as u64);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, remote = %remote, "UDP send failed");
                self.status.set_failed();
                Err(e)
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.status.is_connected() && self.socket.is_some()
    }

    fn describe(&self) -> String {
        format!("udp://{}", self.config.server_addr)
    }

    fn metrics(&self) -> MetricsSnapshot {
        self.status.metrics().snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_resolves_and_binds() {
        let mut sink = UdpSink::new(SinkConfig {
            server_addr: "127.0.0.1:6969".to_string(),
            ..Default::default()
        });
        sink.connect().await.unwrap();
        assert!(sink.is_connected());
        assert_eq!(sink.remote_addr(), Some("127.0.0.1:6969".parse().unwrap()));

        sink.disconnect().await.unwrap();
        assert!(!sink.is_connected());
        assert!(sink.send(b"<event/>").await.is_err());
    }

    #[tokio::test]
    async fn test_unparseable_address_fails() {
        let mut sink = UdpSink::new(SinkConfig {
            server_addr: "not an address".to_string(),
            ..Default::default()
        });
        assert!(sink.connect().await.is_err());
        assert!(sink.status().is_failed());
    }
}
