use crate::state::MetricsSnapshot;
use crate::tcp::TcpSink;
use crate::udp::UdpSink;
use anyhow::Result;
use async_trait::async_trait;
use omnifeed_core::config::DestinationConfig;
use omnifeed_core::types::Protocol;
use std::time::Duration;

/// Configuration for a CoT sink
#[derive(Debug, Clone)]
pub struct SinkConfig {
    /// Consumer address as `host:port`
    pub server_addr: String,
    /// Transport
    pub protocol: Protocol,
    /// Connection timeout (TCP)
    pub connect_timeout: Duration,
    /// Write timeout
    pub write_timeout: Duration,
    /// TCP keepalive idle time, `None` disables keepalive
    pub keepalive: Option<Duration>,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            server_addr: String::new(),
            protocol: Protocol::Tcp,
            connect_timeout: Duration::from_secs(10),
            write_timeout: Duration::from_secs(10),
            keepalive: Some(Duration::from_secs(60)),
        }
    }
}

impl From<&DestinationConfig> for SinkConfig {
    fn from(destination: &DestinationConfig) -> Self {
        Self {
            server_addr: destination.address(),
            protocol: destination.protocol,
            connect_timeout: destination.connect_timeout(),
            write_timeout: destination.write_timeout(),
            keepalive: destination.keepalive(),
        }
    }
}

/// Outbound transport for encoded CoT events
///
/// Sends are fire-and-forget: no acknowledgement is read and a failed send
/// is not retried here. The caller decides whether to disconnect and
/// reconnect.
#[async_trait]
pub trait CotSink: Send + Sync {
    /// Open the transport
    async fn connect(&mut self) -> Result<()>;

    /// Release the transport; safe to call when already disconnected
    async fn disconnect(&mut self) -> Result<()>;

    /// Deliver one encoded event as one frame
    async fn send(&mut self, frame: &[u8]) -> Result<()>;

    /// Check if the sink currently holds a usable transport
    fn is_connected(&self) -> bool;

    /// Short description for logs, e.g. `tcp://127.0.0.1:8087`
    fn describe(&self) -> String;

    /// Delivery counters
    fn metrics(&self) -> MetricsSnapshot;
}

/// Builds the sink matching the configured protocol
pub fn sink_for(config: SinkConfig) -> Box<dyn CotSink> {
    match config.protocol {
        Protocol::Tcp => Box::new(TcpSink::new(config)),
        Protocol::Udp => Box::new(UdpSink::new(config)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SinkConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.protocol, Protocol::Tcp);
    }

    #[test]
    fn test_config_from_destination() {
        let destination = DestinationConfig {
            host: "::1".to_string(),
            port: 6969,
            protocol: Protocol::Udp,
            keepalive_secs: 0,
            ..Default::default()
        };
        let config = SinkConfig::from(&destination);
        assert_eq!(config.server_addr, "[::1]:6969");
        assert_eq!(config.protocol, Protocol::Udp);
        assert_eq!(config.keepalive, None);
    }

    #[test]
    fn test_sink_for_protocol() {
        let tcp = sink_for(SinkConfig {
            server_addr: "127.0.0.1:8087".to_string(),
            ..Default::default()
        });
        assert_eq!(tcp.describe(), "tcp://127.0.0.1:8087");
        assert!(!tcp.is_connected());

        let udp = sink_for(SinkConfig {
            server_addr: "127.0.0.1:8087".to_string(),
            protocol: Protocol::Udp,
            ..Default::default()
        });
        assert_eq!(udp.describe(), "udp://127.0.0.1:8087");
    }
}
