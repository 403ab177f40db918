use crate::client::{CotSink, SinkConfig};
use crate::state::{ConnectionState, ConnectionStatus, MetricsSnapshot};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

/// Frame delimiter written after every event
const NEWLINE_DELIMITER: u8 = b'\n';

/// Persistent TCP connection, one newline-terminated event per frame
pub struct TcpSink {
    config: SinkConfig,
    status: ConnectionStatus,
    stream: Option<TcpStream>,
}

impl TcpSink {
    pub fn new(config: SinkConfig) -> Self {
        Self {
            config,
            status: ConnectionStatus::new(),
            stream: None,
        }
    }

    pub fn status(&self) -> &ConnectionStatus {
        &self.status
    }

    /// Configure TCP socket options
    fn configure_socket(&self, stream: &TcpStream) -> Result<()> {
        stream
            .set_nodelay(true)
            .context("Failed to set TCP_NODELAY")?;

        if let Some(interval) = self.config.keepalive {
            let keepalive = socket2::TcpKeepalive::new().with_time(interval);
            let socket = socket2::SockRef::from(stream);
            socket
                .set_tcp_keepalive(&keepalive)
                .context("Failed to set TCP keepalive")?;
        }

        Ok(())
    }

    /// Connect under the timeout and apply socket options
    async fn open_stream(&self) -> Result<TcpStream> {
        let stream = timeout(
            self.config.connect_timeout,
            TcpStream::connect(&self.config.server_addr),
        )
        .await
        .with_context(|| format!("Connection to {} timed out", self.config.server_addr))?
        .with_context(|| format!("Failed to connect to {}", self.config.server_addr))?;

        self.configure_socket(&stream)?;
        Ok(stream)
    }

    async fn write_frame(&mut self, data: &[u8]) -> Result<()> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| anyhow!("Not connected"))?;

        timeout(self.config.write_timeout, async {
            stream.write_all(data).await?;
            stream.write_all(&[NEWLINE_DELIMITER]).await?;
            stream.flush().await
        })
        .await
        .context("Write timeout")?
        .context("Write error")?;

        Ok(())
    }
}

#[async_trait]
impl CotSink for TcpSink {
    #[instrument(skip(self), fields(addr = %self.config.server_addr))]
    async fn connect(&mut self) -> Result<()> {
        self.status.set_state(ConnectionState::Connecting);
        info!("Connecting to {}", self.config.server_addr);

        let stream = match self.open_stream().await {
            Ok(stream) => stream,
            Err(e) => {
                self.status.set_failed();
                return Err(e);
            }
        };

        self.stream = Some(stream);
        self.status.set_state(ConnectionState::Connected);
        self.status.metrics().mark_connected();

        info!("Connected to {}", self.config.server_addr);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            info!("Disconnecting from {}", self.config.server_addr);
            // the peer may already be gone
            if let Err(e) = stream.shutdown().await {
                debug!(error = %e, "Stream shutdown failed");
            }
        }

        self.status.set_state(ConnectionState::Disconnected);
        self.status.metrics().mark_disconnected();
        Ok(())
    }

    async fn send(&mut self, frame: &[u8]) -> Result<()> {
        if !self.is_connected() {
            return Err(anyhow!("Not connected to {}", self.config.server_addr));
        }

        debug!(size = frame.len(), "Sending CoT event");

        if let Err(e) = self.write_frame(frame).await {
            warn!(error = %e, addr = %self.config.server_addr, "TCP send failed");
            self.status.set_failed();
            return Err(e);
        }

        self.status.metrics().record_sent(frame.len() as u64 + 1);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.status.is_connected() && self.stream.is_some()
    }

    fn describe(&self) -> String {
        format!("tcp://{}", self.config.server_addr)
    }

    fn metrics(&self) -> MetricsSnapshot {
        self.status.metrics().snapshot()
    }
}
