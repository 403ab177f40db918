//! # omnifeed-client
//!
//! Transport sinks that deliver encoded CoT events to a situational-awareness
//! consumer.
//!
//! - **TCP**: one persistent connection, each event followed by a newline
//! - **UDP**: one datagram per event to a fixed destination
//!
//! Sinks never retry on their own. A failed send leaves the sink in the
//! `Failed` state; the owner disconnects it and reconnects after its backoff.
//!
//! ## Example
//!
//! ```rust,no_run
//! use omnifeed_client::{sink_for, SinkConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut sink = sink_for(SinkConfig {
//!         server_addr: "127.0.0.1:8087".to_string(),
//!         ..Default::default()
//!     });
//!     sink.connect().await?;
//!     sink.send(br#"<event version="2.0" .../>"#).await?;
//!     sink.disconnect().await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod state;
pub mod tcp;
pub mod udp;

pub use client::{sink_for, CotSink, SinkConfig};
pub use state::{ConnectionMetrics, ConnectionState, ConnectionStatus, MetricsSnapshot};
pub use tcp::TcpSink;
pub use udp::UdpSink;
