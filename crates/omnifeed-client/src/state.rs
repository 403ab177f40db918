use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

/// Connection state for a sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No socket held
    Disconnected,
    /// Connect in progress
    Connecting,
    /// Socket ready for sends
    Connected,
    /// Last operation failed; the socket must be recreated
    Failed,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "Disconnected"),
            ConnectionState::Connecting => write!(f, "Connecting"),
            ConnectionState::Connected => write!(f, "Connected"),
            ConnectionState::Failed => write!(f, "Failed"),
        }
    }
}

/// Counters for one sink, shared across reconnects
#[derive(Debug, Clone)]
pub struct ConnectionMetrics {
    bytes_sent: Arc<AtomicU64>,
    messages_sent: Arc<AtomicU64>,
    errors: Arc<AtomicU64>,
    connects: Arc<AtomicU64>,
    connected_at: Arc<RwLock<Option<SystemTime>>>,
}

impl Default for ConnectionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionMetrics {
    pub fn new() -> Self {
        Self {
            bytes_sent: Arc::new(AtomicU64::new(0)),
            messages_sent: Arc::new(AtomicU64::new(0)),
            errors: Arc::new(AtomicU64::new(0)),
            connects: Arc::new(AtomicU64::new(0)),
            connected_at: Arc::new(RwLock::new(None)),
        }
    }

    /// Record one delivered frame of `bytes` bytes
    pub fn record_sent(&self, bytes: u64) {
        self.bytes_sent.fetch_add(bytes, Ordering::Relaxed);
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Mark connection as established
    pub fn mark_connected(&self) {
        *self.connected_at.write() = Some(SystemTime::now());
        self.connects.fetch_add(1, Ordering::Relaxed);
    }

    pub fn mark_disconnected(&self) {
        *self.connected_at.write() = None;
    }

    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent.load(Ordering::Relaxed)
    }

    pub fn messages_sent(&self) -> u64 {
        self.messages_sent.load(Ordering::Relaxed)
    }

    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    /// Number of successful connects, including the first
    pub fn connects(&self) -> u64 {
        self.connects.load(Ordering::Relaxed)
    }

    pub fn connected_at(&self) -> Option<SystemTime> {
        *self.connected_at.read()
    }

    /// Get a snapshot of current metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            bytes_sent: self.bytes_sent(),
            messages_sent: self.messages_sent(),
            errors: self.errors(),
            connects: self.connects(),
            connected_at: self.connected_at(),
        }
    }
}

/// Snapshot of connection metrics at a point in time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub bytes_sent: u64,
    pub messages_sent: u64,
    pub errors: u64,
    pub connects: u64,
    pub connected_at: Option<SystemTime>,
}

/// Combined connection state and metrics
#[derive(Debug, Clone)]
pub struct ConnectionStatus {
    state: Arc<RwLock<ConnectionState>>,
    metrics: ConnectionMetrics,
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionStatus {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            metrics: ConnectionMetrics::new(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    pub fn set_state(&self, state: ConnectionState) {
        *self.state.write() = state;
    }

    pub fn metrics(&self) -> &ConnectionMetrics {
        &self.metrics
    }

    /// Count a failure and move to `Failed`
    pub fn set_failed(&self) {
        self.metrics.record_error();
        self.set_state(ConnectionState::Failed);
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state(), ConnectionState::Connected)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state(), ConnectionState::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_state_display() {
        assert_eq!(ConnectionState::Connected.to_string(), "Connected");
        assert_eq!(ConnectionState::Failed.to_string(), "Failed");
    }

    #[test]
    fn test_metrics_recording() {
        let metrics = ConnectionMetrics::new();

        metrics.record_sent(100);
        metrics.record_sent(50);
        metrics.record_error();
        metrics.mark_connected();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.bytes_sent, 150);
        assert_eq!(snapshot.messages_sent, 2);
        assert_eq!(snapshot.errors, 1);
        assert_eq!(snapshot.connects, 1);
        assert!(snapshot.connected_at.is_some());
    }

    #[test]
    fn test_connection_status() {
        let status = ConnectionStatus::new();

        assert_eq!(status.state(), ConnectionState::Disconnected);
        assert!(!status.is_connected());

        status.set_state(ConnectionState::Connected);
        assert!(status.is_connected());

        status.set_failed();
        assert!(status.is_failed());
        assert!(!status.is_connected());
        assert_eq!(status.metrics().errors(), 1);
    }
}
