//! Supervisor counters
//!
//! Each counter is kept twice: as an atomic for the end-of-run [`Report`]
//! and through the `metrics` facade for the optional Prometheus exporter.

use anyhow::{Context, Result};
use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

pub const OBSERVATIONS_TOTAL: &str = "omnifeed_observations_total";
pub const EVENTS_FORWARDED_TOTAL: &str = "omnifeed_events_forwarded_total";
pub const EVENTS_FILTERED_TOTAL: &str = "omnifeed_events_filtered_total";
pub const SOURCE_FAILURES_TOTAL: &str = "omnifeed_source_failures_total";
pub const SOURCE_REJECTIONS_TOTAL: &str = "omnifeed_source_rejections_total";
pub const SEND_FAILURES_TOTAL: &str = "omnifeed_send_failures_total";
const BATCHES_TOTAL: &str = "omnifeed_batches_total";

#[derive(Debug, Default)]
pub struct SupervisorMetrics {
    batches: AtomicU64,
    observations: AtomicU64,
    forwarded: AtomicU64,
    filtered: AtomicU64,
    source_failures: AtomicU64,
    source_rejections: AtomicU64,
    send_failures: AtomicU64,
}

impl SupervisorMetrics {
    pub fn new() -> Self {
        describe_counter!(BATCHES_TOTAL, "Batches received from the source");
        describe_counter!(OBSERVATIONS_TOTAL, "Observations received from the source");
        describe_counter!(EVENTS_FORWARDED_TOTAL, "CoT events written to the sink");
        describe_counter!(EVENTS_FILTERED_TOTAL, "Observations dropped by the type filter");
        describe_counter!(SOURCE_FAILURES_TOTAL, "Source fetch or stream failures");
        describe_counter!(
            SOURCE_REJECTIONS_TOTAL,
            "Source failures a retry is not expected to fix, such as a rejected API key"
        );
        describe_counter!(SEND_FAILURES_TOTAL, "Failed sink writes and reconnects");

        Self::default()
    }

    pub fn record_batch(&self, size: usize) {
        self.batches.fetch_add(1, Ordering::Relaxed);
        self.observations.fetch_add(size as u64, Ordering::Relaxed);
        counter!(BATCHES_TOTAL).increment(1);
        counter!(OBSERVATIONS_TOTAL).increment(size as u64);
    }

    pub fn record_forwarded(&self) {
        self.forwarded.fetch_add(1, Ordering::Relaxed);
        counter!(EVENTS_FORWARDED_TOTAL).increment(1);
    }

    pub fn record_filtered(&self) {
        self.filtered.fetch_add(1, Ordering::Relaxed);
        counter!(EVENTS_FILTERED_TOTAL).increment(1);
    }

    /// Permanent failures are counted in both totals.
    pub fn record_source_failure(&self, permanent: bool) {
        self.source_failures.fetch_add(1, Ordering::Relaxed);
        counter!(SOURCE_FAILURES_TOTAL).increment(1);
        if permanent {
            self.source_rejections.fetch_add(1, Ordering::Relaxed);
            counter!(SOURCE_REJECTIONS_TOTAL).increment(1);
        }
    }

    pub fn record_send_failure(&self) {
        self.send_failures.fetch_add(1, Ordering::Relaxed);
        counter!(SEND_FAILURES_TOTAL).increment(1);
    }

    pub fn report(&self) -> Report {
        Report {
            batches: self.batches.load(Ordering::Relaxed),
            observations: self.observations.load(Ordering::Relaxed),
            forwarded: self.forwarded.load(Ordering::Relaxed),
            filtered: self.filtered.load(Ordering::Relaxed),
            source_failures: self.source_failures.load(Ordering::Relaxed),
            source_rejections: self.source_rejections.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
            ..Default::default()
        }
    }
}

/// Totals for one supervisor run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Report {
    pub batches: u64,
    pub observations: u64,
    pub forwarded: u64,
    pub filtered: u64,
    pub source_failures: u64,
    /// Source failures that were not transient
    pub source_rejections: u64,
    pub send_failures: u64,
    /// Bytes the sink delivered, across reconnects
    pub bytes_sent: u64,
    /// Successful sink connects, including the first
    pub sink_connects: u64,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} batches, {} observations, {} forwarded, {} filtered, {} source failures ({} rejected), \
             {} send failures, {} bytes sent over {} connections",
            self.batches,
            self.observations,
            self.forwarded,
            self.filtered,
            self.source_failures,
            self.source_rejections,
            self.send_failures,
            self.bytes_sent,
            self.sink_connects
        )
    }
}

/// Installs the global recorder and serves `/metrics` on `listen`.
///
/// Must be called from within a tokio runtime.
pub fn install_prometheus_exporter(listen: SocketAddr) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(listen)
        .install()
        .context("Failed to install Prometheus exporter")?;

    info!(bind_address = %listen, "Prometheus exporter listening");
    Ok(())
}
