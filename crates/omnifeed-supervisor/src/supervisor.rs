//! Control loop driving one source into one sink.
//!
//! ```text
//!            batch ok / pace elapsed
//!           ┌───────────┐
//!           ▼           │
//!       ┌─────────┐ ────┘      source error / send error
//!  ───► │ Running │ ─────────────────────────────┐
//!       └─────────┘                              ▼
//!           ▲                              ┌─────────┐
//!           └───── delay elapsed, sink ok ─│ Backoff │ ◄─┐ sink reconnect failed
//!                                          └─────────┘ ──┘
//! ```
//!
//! Cancellation is honored at every wait and between sends, never in the
//! middle of a send.

use crate::backoff::BackoffPolicy;
use crate::metrics::{Report, SupervisorMetrics};
use crate::pipeline::{Outcome, Pipeline};
use anyhow::{Context, Result};
use chrono::Utc;
use omnifeed_client::CotSink;
use omnifeed_source::ObservationSource;
use std::fmt;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Running,
    Backoff,
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupervisorState::Running => write!(f, "Running"),
            SupervisorState::Backoff => write!(f, "Backoff"),
        }
    }
}

pub struct Supervisor {
    source: Box<dyn ObservationSource>,
    sink: Box<dyn CotSink>,
    pipeline: Pipeline,
    backoff: BackoffPolicy,
    metrics: SupervisorMetrics,
    state: SupervisorState,
}

impl Supervisor {
    /// Backoff delay and jitter are taken from the source.
    pub fn new(source: Box<dyn ObservationSource>, sink: Box<dyn CotSink>, pipeline: Pipeline) -> Self {
        let backoff = BackoffPolicy::for_source(source.as_ref());
        Self {
            source,
            sink,
            pipeline,
            backoff,
            metrics: SupervisorMetrics::new(),
            state: SupervisorState::Running,
        }
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    /// Supervisor totals plus the sink's delivery counters
    pub fn report(&self) -> Report {
        let sink = self.sink.metrics();
        Report {
            bytes_sent: sink.bytes_sent,
            sink_connects: sink.connects,
            ..self.metrics.report()
        }
    }

    pub fn sink(&self) -> &dyn CotSink {
        self.sink.as_ref()
    }

    /// Runs until `cancel` fires, then releases the sink and returns totals.
    ///
    /// The only error is a failed initial sink connection; everything after
    /// that is retried.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<Report> {
        if !self.sink.is_connected() {
            self.sink
                .connect()
                .await
                .with_context(|| format!("Failed to connect to {}", self.sink.describe()))?;
        }

        info!(
            source = self.source.name(),
            domain = %self.source.domain(),
            sink = %self.sink.describe(),
            filter = %self.pipeline.filter(),
            "Supervisor started"
        );

        self.state = SupervisorState::Running;
        while !cancel.is_cancelled() {
            let next = match self.state {
                SupervisorState::Running => self.run_batch(&cancel).await,
                SupervisorState::Backoff => self.back_off(&cancel).await,
            };
            match next {
                Some(state) => {
                    if state != self.state {
                        debug!(from = %self.state, to = %state, "State transition");
                    }
                    self.state = state;
                }
                None => break,
            }
        }

        self.source.reset().await;
        if let Err(e) = self.sink.disconnect().await {
            debug!(error = format!("{:#}", e), "Sink disconnect failed");
        }

        let sink = self.sink.metrics();
        info!(
            sink = %self.sink.describe(),
            messages_sent = sink.messages_sent,
            bytes_sent = sink.bytes_sent,
            errors = sink.errors,
            connects = sink.connects,
            "Sink totals"
        );

        let report = self.report();
        info!(%report, "Supervisor stopped");
        Ok(report)
    }

    /// One `Running` step. `None` means cancelled.
    async fn run_batch(&mut self, cancel: &CancellationToken) -> Option<SupervisorState> {
        let batch = tokio::select! {
            biased;
            _ = cancel.cancelled() => return None,
            batch = self.source.next_batch() => batch,
        };

        let batch = match batch {
            Ok(batch) => batch,
            Err(e) if e.is_transient() => {
                warn!(source = self.source.name(), error = %e, "Source failed");
                self.metrics.record_source_failure(false);
                return Some(SupervisorState::Backoff);
            }
            Err(e) => {
                error!(
                    source = self.source.name(),
                    error = %e,
                    "Source rejected the request, check credentials and configuration"
                );
                self.metrics.record_source_failure(true);
                return Some(SupervisorState::Backoff);
            }
        };

        self.metrics.record_batch(batch.len());
        trace!(count = batch.len(), "Batch received");

        for observation in &batch {
            if cancel.is_cancelled() {
                return None;
            }

            match self.pipeline.process(observation, Utc::now()) {
                Outcome::Filtered(symbology) => {
                    trace!(id = observation.id_str(), %symbology, "Filtered");
                    self.metrics.record_filtered();
                }
                Outcome::Forward { symbology, frame } => {
                    if let Err(e) = self.sink.send(frame.as_bytes()).await {
                        error!(
                            sink = %self.sink.describe(),
                            error = format!("{:#}", e),
                            "Send failed, dropping connection"
                        );
                        self.metrics.record_send_failure();
                        if let Err(e) = self.sink.disconnect().await {
                            debug!(error = format!("{:#}", e), "Sink disconnect failed");
                        }
                        return Some(SupervisorState::Backoff);
                    }
                    trace!(id = observation.id_str(), %symbology, "Forwarded");
                    self.metrics.record_forwarded();
                }
            }
        }

        if let Some(pace) = self.source.pace() {
            if !sleep_or_cancel(pace, cancel).await {
                return None;
            }
        }
        Some(SupervisorState::Running)
    }

    /// One `Backoff` step. `None` means cancelled.
    async fn back_off(&mut self, cancel: &CancellationToken) -> Option<SupervisorState> {
        self.source.reset().await;

        let delay = self.backoff.next_delay();
        info!(delay_ms = delay.as_millis() as u64, "Backing off");
        if !sleep_or_cancel(delay, cancel).await {
            return None;
        }

        if !self.sink.is_connected() {
            let connected = tokio::select! {
                biased;
                _ = cancel.cancelled() => return None,
                connected = self.sink.connect() => connected,
            };
            if let Err(e) = connected {
                warn!(
                    sink = %self.sink.describe(),
                    error = format!("{:#}", e),
                    "Sink reconnect failed"
                );
                self.metrics.record_send_failure();
                return Some(SupervisorState::Backoff);
            }
            info!(sink = %self.sink.describe(), "Sink reconnected");
        }

        Some(SupervisorState::Running)
    }
}

/// Returns false when cancelled before `duration` elapsed.
async fn sleep_or_cancel(duration: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}
