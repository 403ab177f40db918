use async_trait::async_trait;
use omnifeed_core::types::{Domain, RawObservation};
use omnifeed_core::Result;
use std::fmt;
use std::time::Duration;

/// A provider of normalized observations
///
/// `next_batch` is the only suspension point the supervisor waits on. An
/// error means the source is unusable until `reset` has been called and the
/// backoff delay has passed.
#[async_trait]
pub trait ObservationSource: Send {
    /// Provider name for logs, e.g. `opensky`
    fn name(&self) -> &str;

    /// Domain of every observation this source yields
    fn domain(&self) -> Domain;

    /// Fetch or wait for the next batch of observations
    ///
    /// An empty batch is not an error: it covers non-200 poll responses,
    /// ignored message types and malformed messages.
    async fn next_batch(&mut self) -> Result<Vec<RawObservation>>;

    /// Pause after a successful batch; `None` to ask again immediately
    fn pace(&self) -> Option<Duration>;

    /// Fixed delay before retrying after a failure
    fn retry_delay(&self) -> Duration;

    /// Upper bound of random extra delay added to `retry_delay`
    fn jitter(&self) -> Duration {
        Duration::ZERO
    }

    /// Drop any held connection so the next batch starts clean
    async fn reset(&mut self);
}

/// Polled source lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Fetching,
}

/// Streamed source lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Disconnected,
    Connecting,
    Subscribed,
    Receiving,
}

impl fmt::Display for StreamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamState::Disconnected => write!(f, "Disconnected"),
            StreamState::Connecting => write!(f, "Connecting"),
            StreamState::Subscribed => write!(f, "Subscribed"),
            StreamState::Receiving => write!(f, "Receiving"),
        }
    }
}
