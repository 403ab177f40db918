//! # omnifeed-supervisor
//!
//! Glues one [`ObservationSource`](omnifeed_source::ObservationSource) to one
//! [`CotSink`](omnifeed_client::CotSink):
//!
//! - [`pipeline`]: classify, filter, encode and serialize each observation
//! - [`supervisor`]: the `Running`/`Backoff` control loop with cancellation
//! - [`backoff`]: fixed retry delay with optional jitter
//! - [`metrics`]: run totals and Prometheus counters
//! - [`inspect`]: prints AIS position reports beside their CoT, without a sink

pub mod backoff;
pub mod inspect;
pub mod metrics;
pub mod pipeline;
pub mod supervisor;

pub use backoff::BackoffPolicy;
pub use inspect::inspect_position_reports;
pub use metrics::{install_prometheus_exporter, Report, SupervisorMetrics};
pub use pipeline::{Outcome, Pipeline};
pub use supervisor::{Supervisor, SupervisorState};
