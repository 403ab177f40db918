//! Provider adapters for OmniFeed
//!
//! Each adapter talks to one provider and normalizes its payloads into
//! [`RawObservation`](omnifeed_core::RawObservation) records:
//!
//! - [`OpenSkySource`]: polls the OpenSky REST API for aircraft state vectors
//! - [`AisStreamSource`]: subscribes to the AISstream WebSocket feed
//!
//! Both implement [`ObservationSource`], the seam the supervisor drives.

pub mod aisstream;
pub mod opensky;
pub mod source;

pub use aisstream::{message_type, normalize_envelope, parse_envelope, AisStreamSource};
pub use opensky::{normalize_state_row, parse_states, OpenSkySource};
pub use source::{ObservationSource, PollState, StreamState};
