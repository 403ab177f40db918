//! Cursor on Target (CoT) event model and encoder for OmniFeed
//!
//! Turns normalized provider observations into CoT XML documents:
//!
//! - [`encoder`] applies the per-domain defaulting policy (units, sentinels,
//!   accuracy, validity windows)
//! - [`serializer`] writes escaped XML without a declaration
//! - [`parser`] and [`validate`] read generated documents back, for tooling
//!   and tests
//!
//! # Example
//!
//! ```rust
//! use chrono::Utc;
//! use omnifeed_core::types::{RawObservation, SymbologyType};
//! use omnifeed_cot::encoder::encode_xml;
//!
//! let obs = RawObservation::aerial("AE1234").with_position(10.0, 20.0);
//! let xml = encode_xml(&obs, SymbologyType::CivilianAircraft, Utc::now());
//! assert!(xml.contains(r#"uid="ADSB.AE1234""#));
//! ```

pub mod encoder;
pub mod event;
pub mod parser;
pub mod serializer;
pub mod validate;

pub use encoder::{encode, encode_xml};
pub use event::{Contact, Detail, Event, Point, Track};
pub use parser::{parse_cot, parse_cot_bytes, ParseError};
pub use serializer::serialize_event;
pub use validate::{validate_event, validate_point, ValidationError};
