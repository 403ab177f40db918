//! # OmniFeed Core
//!
//! Core types, error handling, and configuration for the OmniFeed telemetry bridge.
//!
//! - **Types**: `RawObservation` (the normalized provider record), `Numeric`,
//!   `Domain`, the closed `SymbologyType` vocabulary, `FilterSpec` and `Protocol`.
//! - **Errors**: `thiserror` taxonomy shared by the sources and the supervisor.
//! - **Configuration**: YAML files with `OMNIFEED__*` environment overrides.
//!
//! ## Example
//!
//! ```
//! use omnifeed_core::types::{Numeric, RawObservation, SymbologyType};
//!
//! let obs = RawObservation::aerial("AE1234")
//!     .with_name("MIL45")
//!     .with_position(10.0, 20.0)
//!     .with_altitude(500);
//!
//! assert_eq!(obs.altitude, Some(Numeric::Integer(500)));
//! assert_eq!("cargo".parse::<SymbologyType>().unwrap().cot_type(), "a-f-G-E-V-C");
//! ```

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{OmniFeedError, Result};
pub use types::{Domain, FilterSpec, Numeric, Protocol, RawObservation, SymbologyType};
