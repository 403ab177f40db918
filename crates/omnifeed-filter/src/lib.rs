//! Classification and filtering of tracks for OmniFeed
//!
//! - [`classify`] assigns each observation one symbology type
//! - [`rules`] decides whether a classified track is forwarded
//!
//! # Example
//!
//! ```rust
//! use omnifeed_core::types::{FilterSpec, RawObservation, SymbologyType};
//! use omnifeed_filter::{Classifier, TypeFilter};
//!
//! let classifier = Classifier::new();
//! let filter = TypeFilter::new(FilterSpec::include_only([SymbologyType::UsMilitaryVessel]));
//!
//! let symbology = classifier.classify(&RawObservation::maritime("338123456"));
//! assert_eq!(symbology, SymbologyType::UsMilitaryVessel);
//! assert!(filter.evaluate(symbology).is_pass());
//! ```

pub mod classify;
pub mod rules;

pub use classify::{Classifier, ShipTypeRule};
pub use rules::{passes, FilterResult, TypeFilter};
