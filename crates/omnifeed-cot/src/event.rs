//! CoT event structures

use chrono::{DateTime, Utc};
use omnifeed_core::types::{Numeric, SymbologyType};
use serde::{Deserialize, Serialize};

/// CoT protocol version written on every event.
pub const COT_VERSION: &str = "2.0";

/// `how` value for machine-generated tracks.
pub const HOW_MACHINE: &str = "h-e";

/// CoT Event represents a Cursor on Target message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// CoT version (always "2.0" for generated events)
    pub version: String,
    /// Unique identifier for this event
    pub uid: String,
    /// CoT type (e.g., "a-f-G-E-V-C" for a cargo vessel)
    #[serde(rename = "type")]
    pub event_type: String,
    /// Event timestamp
    pub time: DateTime<Utc>,
    /// Event start time
    pub start: DateTime<Utc>,
    /// Event stale time (when the event becomes invalid)
    pub stale: DateTime<Utc>,
    /// How the event was generated
    pub how: String,
    /// Geographic location and accuracy
    pub point: Point,
    /// Track, contact and remarks
    pub detail: Detail,
}

/// Geographic point with accuracy metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Latitude in decimal degrees (-90 to 90)
    pub lat: Numeric,
    /// Longitude in decimal degrees (-180 to 180)
    pub lon: Numeric,
    /// Height above ellipsoid in meters
    pub hae: Numeric,
    /// Circular error in meters
    pub ce: Numeric,
    /// Linear error in meters
    pub le: Numeric,
}

/// Detail section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detail {
    pub track: Track,
    pub contact: Contact,
    /// Free-text summary shown by consumers
    pub remarks: String,
}

/// Track information for moving entities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Course/heading in degrees (0-360)
    pub course: Numeric,
    /// Speed in meters per second
    pub speed: Numeric,
}

/// Contact information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Callsign for display
    pub callsign: String,
}

impl Event {
    /// Symbology the event type maps to, if it is one this crate emits.
    pub fn symbology(&self) -> Option<SymbologyType> {
        SymbologyType::ALL
            .into_iter()
            .find(|t| t.cot_type() == self.event_type)
    }

    pub fn callsign(&self) -> &str {
        &self.detail.contact.callsign
    }

    pub fn speed(&self) -> Numeric {
        self.detail.track.speed
    }

    pub fn course(&self) -> Numeric {
        self.detail.track.course
    }

    pub fn remarks(&self) -> &str {
        &self.detail.remarks
    }

    /// Whether the event is stale at the given instant.
    pub fn is_stale_at(&self, at: DateTime<Utc>) -> bool {
        at >= self.stale
    }
}

impl Point {
    /// Create a new Point with the given accuracy on both axes
    pub fn with_accuracy(
        lat: impl Into<Numeric>,
        lon: impl Into<Numeric>,
        hae: impl Into<Numeric>,
        accuracy: impl Into<Numeric>,
    ) -> Self {
        let accuracy = accuracy.into();
        Self {
            lat: lat.into(),
            lon: lon.into(),
            hae: hae.into(),
            ce: accuracy,
            le: accuracy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn sample() -> Event {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        Event {
            version: COT_VERSION.to_string(),
            uid: "AIS.366999001".to_string(),
            event_type: "a-f-G-E-V-C".to_string(),
            time: now,
            start: now,
            stale: now + Duration::hours(1),
            how: HOW_MACHINE.to_string(),
            point: Point::with_accuracy(37.8, -122.4, 0, 10),
            detail: Detail {
                track: Track {
                    course: Numeric::Integer(270),
                    speed: Numeric::Real(5.14444),
                },
                contact: Contact {
                    callsign: "EVER GIVEN".to_string(),
                },
                remarks: "MMSI: 366999001, Vessel: EVER GIVEN, Type: 70".to_string(),
            },
        }
    }

    #[test]
    fn test_symbology_lookup() {
        let mut event = sample();
        assert_eq!(event.symbology(), Some(SymbologyType::CargoVessel));
        event.event_type = "a-h-G".to_string();
        assert_eq!(event.symbology(), None);
    }

    #[test]
    fn test_point_creation() {
        let point = Point::with_accuracy(37.7749, -122.4194, 100, 10);
        assert_eq!(point.lat, Numeric::Real(37.7749));
        assert_eq!(point.hae, Numeric::Integer(100));
        assert_eq!(point.ce, point.le);
    }

    #[test]
    fn test_staleness() {
        let event = sample();
        assert!(!event.is_stale_at(event.start));
        assert!(event.is_stale_at(event.stale));
    }
}
