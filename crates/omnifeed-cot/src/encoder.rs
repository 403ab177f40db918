//! Builds CoT events from normalized observations.
//!
//! All missing-field policy lives here: sources hand over whatever the
//! provider sent, and this module decides what goes on the wire when a
//! value is absent.

use crate::event::{Contact, Detail, Event, Point, Track, COT_VERSION, HOW_MACHINE};
use crate::serializer::serialize_event;
use chrono::{DateTime, Duration, Utc};
use omnifeed_core::types::{Domain, Numeric, RawObservation, SymbologyType};

/// Placeholder for an absent id or callsign.
pub const UNKNOWN: &str = "UNKNOWN";

/// Knots to meters per second.
pub const KNOTS_TO_MPS: f64 = 0.514444;

/// AIS "heading not available" sentinel.
pub const HEADING_NOT_AVAILABLE: i64 = 511;

const AERIAL_ACCURACY: Numeric = Numeric::Integer(100);
const MARITIME_ACCURACY: Numeric = Numeric::Integer(10);

/// Builds the CoT event for one observation.
///
/// `generated_at` becomes `time` and `start`; `stale` adds the domain's
/// validity window.
pub fn encode(
    observation: &RawObservation,
    symbology: SymbologyType,
    generated_at: DateTime<Utc>,
) -> Event {
    let domain = observation.domain;
    let id = observation.id.as_deref().map(xml_safe);
    let id = id.as_deref().map(str::trim).filter(|id| !id.is_empty());
    let callsign = match xml_safe(observation.trimmed_name()).trim() {
        "" => UNKNOWN.to_string(),
        name => name.to_string(),
    };

    let window = Duration::from_std(domain.validity_window()).unwrap_or_else(|_| Duration::minutes(5));
    let lat = observation.latitude.unwrap_or(Numeric::ZERO);
    let lon = observation.longitude.unwrap_or(Numeric::ZERO);

    let (point, track, remarks) = match domain {
        Domain::Aerial => (
            Point::with_accuracy(lat, lon, observation.altitude.unwrap_or(Numeric::ZERO), AERIAL_ACCURACY),
            Track {
                course: observation.course.unwrap_or(Numeric::ZERO),
                speed: observation.speed.unwrap_or(Numeric::ZERO),
            },
            format!("ICAO24: {}, Callsign: {}", id.unwrap_or(UNKNOWN), callsign),
        ),
        Domain::Maritime => {
            let mut remarks = format!("MMSI: {}, Vessel: {}", id.unwrap_or(UNKNOWN), callsign);
            if let Some(code) = observation.type_code.filter(|code| *code != 0) {
                remarks.push_str(&format!(", Type: {}", code));
            }
            (
                Point::with_accuracy(lat, lon, Numeric::ZERO, MARITIME_ACCURACY),
                Track {
                    course: vessel_course(observation.course),
                    speed: knots_to_mps(observation.speed),
                },
                remarks,
            )
        }
    };

    Event {
        version: COT_VERSION.to_string(),
        uid: format!("{}.{}", domain.uid_prefix(), id.unwrap_or(UNKNOWN)),
        event_type: symbology.cot_type().to_string(),
        time: generated_at,
        start: generated_at,
        stale: generated_at + window,
        how: HOW_MACHINE.to_string(),
        point,
        detail: Detail {
            track,
            contact: Contact { callsign },
            remarks,
        },
    }
}

/// Drops control characters XML 1.0 cannot carry; tab, LF and CR stay.
fn xml_safe(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .collect()
}

/// Encodes and serializes in one step.
pub fn encode_xml(
    observation: &RawObservation,
    symbology: SymbologyType,
    generated_at: DateTime<Utc>,
) -> String {
    serialize_event(&encode(observation, symbology, generated_at))
}

fn knots_to_mps(speed: Option<Numeric>) -> Numeric {
    match speed {
        Some(knots) => Numeric::Real(knots.as_f64() * KNOTS_TO_MPS),
        None => Numeric::ZERO,
    }
}

fn vessel_course(course: Option<Numeric>) -> Numeric {
    match course {
        Some(c) if c.as_i64() == Some(HEADING_NOT_AVAILABLE) => Numeric::ZERO,
        Some(c) => c,
        None => Numeric::ZERO,
    }
}
