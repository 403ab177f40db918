//! Validation for CoT events

use crate::event::{Event, Point, COT_VERSION, HOW_MACHINE};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid latitude: {0} (must be between -90 and 90)")]
    InvalidLatitude(f64),

    #[error("Invalid longitude: {0} (must be between -180 and 180)")]
    InvalidLongitude(f64),

    #[error("Invalid circular error: {0} (must be positive)")]
    InvalidCircularError(f64),

    #[error("Invalid linear error: {0} (must be positive)")]
    InvalidLinearError(f64),

    #[error("Invalid timestamp order: stale ({0}) must be after start ({1})")]
    InvalidTimestampOrder(String, String),

    #[error("Start ({0}) differs from time ({1})")]
    StartMismatch(String, String),

    #[error("Invalid CoT type: {0}")]
    InvalidCotType(String),

    #[error("Unexpected version: {0}")]
    InvalidVersion(String),

    #[error("Unexpected how: {0}")]
    InvalidHow(String),

    #[error("Empty UID")]
    EmptyUid,
}

/// Validates the structure every generated event must have.
pub fn validate_event(event: &Event) -> Result<(), ValidationError> {
    if event.version != COT_VERSION {
        return Err(ValidationError::InvalidVersion(event.version.clone()));
    }

    if event.uid.is_empty() {
        return Err(ValidationError::EmptyUid);
    }

    if event.symbology().is_none() {
        return Err(ValidationError::InvalidCotType(event.event_type.clone()));
    }

    if event.how != HOW_MACHINE {
        return Err(ValidationError::InvalidHow(event.how.clone()));
    }

    if event.start != event.time {
        return Err(ValidationError::StartMismatch(
            event.start.to_rfc3339(),
            event.time.to_rfc3339(),
        ));
    }

    if event.stale <= event.start {
        return Err(ValidationError::InvalidTimestampOrder(
            event.stale.to_rfc3339(),
            event.start.to_rfc3339(),
        ));
    }

    validate_point(&event.point)
}

/// Validates a Point
pub fn validate_point(point: &Point) -> Result<(), ValidationError> {
    let lat = point.lat.as_f64();
    if !(-90.0..=90.0).contains(&lat) {
        return Err(ValidationError::InvalidLatitude(lat));
    }

    let lon = point.lon.as_f64();
    if !(-180.0..=180.0).contains(&lon) {
        return Err(ValidationError::InvalidLongitude(lon));
    }

    if point.ce.as_f64() < 0.0 {
        return Err(ValidationError::InvalidCircularError(point.ce.as_f64()));
    }

    if point.le.as_f64() < 0.0 {
        return Err(ValidationError::InvalidLinearError(point.le.as_f64()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::encode;
    use chrono::{TimeZone, Utc};
    use omnifeed_core::types::{Numeric, RawObservation, SymbologyType};

    fn create_valid_event() -> Event {
        let obs = RawObservation::aerial("AE1234")
            .with_name("MIL45")
            .with_position(37.7749, -122.4194);
        encode(
            &obs,
            SymbologyType::MilitaryAircraft,
            Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap(),
        )
    }

    #[test]
    fn test_valid_event() {
        assert!(validate_event(&create_valid_event()).is_ok());
    }

    #[test]
    fn test_invalid_latitude() {
        let mut event = create_valid_event();
        event.point.lat = Numeric::Real(91.0);
        assert!(matches!(
            validate_event(&event),
            Err(ValidationError::InvalidLatitude(_))
        ));
    }

    #[test]
    fn test_invalid_longitude() {
        let mut event = create_valid_event();
        event.point.lon = Numeric::Integer(-181);
        assert!(matches!(
            validate_event(&event),
            Err(ValidationError::InvalidLongitude(_))
        ));
    }

    #[test]
    fn test_invalid_timestamp_order() {
        let mut event = create_valid_event();
        event.stale = event.start;
        assert!(matches!(
            validate_event(&event),
            Err(ValidationError::InvalidTimestampOrder(_, _))
        ));
    }

    #[test]
    fn test_unknown_cot_type() {
        let mut event = create_valid_event();
        event.event_type = "a-h-G".to_string();
        assert!(matches!(
            validate_event(&event),
            Err(ValidationError::InvalidCotType(_))
        ));
    }

    #[test]
    fn test_negative_circular_error() {
        let mut event = create_valid_event();
        event.point.ce = Numeric::Real(-10.0);
        assert!(matches!(
            validate_event(&event),
            Err(ValidationError::InvalidCircularError(_))
        ));
    }
}
