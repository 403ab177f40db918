//! Parser for the CoT documents this crate emits.
//!
//! Used by the inspection tooling and by tests that read back what a sink
//! received. Only the elements the encoder writes are understood; anything
//! else inside `<detail>` is skipped.

use crate::event::{Contact, Detail, Event, Point, Track};
use chrono::{DateTime, Utc};
use omnifeed_core::types::Numeric;
use quick_xml::events::{BytesStart, Event as XmlEvent};
use quick_xml::Reader;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("XML parsing error: {0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid datetime format: {0}")]
    InvalidDateTime(String),

    #[error("Invalid number format: {0}")]
    InvalidNumber(String),

    #[error("Invalid event structure: {0}")]
    InvalidStructure(String),
}

/// Parse a CoT message from an XML string
pub fn parse_cot(xml: &str) -> Result<Event, ParseError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut event = None;
    let mut point = None;
    let mut track = None;
    let mut callsign = None;
    let mut remarks = None;
    let mut in_remarks = false;

    loop {
        match reader.read_event()? {
            XmlEvent::Start(e) | XmlEvent::Empty(e) => match e.name().as_ref() {
                b"event" => event = Some(attributes(&e)?),
                b"point" => {
                    let mut attrs = attributes(&e)?;
                    point = Some(Point {
                        lat: take_numeric(&mut attrs, "lat")?,
                        lon: take_numeric(&mut attrs, "lon")?,
                        hae: take_numeric(&mut attrs, "hae")?,
                        ce: take_numeric(&mut attrs, "ce")?,
                        le: take_numeric(&mut attrs, "le")?,
                    });
                }
                b"track" => {
                    let mut attrs = attributes(&e)?;
                    track = Some(Track {
                        course: take_numeric(&mut attrs, "course")?,
                        speed: take_numeric(&mut attrs, "speed")?,
                    });
                }
                b"contact" => {
                    let mut attrs = attributes(&e)?;
                    callsign = Some(take(&mut attrs, "callsign")?);
                }
                b"remarks" => {
                    in_remarks = true;
                    remarks.get_or_insert_with(String::new);
                }
                _ => {}
            },
            XmlEvent::Text(t) if in_remarks => {
                remarks.get_or_insert_with(String::new).push_str(&t.unescape()?);
            }
            XmlEvent::End(e) if e.name().as_ref() == b"remarks" => in_remarks = false,
            XmlEvent::Eof => break,
            _ => {}
        }
    }

    let mut attrs = event.ok_or_else(|| ParseError::InvalidStructure("no <event> element".into()))?;
    Ok(Event {
        version: take(&mut attrs, "version")?,
        uid: take(&mut attrs, "uid")?,
        event_type: take(&mut attrs, "type")?,
        time: parse_datetime(&take(&mut attrs, "time")?)?,
        start: parse_datetime(&take(&mut attrs, "start")?)?,
        stale: parse_datetime(&take(&mut attrs, "stale")?)?,
        how: take(&mut attrs, "how")?,
        point: point.ok_or_else(|| ParseError::MissingField("point".into()))?,
        detail: Detail {
            track: track.ok_or_else(|| ParseError::MissingField("track".into()))?,
            contact: Contact {
                callsign: callsign.ok_or_else(|| ParseError::MissingField("contact".into()))?,
            },
            remarks: remarks.unwrap_or_default(),
        },
    })
}

/// Parse a CoT message from raw bytes, e.g. one frame read off a socket.
pub fn parse_cot_bytes(xml: &[u8]) -> Result<Event, ParseError> {
    let text = std::str::from_utf8(xml)
        .map_err(|e| ParseError::InvalidStructure(format!("not UTF-8: {}", e)))?;
    parse_cot(text.trim_end_matches(['\n', '\r']))
}

fn attributes(element: &BytesStart) -> Result<Vec<(String, String)>, ParseError> {
    element
        .attributes()
        .map(|attr| {
            let attr = attr.map_err(|e| ParseError::XmlError(quick_xml::Error::InvalidAttr(e)))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            Ok((key, value))
        })
        .collect()
}

fn take(attrs: &mut Vec<(String, String)>, name: &str) -> Result<String, ParseError> {
    let pos = attrs
        .iter()
        .position(|(key, _)| key == name)
        .ok_or_else(|| ParseError::MissingField(name.to_string()))?;
    Ok(attrs.swap_remove(pos).1)
}

fn take_numeric(attrs: &mut Vec<(String, String)>, name: &str) -> Result<Numeric, ParseError> {
    parse_numeric(&take(attrs, name)?)
}

/// Reads a number the way it was written: integers stay integers.
pub fn parse_numeric(s: &str) -> Result<Numeric, ParseError> {
    if let Ok(v) = s.parse::<i64>() {
        return Ok(Numeric::Integer(v));
    }
    s.parse::<f64>()
        .map(Numeric::Real)
        .map_err(|_| ParseError::InvalidNumber(s.to_string()))
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, ParseError> {
    s.parse::<DateTime<Utc>>()
        .map_err(|_| ParseError::InvalidDateTime(s.to_string()))
}
