//! XML serialization for CoT messages

use crate::event::{Detail, Event, Point};
use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::escape::escape;
use std::fmt::{self, Write};

/// Serialize an Event to an XML string.
///
/// No XML declaration is written; each document is one self-contained
/// `<event>` element, ready to be framed by the transport.
pub fn serialize_event(event: &Event) -> String {
    event.to_string()
}

/// Formats a timestamp as ISO-8601 UTC with millisecond precision and a `Z` suffix.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_event(f, self)
    }
}

fn write_event<W: Write>(xml: &mut W, event: &Event) -> fmt::Result {
    write!(
        xml,
        r#"<event version="{}" uid="{}" type="{}" time="{}" start="{}" stale="{}" how="{}">"#,
        escape(&event.version),
        escape(&event.uid),
        escape(&event.event_type),
        format_timestamp(&event.time),
        format_timestamp(&event.start),
        format_timestamp(&event.stale),
        escape(&event.how)
    )?;
    write_point(xml, &event.point)?;
    write_detail(xml, &event.detail)?;
    xml.write_str("</event>")
}

fn write_point<W: Write>(xml: &mut W, point: &Point) -> fmt::Result {
    write!(
        xml,
        r#"<point lat="{}" lon="{}" hae="{}" ce="{}" le="{}"/>"#,
        point.lat, point.lon, point.hae, point.ce, point.le
    )
}

fn write_detail<W: Write>(xml: &mut W, detail: &Detail) -> fmt::Result {
    xml.write_str("<detail>")?;
    write!(
        xml,
        r#"<track course="{}" speed="{}"/>"#,
        detail.track.course, detail.track.speed
    )?;
    write!(
        xml,
        r#"<contact callsign="{}"/>"#,
        escape(&detail.contact.callsign)
    )?;
    write!(xml, "<remarks>{}</remarks>", escape(&detail.remarks))?;
    xml.write_str("</detail>")
}
