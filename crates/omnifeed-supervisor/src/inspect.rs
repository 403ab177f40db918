//! Read-only view of an AISstream feed
//!
//! Prints each position report envelope next to the CoT document it would
//! produce, then reads that document back and validates it. Nothing is sent
//! to a sink.

use anyhow::Result;
use chrono::Utc;
use omnifeed_cot::{encode_xml, parse_cot, validate_event};
use omnifeed_filter::Classifier;
use omnifeed_source::{aisstream, AisStreamSource, ObservationSource};
use std::io::Write;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Prints up to `count` position reports to `out`.
///
/// Other message types are skipped. A lost connection is reopened after the
/// source's retry delay. Returns how many reports were printed, which is
/// less than `count` only when cancelled.
pub async fn inspect_position_reports<W: Write>(
    source: &mut AisStreamSource,
    classifier: &Classifier,
    count: usize,
    out: &mut W,
    cancel: &CancellationToken,
) -> Result<usize> {
    let mut seen = 0usize;

    while seen < count {
        let message = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            message = source.next_message() => message,
        };

        let text = match message {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "AISstream connection lost, reconnecting");
                source.reset().await;
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(source.retry_delay()) => continue,
                }
            }
        };

        let envelope: serde_json::Value = match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Skipping malformed AIS message");
                continue;
            }
        };
        if aisstream::message_type(&envelope) != Some(aisstream::POSITION_REPORT) {
            debug!(message_type = ?aisstream::message_type(&envelope), "Skipping");
            continue;
        }
        let observation = match aisstream::normalize_envelope(&envelope) {
            Ok(Some(observation)) => observation,
            Ok(None) => continue,
            Err(e) => {
                warn!(error = %e, "Skipping malformed position report");
                continue;
            }
        };

        seen += 1;
        let symbology = classifier.classify(&observation);
        let xml = encode_xml(&observation, symbology, Utc::now());
        let verdict = match parse_cot(&xml) {
            Ok(event) => match validate_event(&event) {
                Ok(()) => "valid".to_string(),
                Err(e) => format!("invalid: {}", e),
            },
            Err(e) => format!("unreadable: {}", e),
        };

        writeln!(out, "=== Message {} ===", seen)?;
        writeln!(out, "{}", serde_json::to_string_pretty(&envelope)?)?;
        writeln!(out, "--- {} ({}) ---", symbology.description(), symbology)?;
        writeln!(out, "{}", xml)?;
        writeln!(out, "--- CoT {} ---", verdict)?;
        writeln!(out)?;
    }

    source.reset().await;
    Ok(seen)
}
