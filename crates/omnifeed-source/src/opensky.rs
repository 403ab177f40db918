//! OpenSky Network REST poller.
//!
//! One GET per batch against `/api/states/all`. The response carries a
//! `states` array of fixed-position rows; only the columns below are used.

use crate::source::{ObservationSource, PollState};
use async_trait::async_trait;
use omnifeed_core::config::AerialConfig;
use omnifeed_core::error::{ConnectionError, ParseError, TimeoutError};
use omnifeed_core::types::{Domain, Numeric, RawObservation};
use omnifeed_core::Result;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

const COL_ICAO24: usize = 0;
const COL_CALLSIGN: usize = 1;
const COL_LONGITUDE: usize = 5;
const COL_LATITUDE: usize = 6;
const COL_GEO_ALTITUDE: usize = 7;
const COL_VELOCITY: usize = 9;
const COL_TRUE_TRACK: usize = 10;

/// Polls OpenSky for aircraft state vectors
pub struct OpenSkySource {
    client: reqwest::Client,
    config: AerialConfig,
    state: PollState,
}

impl OpenSkySource {
    pub fn new(config: AerialConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("omnifeed/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConnectionError::failed(&config.endpoint, e.to_string()))?;

        Ok(Self {
            client,
            config,
            state: PollState::Idle,
        })
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    /// One GET round trip. Non-200 answers yield an empty batch.
    #[instrument(skip(self), fields(endpoint = %self.config.endpoint))]
    pub async fn fetch(&mut self) -> Result<Vec<RawObservation>> {
        self.state = PollState::Fetching;
        let result = self.fetch_inner().await;
        self.state = PollState::Idle;
        result
    }

    async fn fetch_inner(&self) -> Result<Vec<RawObservation>> {
        let endpoint = &self.config.endpoint;
        let response = self
            .client
            .get(endpoint)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            warn!(status = %status, "Failed to fetch ADS-B data");
            return Ok(Vec::new());
        }

        let body = response.text().await.map_err(|e| self.request_error(e))?;
        let observations = parse_states(&body)?;
        debug!(count = observations.len(), "Fetched aircraft states");
        Ok(observations)
    }

    fn request_error(&self, err: reqwest::Error) -> omnifeed_core::OmniFeedError {
        if err.is_timeout() {
            TimeoutError::operation("opensky fetch", self.config.request_timeout_secs).into()
        } else {
            ConnectionError::request_failed(&self.config.endpoint, err.to_string()).into()
        }
    }
}

#[async_trait]
impl ObservationSource for OpenSkySource {
    fn name(&self) -> &str {
        "opensky"
    }

    fn domain(&self) -> Domain {
        Domain::Aerial
    }

    async fn next_batch(&mut self) -> Result<Vec<RawObservation>> {
        self.fetch().await
    }

    fn pace(&self) -> Option<Duration> {
        Some(self.config.poll_interval())
    }

    fn retry_delay(&self) -> Duration {
        self.config.retry_delay()
    }

    fn jitter(&self) -> Duration {
        self.config.jitter()
    }

    async fn reset(&mut self) {
        // stateless between polls; connection pooling is reqwest's concern
        if self.state != PollState::Idle {
            info!("Resetting poller state");
        }
        self.state = PollState::Idle;
    }
}

/// Parses an OpenSky `/states/all` body into observations.
///
/// A `null` or missing `states` is an empty batch. Rows that are not arrays
/// or carry wrong types are skipped.
pub fn parse_states(body: &str) -> std::result::Result<Vec<RawObservation>, ParseError> {
    let root: Value = serde_json::from_str(body)?;
    let object = root
        .as_object()
        .ok_or_else(|| ParseError::invalid_format("JSON object", json_kind(&root)))?;

    let rows = match object.get("states") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(rows)) => rows,
        Some(other) => return Err(ParseError::invalid_format("states array", json_kind(other))),
    };

    let mut observations = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        match normalize_state_row(row) {
            Ok(obs) => observations.push(obs),
            Err(e) => debug!(row = index, error = %e, "Skipping malformed state vector"),
        }
    }
    Ok(observations)
}

/// Normalizes one state-vector row.
pub fn normalize_state_row(row: &Value) -> std::result::Result<RawObservation, ParseError> {
    let row = row
        .as_array()
        .ok_or_else(|| ParseError::invalid_format("array", json_kind(row)))?;
    if row.len() <= COL_TRUE_TRACK {
        return Err(ParseError::invalid_format(
            format!("at least {} columns", COL_TRUE_TRACK + 1),
            format!("{} columns", row.len()),
        ));
    }

    let icao24 = row[COL_ICAO24]
        .as_str()
        .ok_or_else(|| ParseError::invalid_value("icao24", "expected a string"))?;

    let mut obs = RawObservation::aerial(icao24);
    obs.name = match &row[COL_CALLSIGN] {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        _ => return Err(ParseError::invalid_value("callsign", "expected a string")),
    };
    obs.longitude = numeric_at(row, COL_LONGITUDE, "longitude")?;
    obs.latitude = numeric_at(row, COL_LATITUDE, "latitude")?;
    obs.altitude = numeric_at(row, COL_GEO_ALTITUDE, "geo_altitude")?;
    obs.speed = numeric_at(row, COL_VELOCITY, "velocity")?;
    obs.course = numeric_at(row, COL_TRUE_TRACK, "true_track")?;
    Ok(obs)
}

fn numeric_at(row: &[Value], index: usize, field: &str) -> std::result::Result<Option<Numeric>, ParseError> {
    match &row[index] {
        Value::Null => Ok(None),
        value => Numeric::from_json(value)
            .map(Some)
            .ok_or_else(|| ParseError::invalid_value(field, "expected a number")),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
