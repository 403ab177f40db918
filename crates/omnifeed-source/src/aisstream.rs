//! AISstream WebSocket consumer.
//!
//! The connection is subscribe-then-stream: one JSON subscription frame goes
//! out right after the handshake, then every inbound frame is an envelope
//! `{"MessageType": .., "MetaData": {..}, "Message": {<MessageType>: {..}}}`.

use crate::source::{ObservationSource, StreamState};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use omnifeed_core::config::MaritimeConfig;
use omnifeed_core::error::{ConnectionError, ParseError, TimeoutError};
use omnifeed_core::types::{Domain, Numeric, RawObservation};
use omnifeed_core::Result;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, instrument, trace, warn};

type AisSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub const POSITION_REPORT: &str = "PositionReport";
pub const STATIC_DATA: &str = "StaticData";

/// Streams AIS envelopes from AISstream
pub struct AisStreamSource {
    config: MaritimeConfig,
    api_key: String,
    ws: Option<AisSocket>,
    state: StreamState,
}

impl AisStreamSource {
    /// Fails when no API key is configured.
    pub fn new(config: MaritimeConfig) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();
        Ok(Self {
            config,
            api_key,
            ws: None,
            state: StreamState::Disconnected,
        })
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Subscription frame sent right after the handshake
    pub fn subscription_message(&self) -> String {
        json!({
            "APIKey": self.api_key,
            "BoundingBoxes": self.config.bounding_boxes,
        })
        .to_string()
    }

    /// Open the socket and subscribe
    #[instrument(skip(self), fields(endpoint = %self.config.endpoint))]
    pub async fn connect(&mut self) -> Result<()> {
        self.state = StreamState::Connecting;
        info!("Connecting to AISstream");

        let connected = timeout(
            self.config.connect_timeout(),
            connect_async(self.config.endpoint.as_str()),
        )
        .await;

        let mut ws = match connected {
            Ok(Ok((ws, _response))) => ws,
            Ok(Err(e)) => {
                self.state = StreamState::Disconnected;
                return Err(ConnectionError::failed(&self.config.endpoint, e.to_string()).into());
            }
            Err(_) => {
                self.state = StreamState::Disconnected;
                return Err(TimeoutError::ConnectTimeout {
                    timeout_secs: self.config.connect_timeout_secs,
                }
                .into());
            }
        };

        if let Err(e) = ws.send(Message::Text(self.subscription_message().into())).await {
            self.state = StreamState::Disconnected;
            return Err(ConnectionError::HandshakeFailed {
                reason: e.to_string(),
            }
            .into());
        }

        info!(boxes = self.config.bounding_boxes.len(), "Subscribed to AISstream");
        self.ws = Some(ws);
        self.state = StreamState::Subscribed;
        Ok(())
    }

    /// Wait for the next JSON frame, connecting first if needed.
    ///
    /// Pings are answered in place. A close frame, a socket error or an idle
    /// window without any frame drops the connection and returns an error.
    pub async fn next_message(&mut self) -> Result<String> {
        if self.ws.is_none() {
            self.connect().await?;
        }

        let idle = self.config.idle_timeout();
        loop {
            let Some(ws) = self.ws.as_mut() else {
                return Err(ConnectionError::NotConnected.into());
            };

            let frame = match timeout(idle, ws.next()).await {
                Ok(frame) => frame,
                Err(_) => {
                    self.drop_socket();
                    return Err(TimeoutError::IdleTimeout {
                        timeout_secs: self.config.idle_timeout_secs,
                    }
                    .into());
                }
            };

            match frame {
                Some(Ok(Message::Text(text))) => {
                    self.state = StreamState::Receiving;
                    return Ok(text.as_str().to_owned());
                }
                Some(Ok(Message::Binary(data))) => {
                    self.state = StreamState::Receiving;
                    match String::from_utf8(data.to_vec()) {
                        Ok(text) => return Ok(text),
                        Err(e) => warn!(error = %e, "Skipping non UTF-8 binary frame"),
                    }
                }
                Some(Ok(Message::Ping(payload))) => {
                    trace!("Ping");
                    if let Err(e) = ws.send(Message::Pong(payload)).await {
                        self.drop_socket();
                        return Err(ConnectionError::closed(e.to_string()).into());
                    }
                }
                Some(Ok(Message::Pong(_))) | Some(Ok(Message::Frame(_))) => {}
                Some(Ok(Message::Close(frame))) => {
                    let reason = frame
                        .map(|f| format!("{} {}", f.code, f.reason.as_str()))
                        .unwrap_or_else(|| "close frame".to_string());
                    self.drop_socket();
                    return Err(ConnectionError::closed(reason).into());
                }
                Some(Err(e)) => {
                    self.drop_socket();
                    return Err(ConnectionError::closed(e.to_string()).into());
                }
                None => {
                    self.drop_socket();
                    return Err(ConnectionError::closed("stream ended").into());
                }
            }
        }
    }

    fn drop_socket(&mut self) {
        if self.ws.take().is_some() {
            debug!("AISstream socket dropped");
        }
        self.state = StreamState::Disconnected;
    }
}

#[async_trait]
impl ObservationSource for AisStreamSource {
    fn name(&self) -> &str {
        "aisstream"
    }

    fn domain(&self) -> Domain {
        Domain::Maritime
    }

    async fn next_batch(&mut self) -> Result<Vec<RawObservation>> {
        let text = self.next_message().await?;

        let envelope: Value = match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Skipping malformed AIS message");
                return Ok(Vec::new());
            }
        };

        if let Some(reason) = envelope.get("error").and_then(Value::as_str) {
            self.drop_socket();
            return Err(ConnectionError::AuthenticationFailed {
                reason: reason.to_string(),
            }
            .into());
        }

        match normalize_envelope(&envelope) {
            Ok(Some(obs)) => Ok(vec![obs]),
            Ok(None) => Ok(Vec::new()),
            Err(e) => {
                warn!(error = %e, "Skipping malformed AIS message");
                Ok(Vec::new())
            }
        }
    }

    fn pace(&self) -> Option<Duration> {
        None
    }

    fn retry_delay(&self) -> Duration {
        self.config.reconnect_delay()
    }

    fn jitter(&self) -> Duration {
        self.config.jitter()
    }

    async fn reset(&mut self) {
        if let Some(mut ws) = self.ws.take() {
            if let Err(e) = ws.close(None).await {
                debug!(error = %e, "Close handshake failed");
            }
        }
        self.state = StreamState::Disconnected;
    }
}

/// `MessageType` of an envelope, if present
pub fn message_type(envelope: &Value) -> Option<&str> {
    envelope.get("MessageType").and_then(Value::as_str)
}

/// Parses one envelope. Message types other than position reports and
/// static data yield `None`.
pub fn parse_envelope(text: &str) -> std::result::Result<Option<RawObservation>, ParseError> {
    let envelope: Value = serde_json::from_str(text)?;
    normalize_envelope(&envelope)
}

/// Normalizes a decoded envelope.
///
/// Identity and name come from `MetaData`; position, heading and speed from
/// the `PositionReport` body; ship type from the `StaticData` body.
pub fn normalize_envelope(envelope: &Value) -> std::result::Result<Option<RawObservation>, ParseError> {
    let kind = match message_type(envelope) {
        Some(kind @ (POSITION_REPORT | STATIC_DATA)) => kind,
        Some(other) => {
            trace!(message_type = other, "Ignoring AIS message");
            return Ok(None);
        }
        None => return Err(ParseError::missing_field("MessageType")),
    };

    let metadata = envelope.get("MetaData");
    let body = envelope.get("Message").and_then(|m| m.get(kind));

    let mut obs = RawObservation::new(Domain::Maritime);
    obs.id = match metadata.and_then(|m| m.get("MMSI")) {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => return Err(ParseError::invalid_value("MMSI", "expected a number")),
    };
    obs.name = metadata
        .and_then(|m| m.get("ShipName"))
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string());

    if kind == POSITION_REPORT {
        obs.latitude = numeric_field(body, "Latitude")?;
        obs.longitude = numeric_field(body, "Longitude")?;
        obs.course = numeric_field(body, "TrueHeading")?;
        obs.speed = numeric_field(body, "Sog")?;
    } else {
        obs.type_code = numeric_field(body, "Type")?.and_then(|n| n.as_i64());
    }

    Ok(Some(obs))
}

fn numeric_field(body: Option<&Value>, field: &str) -> std::result::Result<Option<Numeric>, ParseError> {
    match body.and_then(|b| b.get(field)) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => Numeric::from_json(value)
            .map(Some)
            .ok_or_else(|| ParseError::invalid_value(field, "expected a number")),
    }
}
