//! Configuration for the OmniFeed telemetry bridge.
//!
//! Configuration can be loaded from a YAML file directly, or through the
//! `config` crate so that `OMNIFEED__SECTION__KEY` environment variables
//! override file values. Every section has defaults, so an empty file is a
//! valid (if not very useful) configuration.
//!
//! # Examples
//!
//! ```no_run
//! use omnifeed_core::config::AppConfig;
//!
//! let config = AppConfig::from_config_builder("omnifeed.yaml").unwrap();
//! config.validate().unwrap();
//! ```

use crate::error::{ConfigError, Result};
use crate::types::{Domain, FilterSpec, Protocol, SymbologyType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;
use tracing::Level;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where CoT events are delivered
    #[serde(default)]
    pub destination: DestinationConfig,

    /// Which symbology types are forwarded
    #[serde(default)]
    pub filter: FilterConfig,

    /// Additional classifier prefix tables
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// OpenSky poller settings
    #[serde(default)]
    pub aerial: AerialConfig,

    /// AISstream consumer settings
    #[serde(default)]
    pub maritime: MaritimeConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl AppConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::file_not_found(path.display().to_string()).into());
        }
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Self::from_yaml(&contents)
    }

    /// Loads configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| {
            ConfigError::InvalidFormat {
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Loads configuration through the `config` crate.
    ///
    /// The file is optional here; environment variables prefixed with
    /// `OMNIFEED` and separated by `__` override anything it sets, e.g.
    /// `OMNIFEED__DESTINATION__PORT=8087`.
    pub fn from_config_builder<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let config = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix("OMNIFEED")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| ConfigError::LoadFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        config.try_deserialize().map_err(|e| {
            ConfigError::InvalidFormat {
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Validates the configuration.
    ///
    /// Checks the destination, the filter tokens, the classifier extensions,
    /// and that no interval is zero. The AIS API key is checked separately by
    /// [`MaritimeConfig::require_api_key`] since only the maritime feed needs it.
    pub fn validate(&self) -> Result<()> {
        self.destination.validate()?;
        self.filter.to_spec()?;
        self.classifier.validate()?;
        self.aerial.validate()?;
        self.maritime.validate()?;
        self.logging.parse_level()?;
        Ok(())
    }
}

/// Consumer endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub protocol: Protocol,

    /// Connect timeout in seconds (TCP only)
    #[serde(default = "default_socket_timeout")]
    pub connect_timeout_secs: u64,

    /// Write timeout in seconds
    #[serde(default = "default_socket_timeout")]
    pub write_timeout_secs: u64,

    /// TCP keepalive interval in seconds, 0 disables it
    #[serde(default = "default_keepalive")]
    pub keepalive_secs: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8087
}

fn default_socket_timeout() -> u64 {
    10
}

fn default_keepalive() -> u64 {
    60
}

impl Default for DestinationConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            protocol: Protocol::default(),
            connect_timeout_secs: default_socket_timeout(),
            write_timeout_secs: default_socket_timeout(),
            keepalive_secs: default_keepalive(),
        }
    }
}

impl DestinationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::invalid_value("destination.host", "host cannot be empty").into());
        }
        if self.port == 0 {
            return Err(ConfigError::invalid_value("destination.port", "port must be between 1 and 65535").into());
        }
        if self.connect_timeout_secs == 0 || self.write_timeout_secs == 0 {
            return Err(ConfigError::invalid_value("destination", "timeouts must be greater than zero").into());
        }
        Ok(())
    }

    /// Returns `host:port`, bracketing IPv6 literals.
    pub fn address(&self) -> String {
        match self.host.parse::<IpAddr>() {
            Ok(IpAddr::V6(_)) => format!("[{}]:{}", self.host, self.port),
            _ => format!("{}:{}", self.host, self.port),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout_secs)
    }

    pub fn keepalive(&self) -> Option<Duration> {
        (self.keepalive_secs > 0).then(|| Duration::from_secs(self.keepalive_secs))
    }
}

/// Filter lists as written in configuration: aliases or CoT type strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub include: Vec<String>,

    #[serde(default)]
    pub exclude: Vec<String>,
}

impl FilterConfig {
    /// Resolves the token lists into a [`FilterSpec`].
    pub fn to_spec(&self) -> Result<FilterSpec> {
        let resolve = |tokens: &[String]| {
            FilterSpec::parse_tokens(&tokens.join(",")).map_err(|e| ConfigError::InvalidFilterRule {
                reason: e.to_string(),
            })
        };
        Ok(FilterSpec {
            include: resolve(&self.include)?,
            exclude: resolve(&self.exclude)?,
        })
    }
}

/// Extra prefix entries appended after the built-in classifier tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// ICAO24 two-character prefix to aerial symbology
    #[serde(default)]
    pub icao_prefixes: BTreeMap<String, SymbologyType>,

    /// MMSI three-digit prefix to maritime symbology
    #[serde(default)]
    pub mmsi_prefixes: BTreeMap<String, SymbologyType>,
}

impl ClassifierConfig {
    pub fn validate(&self) -> Result<()> {
        check_prefixes("classifier.icao_prefixes", &self.icao_prefixes, 2, Domain::Aerial)?;
        check_prefixes("classifier.mmsi_prefixes", &self.mmsi_prefixes, 3, Domain::Maritime)?;
        Ok(())
    }
}

fn check_prefixes(
    field: &str,
    table: &BTreeMap<String, SymbologyType>,
    len: usize,
    domain: Domain,
) -> Result<()> {
    for (prefix, symbology) in table {
        if prefix.chars().count() != len {
            return Err(ConfigError::invalid_value(
                field,
                format!("prefix '{}' must be {} characters", prefix, len),
            )
            .into());
        }
        if symbology.domain() != domain {
            return Err(ConfigError::invalid_value(
                field,
                format!("'{}' is not a {} type", symbology.alias(), domain),
            )
            .into());
        }
    }
    Ok(())
}

/// OpenSky poller settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AerialConfig {
    #[serde(default = "default_opensky_endpoint")]
    pub endpoint: String,

    /// Pause after a successful fetch
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Pause after a failed fetch
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,

    /// Upper bound of random extra delay added to the retry delay
    #[serde(default)]
    pub jitter_ms: u64,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_opensky_endpoint() -> String {
    "https://opensky-network.org/api/states/all".to_string()
}

fn default_poll_interval() -> u64 {
    10
}

fn default_retry_delay() -> u64 {
    5
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for AerialConfig {
    fn default() -> Self {
        Self {
            endpoint: default_opensky_endpoint(),
            poll_interval_secs: default_poll_interval(),
            retry_delay_secs: default_retry_delay(),
            jitter_ms: 0,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl AerialConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(ConfigError::invalid_value("aerial.endpoint", "must be an http(s) URL").into());
        }
        non_zero("aerial.poll_interval_secs", self.poll_interval_secs)?;
        non_zero("aerial.retry_delay_secs", self.retry_delay_secs)?;
        non_zero("aerial.request_timeout_secs", self.request_timeout_secs)?;
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn jitter(&self) -> Duration {
        Duration::from_millis(self.jitter_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// AISstream consumer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaritimeConfig {
    #[serde(default = "default_aisstream_endpoint")]
    pub endpoint: String,

    /// AISstream API key, usually supplied through `AISSTREAM_API_KEY`
    #[serde(default)]
    pub api_key: Option<String>,

    /// Subscription areas as `[[lon, lat], [lon, lat]]` corner pairs
    #[serde(default = "default_bounding_boxes")]
    pub bounding_boxes: Vec<[[f64; 2]; 2]>,

    #[serde(default = "default_retry_delay")]
    pub reconnect_delay_secs: u64,

    #[serde(default)]
    pub jitter_ms: u64,

    #[serde(default = "default_socket_timeout")]
    pub connect_timeout_secs: u64,

    /// Reconnect when no message arrives for this long
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

fn default_aisstream_endpoint() -> String {
    "wss://stream.aisstream.io/v0/stream".to_string()
}

fn default_bounding_boxes() -> Vec<[[f64; 2]; 2]> {
    vec![[[-180.0, -90.0], [180.0, 90.0]]]
}

fn default_idle_timeout() -> u64 {
    120
}

impl Default for MaritimeConfig {
    fn default() -> Self {
        Self {
            endpoint: default_aisstream_endpoint(),
            api_key: None,
            bounding_boxes: default_bounding_boxes(),
            reconnect_delay_secs: default_retry_delay(),
            jitter_ms: 0,
            connect_timeout_secs: default_socket_timeout(),
            idle_timeout_secs: default_idle_timeout(),
        }
    }
}

impl MaritimeConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.endpoint.starts_with("ws://") && !self.endpoint.starts_with("wss://") {
            return Err(ConfigError::invalid_value("maritime.endpoint", "must be a ws(s) URL").into());
        }
        if self.bounding_boxes.is_empty() {
            return Err(ConfigError::invalid_value("maritime.bounding_boxes", "at least one box is required").into());
        }
        non_zero("maritime.reconnect_delay_secs", self.reconnect_delay_secs)?;
        non_zero("maritime.connect_timeout_secs", self.connect_timeout_secs)?;
        non_zero("maritime.idle_timeout_secs", self.idle_timeout_secs)?;
        Ok(())
    }

    /// Returns the API key, or an error when it is missing or blank.
    pub fn require_api_key(&self) -> Result<&str> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(ConfigError::missing_field("maritime.api_key").into()),
        }
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    pub fn jitter(&self) -> Duration {
        Duration::from_millis(self.jitter_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

fn non_zero(field: &str, value: u64) -> Result<()> {
    if value == 0 {
        return Err(ConfigError::invalid_value(field, "must be greater than zero").into());
    }
    Ok(())
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// "text" or "json"
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::Text,
        }
    }
}

impl LoggingConfig {
    /// Parses the log level string to a tracing Level.
    pub fn parse_level(&self) -> Result<Level> {
        self.level.parse().map_err(|_| {
            ConfigError::InvalidValue {
                field: "logging.level".to_string(),
                reason: format!("Invalid log level: {}", self.level),
            }
            .into()
        })
    }
}

/// Log format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for structured logging
    Json,
}

/// Metrics configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Prometheus listener address, e.g. `0.0.0.0:9100`; unset disables the exporter
    #[serde(default)]
    pub listen: Option<String>,
}
