//! Core types shared across the OmniFeed workspace.
//!
//! Provider payloads are normalized once into [`RawObservation`]; from there
//! every stage works on these types only.

use crate::error::ParseError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Which provider family an observation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    /// ADS-B aircraft tracks
    Aerial,
    /// AIS vessel tracks
    Maritime,
}

impl Domain {
    /// Prefix for CoT uids generated from this domain.
    pub const fn uid_prefix(&self) -> &'static str {
        match self {
            Domain::Aerial => "ADSB",
            Domain::Maritime => "AIS",
        }
    }

    /// How long an emitted event stays valid before the consumer treats it as stale.
    pub const fn validity_window(&self) -> Duration {
        match self {
            Domain::Aerial => Duration::from_secs(5 * 60),
            Domain::Maritime => Duration::from_secs(60 * 60),
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::Aerial => write!(f, "aerial"),
            Domain::Maritime => write!(f, "maritime"),
        }
    }
}

/// A provider number that keeps its integer/real form.
///
/// Providers send `500` and `500.0` with different meaning to downstream
/// consumers, so the wire text reproduces whichever form was received.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Integer(i64),
    Real(f64),
}

impl Numeric {
    /// The integer zero used for every absent numeric field.
    pub const ZERO: Numeric = Numeric::Integer(0);

    pub fn as_f64(&self) -> f64 {
        match *self {
            Numeric::Integer(v) => v as f64,
            Numeric::Real(v) => v,
        }
    }

    /// Integral value, if the number has no fractional part.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Numeric::Integer(v) => Some(v),
            Numeric::Real(v) if v.fract() == 0.0 && v.is_finite() => Some(v as i64),
            Numeric::Real(_) => None,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.as_f64() == 0.0
    }

    /// Builds a `Numeric` from a JSON value, rejecting anything that is not a number.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        let number = value.as_number()?;
        if let Some(v) = number.as_i64() {
            Some(Numeric::Integer(v))
        } else {
            number.as_f64().map(Numeric::Real)
        }
    }
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Numeric::Integer(v) => write!(f, "{}", v),
            // plain decimal, never exponent form
            Numeric::Real(v) if v.is_finite() && v.fract() == 0.0 => write!(f, "{:.1}", v),
            Numeric::Real(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for Numeric {
    fn from(v: i64) -> Self {
        Numeric::Integer(v)
    }
}

impl From<i32> for Numeric {
    fn from(v: i32) -> Self {
        Numeric::Integer(v.into())
    }
}

impl From<f64> for Numeric {
    fn from(v: f64) -> Self {
        Numeric::Real(v)
    }
}

/// A single track report, normalized from a provider payload.
///
/// Every field except `domain` is optional. Absence means "unknown"; the CoT
/// encoder owns the policy for what goes on the wire in that case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    /// Provider family
    pub domain: Domain,
    /// ICAO24 hex code or MMSI
    pub id: Option<String>,
    /// Callsign or ship name
    pub name: Option<String>,
    /// Latitude in decimal degrees
    pub latitude: Option<Numeric>,
    /// Longitude in decimal degrees
    pub longitude: Option<Numeric>,
    /// Geometric altitude in meters (aerial only)
    pub altitude: Option<Numeric>,
    /// Speed in the provider's unit (m/s for ADS-B, knots for AIS)
    pub speed: Option<Numeric>,
    /// Heading or course in degrees
    pub course: Option<Numeric>,
    /// Provider type hint (AIS ship type)
    pub type_code: Option<i64>,
}

impl RawObservation {
    /// Creates an empty observation for the given domain.
    pub fn new(domain: Domain) -> Self {
        Self {
            domain,
            id: None,
            name: None,
            latitude: None,
            longitude: None,
            altitude: None,
            speed: None,
            course: None,
            type_code: None,
        }
    }

    /// Creates an aerial observation for an ICAO24 code.
    pub fn aerial(icao24: impl Into<String>) -> Self {
        Self::new(Domain::Aerial).with_id(icao24)
    }

    /// Creates a maritime observation for an MMSI.
    pub fn maritime(mmsi: impl Into<String>) -> Self {
        Self::new(Domain::Maritime).with_id(mmsi)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_position(mut self, latitude: impl Into<Numeric>, longitude: impl Into<Numeric>) -> Self {
        self.latitude = Some(latitude.into());
        self.longitude = Some(longitude.into());
        self
    }

    pub fn with_altitude(mut self, altitude: impl Into<Numeric>) -> Self {
        self.altitude = Some(altitude.into());
        self
    }

    pub fn with_speed(mut self, speed: impl Into<Numeric>) -> Self {
        self.speed = Some(speed.into());
        self
    }

    pub fn with_course(mut self, course: impl Into<Numeric>) -> Self {
        self.course = Some(course.into());
        self
    }

    pub fn with_type_code(mut self, type_code: i64) -> Self {
        self.type_code = Some(type_code);
        self
    }

    /// Identifier, or the empty string when unknown.
    pub fn id_str(&self) -> &str {
        self.id.as_deref().unwrap_or("")
    }

    /// Display name with surrounding whitespace removed, or the empty string.
    pub fn trimmed_name(&self) -> &str {
        self.name.as_deref().map(str::trim).unwrap_or("")
    }
}

/// CoT symbology assigned to a track.
///
/// The vocabulary is closed; each variant carries a fixed CoT type string and
/// a short alias usable in filter lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SymbologyType {
    MilitaryAircraft,
    NatoAircraft,
    CivilianAircraft,
    UnknownAircraft,
    UsMilitaryVessel,
    NatoVessel,
    LawEnforcementVessel,
    FishingVessel,
    PassengerVessel,
    CargoVessel,
    Tanker,
    HighSpeedCraft,
    GenericVessel,
}

impl SymbologyType {
    /// Every symbology type, aerial first.
    pub const ALL: [SymbologyType; 13] = [
        SymbologyType::MilitaryAircraft,
        SymbologyType::NatoAircraft,
        SymbologyType::CivilianAircraft,
        SymbologyType::UnknownAircraft,
        SymbologyType::UsMilitaryVessel,
        SymbologyType::NatoVessel,
        SymbologyType::LawEnforcementVessel,
        SymbologyType::FishingVessel,
        SymbologyType::PassengerVessel,
        SymbologyType::CargoVessel,
        SymbologyType::Tanker,
        SymbologyType::HighSpeedCraft,
        SymbologyType::GenericVessel,
    ];

    /// CoT `type` attribute value.
    pub const fn cot_type(&self) -> &'static str {
        match self {
            SymbologyType::MilitaryAircraft => "a-n-A-M-F",
            SymbologyType::NatoAircraft => "a-n-A-N-F",
            SymbologyType::CivilianAircraft => "a-f-A-M-F",
            SymbologyType::UnknownAircraft => "a-x-A-M-F",
            SymbologyType::UsMilitaryVessel => "a-n-G-U-C-F",
            SymbologyType::NatoVessel => "a-n-G-E-V-A",
            SymbologyType::LawEnforcementVessel => "a-f-G-U-L-E",
            SymbologyType::FishingVessel => "a-f-G-E-V-F",
            SymbologyType::PassengerVessel => "a-f-G-E-V-P",
            SymbologyType::CargoVessel => "a-f-G-E-V-C",
            SymbologyType::Tanker => "a-f-G-E-V-T",
            SymbologyType::HighSpeedCraft => "a-f-G-E-V-H",
            SymbologyType::GenericVessel => "a-f-G-E-V",
        }
    }

    /// Short name accepted on the command line and in config files.
    pub const fn alias(&self) -> &'static str {
        match self {
            SymbologyType::MilitaryAircraft => "military",
            SymbologyType::NatoAircraft => "nato",
            SymbologyType::CivilianAircraft => "civilian",
            SymbologyType::UnknownAircraft => "unknown",
            SymbologyType::UsMilitaryVessel => "mil-us",
            SymbologyType::NatoVessel => "mil-nato",
            SymbologyType::LawEnforcementVessel => "law",
            SymbologyType::FishingVessel => "fishing",
            SymbologyType::PassengerVessel => "passenger",
            SymbologyType::CargoVessel => "cargo",
            SymbologyType::Tanker => "tanker",
            SymbologyType::HighSpeedCraft => "highspeed",
            SymbologyType::GenericVessel => "other",
        }
    }

    pub const fn description(&self) -> &'static str {
        match self {
            SymbologyType::MilitaryAircraft => "Military aircraft",
            SymbologyType::NatoAircraft => "NATO aircraft",
            SymbologyType::CivilianAircraft => "Civilian fixed-wing aircraft",
            SymbologyType::UnknownAircraft => "Unknown aircraft",
            SymbologyType::UsMilitaryVessel => "US military vessel",
            SymbologyType::NatoVessel => "NATO/allied military vessel",
            SymbologyType::LawEnforcementVessel => "Law enforcement vessel",
            SymbologyType::FishingVessel => "Fishing vessel",
            SymbologyType::PassengerVessel => "Passenger vessel",
            SymbologyType::CargoVessel => "Cargo vessel",
            SymbologyType::Tanker => "Tanker",
            SymbologyType::HighSpeedCraft => "High-speed craft",
            SymbologyType::GenericVessel => "Other civilian vessel",
        }
    }

    pub const fn domain(&self) -> Domain {
        match self {
            SymbologyType::MilitaryAircraft
            | SymbologyType::NatoAircraft
            | SymbologyType::CivilianAircraft
            | SymbologyType::UnknownAircraft => Domain::Aerial,
            _ => Domain::Maritime,
        }
    }

    /// Symbology types belonging to one domain.
    pub fn for_domain(domain: Domain) -> impl Iterator<Item = SymbologyType> {
        Self::ALL.into_iter().filter(move |t| t.domain() == domain)
    }
}

impl fmt::Display for SymbologyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cot_type())
    }
}

impl FromStr for SymbologyType {
    type Err = ParseError;

    /// Accepts an alias (case-insensitive) or an exact CoT type string.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        SymbologyType::ALL
            .into_iter()
            .find(|t| t.cot_type() == token || t.alias().eq_ignore_ascii_case(token))
            .ok_or_else(|| ParseError::invalid_value("symbology type", format!("unknown type '{}'", token)))
    }
}

impl TryFrom<String> for SymbologyType {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SymbologyType> for String {
    fn from(value: SymbologyType) -> Self {
        value.alias().to_string()
    }
}

/// Which classified tracks get forwarded.
///
/// `include` wins whenever it is non-empty; `exclude` only applies when
/// `include` is empty. Both empty lets everything through.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    #[serde(default)]
    pub include: BTreeSet<SymbologyType>,
    #[serde(default)]
    pub exclude: BTreeSet<SymbologyType>,
}

impl FilterSpec {
    /// Forwards everything.
    pub fn allow_all() -> Self {
        Self::default()
    }

    pub fn include_only(types: impl IntoIterator<Item = SymbologyType>) -> Self {
        Self {
            include: types.into_iter().collect(),
            exclude: BTreeSet::new(),
        }
    }

    pub fn exclude_only(types: impl IntoIterator<Item = SymbologyType>) -> Self {
        Self {
            include: BTreeSet::new(),
            exclude: types.into_iter().collect(),
        }
    }

    /// True when both sets are populated; `exclude` is then ignored.
    pub fn is_ambiguous(&self) -> bool {
        !self.include.is_empty() && !self.exclude.is_empty()
    }

    /// Parses comma-separated alias or CoT type tokens, ignoring blanks.
    pub fn parse_tokens(list: &str) -> Result<BTreeSet<SymbologyType>, ParseError> {
        list.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::parse)
            .collect()
    }
}

/// Transport used to reach the CoT consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Persistent stream connection, newline-framed
    #[default]
    Tcp,
    /// One datagram per event
    Udp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Tcp => write!(f, "tcp"),
            Protocol::Udp => write!(f, "udp"),
        }
    }
}

impl FromStr for Protocol {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tcp" => Ok(Protocol::Tcp),
            "udp" => Ok(Protocol::Udp),
            other => Err(ParseError::invalid_value(
                "protocol",
                format!("expected 'tcp' or 'udp', got '{}'", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_display_keeps_form() {
        assert_eq!(Numeric::Integer(500).to_string(), "500");
        assert_eq!(Numeric::Real(10.0).to_string(), "10.0");
        assert_eq!(Numeric::Real(-122.4194).to_string(), "-122.4194");
        assert_eq!(Numeric::ZERO.to_string(), "0");
        assert_eq!(Numeric::Real(-0.00002).to_string(), "-0.00002");
        assert_eq!(Numeric::Real(1e21).to_string(), "1000000000000000000000.0");
    }

    #[test]
    fn test_numeric_from_json() {
        let v: serde_json::Value = serde_json::json!([500, 10.0, "x", null]);
        assert_eq!(Numeric::from_json(&v[0]), Some(Numeric::Integer(500)));
        assert_eq!(Numeric::from_json(&v[1]), Some(Numeric::Real(10.0)));
        assert_eq!(Numeric::from_json(&v[2]), None);
        assert_eq!(Numeric::from_json(&v[3]), None);
    }

    #[test]
    fn test_numeric_deserialize_untagged() {
        let n: Numeric = serde_json::from_str("511").unwrap();
        assert_eq!(n, Numeric::Integer(511));
        let n: Numeric = serde_json::from_str("12.5").unwrap();
        assert_eq!(n, Numeric::Real(12.5));
        assert_eq!(Numeric::Real(511.0).as_i64(), Some(511));
        assert_eq!(Numeric::Real(12.5).as_i64(), None);
    }

    #[test]
    fn test_symbology_parse_alias_and_code() {
        assert_eq!("cargo".parse::<SymbologyType>().unwrap(), SymbologyType::CargoVessel);
        assert_eq!("MIL-US".parse::<SymbologyType>().unwrap(), SymbologyType::UsMilitaryVessel);
        assert_eq!("a-f-G-E-V-T".parse::<SymbologyType>().unwrap(), SymbologyType::Tanker);
        assert!("submarine".parse::<SymbologyType>().is_err());
    }

    #[test]
    fn test_symbology_codes_are_unique() {
        let codes: BTreeSet<&str> = SymbologyType::ALL.iter().map(|t| t.cot_type()).collect();
        assert_eq!(codes.len(), SymbologyType::ALL.len());
        let aliases: BTreeSet<&str> = SymbologyType::ALL.iter().map(|t| t.alias()).collect();
        assert_eq!(aliases.len(), SymbologyType::ALL.len());
    }

    #[test]
    fn test_symbology_domains() {
        assert_eq!(SymbologyType::for_domain(Domain::Aerial).count(), 4);
        assert_eq!(SymbologyType::for_domain(Domain::Maritime).count(), 9);
    }

    #[test]
    fn test_filter_spec_parse_tokens() {
        let set = FilterSpec::parse_tokens("cargo, tanker,,a-f-G-E-V").unwrap();
        assert_eq!(set.len(), 3);
        assert!(set.contains(&SymbologyType::GenericVessel));
        assert!(FilterSpec::parse_tokens("cargo,bogus").is_err());
    }

    #[test]
    fn test_filter_spec_yaml() {
        let spec: FilterSpec = serde_yaml::from_str("include: [cargo, a-f-G-E-V-T]\n").unwrap();
        assert_eq!(spec.include.len(), 2);
        assert!(spec.exclude.is_empty());
        assert!(!spec.is_ambiguous());
    }

    #[test]
    fn test_domain_windows() {
        assert_eq!(Domain::Aerial.validity_window(), Duration::from_secs(300));
        assert_eq!(Domain::Maritime.validity_window(), Duration::from_secs(3600));
        assert_eq!(Domain::Aerial.uid_prefix(), "ADSB");
        assert_eq!(Domain::Maritime.uid_prefix(), "AIS");
    }

    #[test]
    fn test_protocol_parse() {
        assert_eq!("TCP".parse::<Protocol>().unwrap(), Protocol::Tcp);
        assert_eq!("udp".parse::<Protocol>().unwrap(), Protocol::Udp);
        assert!("sctp".parse::<Protocol>().is_err());
    }

    #[test]
    fn test_observation_builders() {
        let obs = RawObservation::aerial("AE1234")
            .with_name(" MIL45 ")
            .with_position(10.0, 20.0);
        assert_eq!(obs.id_str(), "AE1234");
        assert_eq!(obs.trimmed_name(), "MIL45");
        assert_eq!(obs.latitude, Some(Numeric::Real(10.0)));
        assert_eq!(RawObservation::new(Domain::Maritime).id_str(), "");
    }
}
