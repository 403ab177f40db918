//! Track classification
//!
//! Maps a normalized observation to exactly one [`SymbologyType`]. The
//! classifier is a plain value holding its lookup tables so that extra
//! prefixes from configuration can be appended without touching the
//! built-in rules. Rules are evaluated in order and the first match wins.

use omnifeed_core::config::ClassifierConfig;
use omnifeed_core::types::{Domain, RawObservation, SymbologyType};
use std::ops::Range;

/// One AIS ship-type interval, half-open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipTypeRule {
    pub codes: Range<i64>,
    pub symbology: SymbologyType,
}

impl ShipTypeRule {
    const fn new(codes: Range<i64>, symbology: SymbologyType) -> Self {
        Self { codes, symbology }
    }
}

/// Classifier holding prefix and ship-type tables.
#[derive(Debug, Clone)]
pub struct Classifier {
    icao_prefixes: Vec<(String, SymbologyType)>,
    mmsi_prefixes: Vec<(String, SymbologyType)>,
    ship_types: Vec<ShipTypeRule>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            icao_prefixes: vec![
                ("AF".to_string(), SymbologyType::MilitaryAircraft),
                ("US".to_string(), SymbologyType::MilitaryAircraft),
                ("UK".to_string(), SymbologyType::NatoAircraft),
                ("FR".to_string(), SymbologyType::NatoAircraft),
            ],
            mmsi_prefixes: vec![
                ("338".to_string(), SymbologyType::UsMilitaryVessel),
                ("339".to_string(), SymbologyType::UsMilitaryVessel),
                ("244".to_string(), SymbologyType::NatoVessel),
                ("235".to_string(), SymbologyType::NatoVessel),
                ("250".to_string(), SymbologyType::NatoVessel),
            ],
            // 35 (military operations) splits the fishing interval
            ship_types: vec![
                ShipTypeRule::new(30..35, SymbologyType::FishingVessel),
                ShipTypeRule::new(35..36, SymbologyType::UsMilitaryVessel),
                ShipTypeRule::new(36..38, SymbologyType::FishingVessel),
                ShipTypeRule::new(40..41, SymbologyType::HighSpeedCraft),
                ShipTypeRule::new(51..52, SymbologyType::LawEnforcementVessel),
                ShipTypeRule::new(55..56, SymbologyType::LawEnforcementVessel),
                ShipTypeRule::new(60..70, SymbologyType::PassengerVessel),
                ShipTypeRule::new(70..80, SymbologyType::CargoVessel),
                ShipTypeRule::new(80..90, SymbologyType::Tanker),
            ],
        }
    }
}

impl Classifier {
    /// Creates a classifier with the built-in tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in tables followed by the configured extensions.
    pub fn with_config(config: &ClassifierConfig) -> Self {
        let mut classifier = Self::default();
        for (prefix, symbology) in &config.icao_prefixes {
            classifier.add_icao_prefix(prefix, *symbology);
        }
        for (prefix, symbology) in &config.mmsi_prefixes {
            classifier.add_mmsi_prefix(prefix, *symbology);
        }
        classifier
    }

    /// Appends an ICAO24 prefix entry; earlier entries keep priority.
    pub fn add_icao_prefix(&mut self, prefix: &str, symbology: SymbologyType) {
        self.icao_prefixes.push((prefix.trim().to_uppercase(), symbology));
    }

    /// Appends an MMSI prefix entry; earlier entries keep priority.
    pub fn add_mmsi_prefix(&mut self, prefix: &str, symbology: SymbologyType) {
        self.mmsi_prefixes.push((prefix.trim().to_string(), symbology));
    }

    pub fn ship_type_rules(&self) -> &[ShipTypeRule] {
        &self.ship_types
    }

    /// Classifies an observation. Total: every input yields a type.
    pub fn classify(&self, observation: &RawObservation) -> SymbologyType {
        match observation.domain {
            Domain::Aerial => self.classify_aircraft(observation.name.as_deref(), observation.id.as_deref()),
            Domain::Maritime => self.classify_vessel(observation.id.as_deref(), observation.type_code),
        }
    }

    /// Callsign rules first, then the ICAO24 prefix table, then civilian.
    pub fn classify_aircraft(&self, callsign: Option<&str>, icao24: Option<&str>) -> SymbologyType {
        let callsign = callsign.map(str::trim).unwrap_or("").to_uppercase();

        if callsign.starts_with("MIL") || callsign.contains("FORCE") {
            return SymbologyType::MilitaryAircraft;
        }
        if callsign.contains("NATO") {
            return SymbologyType::NatoAircraft;
        }

        let icao_prefix: String = icao24
            .map(str::trim)
            .unwrap_or("")
            .chars()
            .take(2)
            .collect::<String>()
            .to_uppercase();
        if icao_prefix.chars().count() == 2 {
            if let Some((_, symbology)) = self.icao_prefixes.iter().find(|(p, _)| *p == icao_prefix) {
                return *symbology;
            }
        }

        SymbologyType::CivilianAircraft
    }

    /// MMSI prefix first, then the ship-type ranges, then a generic vessel.
    pub fn classify_vessel(&self, mmsi: Option<&str>, ship_type: Option<i64>) -> SymbologyType {
        let mmsi = mmsi.map(str::trim).unwrap_or("");
        if let Some((_, symbology)) = self
            .mmsi_prefixes
            .iter()
            .find(|(prefix, _)| mmsi.starts_with(prefix.as_str()))
        {
            return *symbology;
        }

        if let Some(code) = ship_type.filter(|code| *code != 0) {
            if let Some(rule) = self.ship_types.iter().find(|rule| rule.codes.contains(&code)) {
                return rule.symbology;
            }
        }

        SymbologyType::GenericVessel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aircraft(callsign: &str, icao24: &str) -> SymbologyType {
        Classifier::new().classify(&RawObservation::aerial(icao24).with_name(callsign))
    }

    fn vessel(mmsi: &str, ship_type: Option<i64>) -> SymbologyType {
        let mut obs = RawObservation::maritime(mmsi);
        obs.type_code = ship_type;
        Classifier::new().classify(&obs)
    }

    #[test]
    fn test_military_icao_prefix() {
        assert_eq!(aircraft("", "AF1234"), SymbologyType::MilitaryAircraft);
        assert_eq!(aircraft("DAL1", "us00aa"), SymbologyType::MilitaryAircraft);
        assert_eq!(aircraft("", "FR0001"), SymbologyType::NatoAircraft);
    }

    #[test]
    fn test_callsign_rules() {
        assert_eq!(aircraft("  MIL45 ", "a1b2c3"), SymbologyType::MilitaryAircraft);
        assert_eq!(aircraft("reach force", "a1b2c3"), SymbologyType::MilitaryAircraft);
        assert_eq!(aircraft("NATO01", "a1b2c3"), SymbologyType::NatoAircraft);
    }

    #[test]
    fn test_nato_callsign_beats_civilian_prefix() {
        assert_eq!(aircraft("NATO01", "3C0001"), SymbologyType::NatoAircraft);
        assert_eq!(aircraft("NATO01", "US0001"), SymbologyType::NatoAircraft);
    }

    #[test]
    fn test_civilian_default() {
        assert_eq!(aircraft("DAL123", "a1b2c3"), SymbologyType::CivilianAircraft);
        let empty = RawObservation::new(Domain::Aerial);
        assert_eq!(Classifier::new().classify(&empty), SymbologyType::CivilianAircraft);
    }

    #[test]
    fn test_mmsi_prefix_wins_over_ship_type() {
        assert_eq!(vessel("338123456", Some(70)), SymbologyType::UsMilitaryVessel);
        assert_eq!(vessel("339000001", None), SymbologyType::UsMilitaryVessel);
        assert_eq!(vessel("235000001", Some(80)), SymbologyType::NatoVessel);
    }

    #[test]
    fn test_ship_type_boundaries() {
        assert_eq!(vessel("366000001", Some(29)), SymbologyType::GenericVessel);
        assert_eq!(vessel("366000001", Some(30)), SymbologyType::FishingVessel);
        assert_eq!(vessel("366000001", Some(35)), SymbologyType::UsMilitaryVessel);
        assert_eq!(vessel("366000001", Some(37)), SymbologyType::FishingVessel);
        assert_eq!(vessel("366000001", Some(38)), SymbologyType::GenericVessel);
        assert_eq!(vessel("366000001", Some(40)), SymbologyType::HighSpeedCraft);
        assert_eq!(vessel("366000001", Some(51)), SymbologyType::LawEnforcementVessel);
        assert_eq!(vessel("366000001", Some(55)), SymbologyType::LawEnforcementVessel);
        assert_eq!(vessel("366000001", Some(60)), SymbologyType::PassengerVessel);
        assert_eq!(vessel("366000001", Some(79)), SymbologyType::CargoVessel);
        assert_eq!(vessel("366000001", Some(80)), SymbologyType::Tanker);
        assert_eq!(vessel("366000001", Some(89)), SymbologyType::Tanker);
        assert_eq!(vessel("366000001", Some(90)), SymbologyType::GenericVessel);
        assert_eq!(vessel("366000001", Some(0)), SymbologyType::GenericVessel);
    }

    #[test]
    fn test_ship_type_table_is_disjoint() {
        let classifier = Classifier::new();
        let rules = classifier.ship_type_rules();
        for (i, a) in rules.iter().enumerate() {
            assert!(a.codes.start < a.codes.end, "empty interval {:?}", a.codes);
            for b in &rules[i + 1..] {
                let overlap = a.codes.start < b.codes.end && b.codes.start < a.codes.end;
                assert!(!overlap, "{:?} overlaps {:?}", a.codes, b.codes);
            }
        }
    }

    #[test]
    fn test_configured_prefixes_extend_tables() {
        let mut config = ClassifierConfig::default();
        config.icao_prefixes.insert("gb".to_string(), SymbologyType::NatoAircraft);
        config.mmsi_prefixes.insert("232".to_string(), SymbologyType::NatoVessel);
        config.icao_prefixes.insert("US".to_string(), SymbologyType::CivilianAircraft);

        let classifier = Classifier::with_config(&config);
        assert_eq!(
            classifier.classify(&RawObservation::aerial("GB0001")),
            SymbologyType::NatoAircraft
        );
        assert_eq!(
            classifier.classify(&RawObservation::maritime("232001234")),
            SymbologyType::NatoVessel
        );
        // built-in entry stays first
        assert_eq!(
            classifier.classify(&RawObservation::aerial("US0001")),
            SymbologyType::MilitaryAircraft
        );
    }

    #[test]
    fn test_every_result_matches_domain() {
        let classifier = Classifier::new();
        for code in 0..100 {
            let mut obs = RawObservation::maritime("211000000");
            obs.type_code = Some(code);
            assert_eq!(classifier.classify(&obs).domain(), Domain::Maritime);
        }
        for icao in ["AF0000", "UK0000", "zz0000", ""] {
            let obs = RawObservation::aerial(icao);
            assert_eq!(classifier.classify(&obs).domain(), Domain::Aerial);
        }
    }
}
