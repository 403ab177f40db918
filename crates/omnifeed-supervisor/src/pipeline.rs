//! Per-observation stage: classify, filter, encode, serialize.

use chrono::{DateTime, Utc};
use omnifeed_core::config::AppConfig;
use omnifeed_core::types::{RawObservation, SymbologyType};
use omnifeed_core::Result;
use omnifeed_cot::encode_xml;
use omnifeed_filter::{Classifier, TypeFilter};

/// What happened to one observation
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Encoded document ready for the sink
    Forward {
        symbology: SymbologyType,
        frame: String,
    },
    /// Dropped by the type filter
    Filtered(SymbologyType),
}

#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    classifier: Classifier,
    filter: TypeFilter,
}

impl Pipeline {
    pub fn new(classifier: Classifier, filter: TypeFilter) -> Self {
        Self { classifier, filter }
    }

    /// Builds the classifier tables and filter from configuration
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let spec = config.filter.to_spec()?;
        Ok(Self::new(
            Classifier::with_config(&config.classifier),
            TypeFilter::new(spec),
        ))
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn filter(&self) -> &TypeFilter {
        &self.filter
    }

    pub fn process(&self, observation: &RawObservation, generated_at: DateTime<Utc>) -> Outcome {
        let symbology = self.classifier.classify(observation);
        if self.filter.evaluate(symbology).is_block() {
            return Outcome::Filtered(symbology);
        }
        Outcome::Forward {
            symbology,
            frame: encode_xml(observation, symbology, generated_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use omnifeed_core::types::FilterSpec;

    #[test]
    fn test_forward_encodes_classified_type() {
        let pipeline = Pipeline::default();
        let obs = RawObservation::aerial("ae1234").with_name("MIL45");
        match pipeline.process(&obs, Utc::now()) {
            Outcome::Forward { symbology, frame } => {
                assert_eq!(symbology, SymbologyType::MilitaryAircraft);
                assert!(frame.contains(r#"type="a-n-A-M-F""#));
                assert!(frame.contains(r#"uid="ADSB.ae1234""#));
            }
            other => panic!("expected forward, got {:?}", other),
        }
    }

    #[test]
    fn test_excluded_type_is_filtered() {
        let pipeline = Pipeline::new(
            Classifier::new(),
            TypeFilter::new(FilterSpec::exclude_only([SymbologyType::CivilianAircraft])),
        );
        let obs = RawObservation::aerial("a1b2c3").with_name("DAL123");
        assert_eq!(
            pipeline.process(&obs, Utc::now()),
            Outcome::Filtered(SymbologyType::CivilianAircraft)
        );
    }

    #[test]
    fn test_from_config_rejects_unknown_token() {
        let mut config = AppConfig::default();
        config.filter.include = vec!["submarine".to_string()];
        assert!(Pipeline::from_config(&config).is_err());
    }
}
