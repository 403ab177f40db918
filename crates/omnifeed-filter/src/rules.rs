//! Include/exclude rules over classified tracks

use omnifeed_core::types::{FilterSpec, SymbologyType};
use std::fmt;
use tracing::warn;

/// Result of a filter evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterResult {
    /// Track is forwarded
    Pass,
    /// Track is dropped
    Block,
}

impl FilterResult {
    #[inline]
    pub fn is_pass(&self) -> bool {
        matches!(self, FilterResult::Pass)
    }

    #[inline]
    pub fn is_block(&self) -> bool {
        matches!(self, FilterResult::Block)
    }
}

impl From<bool> for FilterResult {
    fn from(pass: bool) -> Self {
        if pass {
            FilterResult::Pass
        } else {
            FilterResult::Block
        }
    }
}

/// Whether a track of the given type is forwarded.
///
/// A non-empty include set decides alone; otherwise a non-empty exclude set
/// decides; otherwise everything passes.
#[inline]
pub fn passes(symbology: SymbologyType, spec: &FilterSpec) -> bool {
    if !spec.include.is_empty() {
        spec.include.contains(&symbology)
    } else if !spec.exclude.is_empty() {
        !spec.exclude.contains(&symbology)
    } else {
        true
    }
}

/// Filter over symbology types, fixed at startup.
#[derive(Debug, Clone, Default)]
pub struct TypeFilter {
    spec: FilterSpec,
}

impl TypeFilter {
    /// Builds the filter, warning when both lists are populated.
    pub fn new(spec: FilterSpec) -> Self {
        if spec.is_ambiguous() {
            warn!(
                include = spec.include.len(),
                exclude = spec.exclude.len(),
                "Both include and exclude filters configured; exclude list is ignored"
            );
        }
        Self { spec }
    }

    #[inline]
    pub fn evaluate(&self, symbology: SymbologyType) -> FilterResult {
        passes(symbology, &self.spec).into()
    }

    pub fn spec(&self) -> &FilterSpec {
        &self.spec
    }
}

impl fmt::Display for TypeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let list = |set: &std::collections::BTreeSet<SymbologyType>| {
            set.iter().map(|t| t.alias()).collect::<Vec<_>>().join(",")
        };
        if !self.spec.include.is_empty() {
            write!(f, "include[{}]", list(&self.spec.include))
        } else if !self.spec.exclude.is_empty() {
            write!(f, "exclude[{}]", list(&self.spec.exclude))
        } else {
            write!(f, "all")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_include_only_members_pass() {
        let spec = FilterSpec::include_only([SymbologyType::CargoVessel]);
        assert!(passes(SymbologyType::CargoVessel, &spec));
        assert!(!passes(SymbologyType::Tanker, &spec));
    }

    #[test]
    fn test_exclude_blocks_members() {
        let spec = FilterSpec::exclude_only([SymbologyType::FishingVessel]);
        assert!(!passes(SymbologyType::FishingVessel, &spec));
        assert!(passes(SymbologyType::CargoVessel, &spec));
    }

    #[test]
    fn test_empty_spec_passes_everything() {
        let spec = FilterSpec::allow_all();
        assert!(SymbologyType::ALL.iter().all(|t| passes(*t, &spec)));
    }

    #[test]
    fn test_include_governs_when_both_set() {
        let spec = FilterSpec {
            include: [SymbologyType::CargoVessel].into_iter().collect(),
            exclude: [SymbologyType::CargoVessel, SymbologyType::Tanker].into_iter().collect(),
        };
        let filter = TypeFilter::new(spec);
        assert!(filter.evaluate(SymbologyType::CargoVessel).is_pass());
        assert!(filter.evaluate(SymbologyType::Tanker).is_block());
        assert!(filter.evaluate(SymbologyType::PassengerVessel).is_block());
    }

    #[test]
    fn test_display() {
        let filter = TypeFilter::new(FilterSpec::exclude_only([
            SymbologyType::Tanker,
            SymbologyType::CargoVessel,
        ]));
        assert_eq!(filter.to_string(), "exclude[cargo,tanker]");
        assert_eq!(TypeFilter::default().to_string(), "all");
    }
}
