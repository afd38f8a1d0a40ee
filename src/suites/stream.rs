//! STREAM memory-bandwidth suite (spec §4.5).

use std::collections::BTreeMap;

use super::{extract_first_number, Suite};
use crate::model::{FeatureMap, FeatureStats};

pub struct Stream;

impl Suite for Stream {
    fn name(&self) -> &'static str {
        "stream"
    }

    fn parse(&self, stdout: &str) -> FeatureMap {
        let mut features = FeatureMap::new();
        features.insert("copy".to_string(), extract_first_number(stdout, "Copy:"));
        features.insert("scale".to_string(), extract_first_number(stdout, "Scale:"));
        features.insert("add".to_string(), extract_first_number(stdout, "Add:"));
        features.insert("triad".to_string(), extract_first_number(stdout, "Triad:"));
        features
    }

    fn derive(&self, stats: &BTreeMap<String, FeatureStats>) -> BTreeMap<String, f64> {
        let mut derived = BTreeMap::new();
        // Triad bandwidth is the headline figure (spec §4.5); surfaced
        // verbatim as a derived field so callers don't need suite-specific
        // knowledge to find it.
        if let Some(mean) = stats.get("triad").and_then(|s| s.mean) {
            derived.insert("headline_triad_mean".to_string(), mean);
        }
        derived
    }
}
