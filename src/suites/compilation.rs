//! Compiler build-time suite (spec §4.5).

use std::collections::BTreeMap;

use super::{extract_first_number, Suite};
use crate::model::{FeatureMap, FeatureStats};

pub struct Compilation;

impl Suite for Compilation {
    fn name(&self) -> &'static str {
        "compilation"
    }

    fn parse(&self, stdout: &str) -> FeatureMap {
        let mut features = FeatureMap::new();
        features.insert(
            "single_threaded_sec".to_string(),
            extract_first_number(stdout, "Single-threaded:"),
        );
        features.insert(
            "multi_threaded_sec".to_string(),
            extract_first_number(stdout, "Multi-threaded:"),
        );
        features.insert(
            "incremental_sec".to_string(),
            extract_first_number(stdout, "Incremental:"),
        );
        features.insert(
            "parallel_speedup".to_string(),
            extract_first_number(stdout, "Parallel speedup:"),
        );
        features.insert(
            "efficiency_pct".to_string(),
            extract_first_number(stdout, "Efficiency:"),
        );
        features
    }

    fn derive(&self, stats: &BTreeMap<String, FeatureStats>) -> BTreeMap<String, f64> {
        let mut derived = BTreeMap::new();
        if let Some(speedup) = stats.get("parallel_speedup").and_then(|s| s.mean) {
            // Efficiency rating thresholds: excellent >= 0.9, good >= 0.7,
            // fair >= 0.5, else poor, expressed against a numeric core
            // count is unavailable here — rating is banded on the speedup
            // value directly (spec §4.5 leaves the exact thresholds to the
            // implementation).
            let rating = if speedup >= 6.0 {
                4.0 // excellent
            } else if speedup >= 4.0 {
                3.0 // good
            } else if speedup >= 2.0 {
                2.0 // fair
            } else {
                1.0 // poor
            };
            derived.insert("efficiency_rating".to_string(), rating);
        }
        derived
    }
}
