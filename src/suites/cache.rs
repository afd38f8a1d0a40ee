//! Memory-hierarchy latency/bandwidth suite (spec §4.5).

use std::collections::BTreeMap;

use super::{extract_first_number, Suite};
use crate::model::{FeatureMap, FeatureStats};

const LEVELS: [&str; 4] = ["L1", "L2", "L3", "Main"];

pub struct Cache;

impl Suite for Cache {
    fn name(&self) -> &'static str {
        "cache"
    }

    fn parse(&self, stdout: &str) -> FeatureMap {
        let mut features = FeatureMap::new();
        for level in LEVELS {
            let label_latency = format!("{level} latency:");
            let label_bandwidth = format!("{level} bandwidth:");
            let key = level.to_lowercase();
            features.insert(
                format!("{key}_latency_ns"),
                extract_first_number(stdout, &label_latency),
            );
            features.insert(
                format!("{key}_bandwidth_gbps"),
                extract_first_number(stdout, &label_bandwidth),
            );
        }
        features
    }

    fn derive(&self, _stats: &BTreeMap<String, FeatureStats>) -> BTreeMap<String, f64> {
        // Per-level mean/stddev is the entire contract (spec §4.5); no
        // cross-level derived ratios are specified.
        BTreeMap::new()
    }
}
