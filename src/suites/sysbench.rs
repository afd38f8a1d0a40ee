//! Sysbench CPU throughput suite (spec §4.5).

use std::collections::BTreeMap;

use super::{extract_first_number, Suite};
use crate::model::{FeatureMap, FeatureStats};

pub struct Sysbench;

impl Suite for Sysbench {
    fn name(&self) -> &'static str {
        "sysbench"
    }

    fn parse(&self, stdout: &str) -> FeatureMap {
        let mut features = FeatureMap::new();
        features.insert(
            "events_per_sec_multi".to_string(),
            extract_first_number(stdout, "events/sec multi:"),
        );
        features.insert(
            "events_per_sec_single".to_string(),
            extract_first_number(stdout, "events/sec single:"),
        );
        features.insert(
            "total_time_sec".to_string(),
            extract_first_number(stdout, "total time:"),
        );
        features
    }

    fn derive(&self, _stats: &BTreeMap<String, FeatureStats>) -> BTreeMap<String, f64> {
        BTreeMap::new()
    }
}
