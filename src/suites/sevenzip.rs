//! 7-zip compression benchmark suite (spec §4.5).

use std::collections::BTreeMap;

use super::{extract_first_number, Suite};
use crate::model::{FeatureMap, FeatureStats};

pub struct SevenZip;

impl Suite for SevenZip {
    fn name(&self) -> &'static str {
        "7zip"
    }

    fn parse(&self, stdout: &str) -> FeatureMap {
        let mut features = FeatureMap::new();
        features.insert(
            "compression_mips".to_string(),
            extract_first_number(stdout, "Compression:"),
        );
        features.insert(
            "decompression_mips".to_string(),
            extract_first_number(stdout, "Decompression:"),
        );
        features.insert(
            "total_mips".to_string(),
            extract_first_number(stdout, "Total:"),
        );
        features.insert(
            "single_thread_mips".to_string(),
            extract_first_number(stdout, "Single-thread:"),
        );
        features
    }

    fn derive(&self, stats: &BTreeMap<String, FeatureStats>) -> BTreeMap<String, f64> {
        let mut derived = BTreeMap::new();
        // Scaling efficiency = multi/single (spec §4.5).
        if let (Some(multi), Some(single)) = (
            stats.get("total_mips").and_then(|s| s.mean),
            stats.get("single_thread_mips").and_then(|s| s.mean),
        ) {
            if single > 0.0 {
                derived.insert("scaling_efficiency".to_string(), multi / single);
            }
        }
        derived
    }
}
