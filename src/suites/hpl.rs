//! HPL (High-Performance Linpack) suite (spec §4.5).

use std::collections::BTreeMap;

use super::{extract_first_number, Suite};
use crate::model::{FeatureMap, FeatureStats};

pub struct Hpl;

impl Suite for Hpl {
    fn name(&self) -> &'static str {
        "hpl"
    }

    fn parse(&self, stdout: &str) -> FeatureMap {
        let mut features = FeatureMap::new();
        features.insert(
            "peak_gflops".to_string(),
            extract_first_number(stdout, "Peak GFLOPS:"),
        );
        features
    }

    fn derive(&self, _stats: &BTreeMap<String, FeatureStats>) -> BTreeMap<String, f64> {
        // mean/stddev on peak_gflops is the entire contract for this suite
        // (spec §4.5); no additional derived ratios.
        BTreeMap::new()
    }
}
