//! Vector-operations (AXPY/DOT/NORM) suite (spec §4.5).

use std::collections::BTreeMap;

use super::{extract_first_number, Suite};
use crate::model::{FeatureMap, FeatureStats};

const OPS: [&str; 3] = ["axpy", "dot", "norm"];
const TIERS: [&str; 3] = ["small", "medium", "large"];

pub struct VectorOps;

impl Suite for VectorOps {
    fn name(&self) -> &'static str {
        "vector_ops"
    }

    fn parse(&self, stdout: &str) -> FeatureMap {
        let mut features = FeatureMap::new();
        for op in OPS {
            for tier in TIERS {
                let label = format!("{}-{}:", op.to_uppercase(), tier);
                features.insert(
                    format!("{op}_{tier}_gflops"),
                    extract_first_number(stdout, &label),
                );
            }
        }
        features
    }

    fn derive(&self, stats: &BTreeMap<String, FeatureStats>) -> BTreeMap<String, f64> {
        let mut derived = BTreeMap::new();
        for op in OPS {
            let values: Vec<f64> = TIERS
                .iter()
                .filter_map(|tier| stats.get(&format!("{op}_{tier}_gflops")).and_then(|s| s.mean))
                .collect();
            if !values.is_empty() {
                derived.insert(
                    format!("{op}_mean_across_tiers"),
                    values.iter().sum::<f64>() / values.len() as f64,
                );
            }
        }

        let all: Vec<f64> = stats.values().filter_map(|s| s.mean).collect();
        if !all.is_empty() {
            derived.insert(
                "overall_mean".to_string(),
                all.iter().sum::<f64>() / all.len() as f64,
            );
        }
        derived
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_op_tier_combination() {
        let stdout = "\
AXPY-small: 1.1 GFLOPS\nAXPY-medium: 1.5 GFLOPS\nAXPY-large: 1.3 GFLOPS\n\
DOT-small: 2.1 GFLOPS\nDOT-medium: 2.5 GFLOPS\nDOT-large: 2.3 GFLOPS\n\
NORM-small: 3.1 GFLOPS\nNORM-medium: 3.5 GFLOPS\nNORM-large: 3.3 GFLOPS\n";
        let features = VectorOps.parse(stdout);
        assert_eq!(features.get("axpy_medium_gflops").copied().flatten(), Some(1.5));
        assert_eq!(features.get("norm_large_gflops").copied().flatten(), Some(3.3));
    }

    #[test]
    fn derive_computes_per_op_and_overall_means() {
        let mut stats = BTreeMap::new();
        for (key, mean) in [
            ("axpy_small_gflops", 1.0),
            ("axpy_medium_gflops", 2.0),
            ("axpy_large_gflops", 3.0),
        ] {
            stats.insert(
                key.to_string(),
                FeatureStats { count: 3, mean: Some(mean), stddev: None, min: None, max: None },
            );
        }
        let derived = VectorOps.derive(&stats);
        assert_eq!(derived.get("axpy_mean_across_tiers"), Some(&2.0));
    }
}
