//! Mixed floating-point precision suite (spec §4.5).

use std::collections::BTreeMap;

use super::{extract_first_number, Suite};
use crate::model::{FeatureMap, FeatureStats};

pub struct MixedPrecision;

impl Suite for MixedPrecision {
    fn name(&self) -> &'static str {
        "mixed_precision"
    }

    fn parse(&self, stdout: &str) -> FeatureMap {
        let mut features = FeatureMap::new();
        features.insert(
            "peak_fp16_gflops".to_string(),
            extract_first_number(stdout, "Peak FP16:"),
        );
        features.insert(
            "peak_fp32_gflops".to_string(),
            extract_first_number(stdout, "Peak FP32:"),
        );
        features.insert(
            "peak_fp64_gflops".to_string(),
            extract_first_number(stdout, "Peak FP64:"),
        );
        features
    }

    fn derive(&self, stats: &BTreeMap<String, FeatureStats>) -> BTreeMap<String, f64> {
        let mut derived = BTreeMap::new();
        let fp16 = stats.get("peak_fp16_gflops").and_then(|s| s.mean);
        let fp32 = stats.get("peak_fp32_gflops").and_then(|s| s.mean);
        let fp64 = stats.get("peak_fp64_gflops").and_then(|s| s.mean);

        if let (Some(fp16), Some(fp32)) = (fp16, fp32) {
            if fp32 > 0.0 {
                derived.insert("fp16_fp32_ratio".to_string(), fp16 / fp32);
            }
        }
        if let (Some(fp32), Some(fp64)) = (fp32, fp64) {
            if fp64 > 0.0 {
                derived.insert("fp32_fp64_ratio".to_string(), fp32 / fp64);
            }
        }
        if let (Some(fp16), Some(fp32), Some(fp64)) = (fp16, fp32, fp64) {
            derived.insert("composite_score".to_string(), (fp16 + fp32 + fp64) / 3.0);
        }
        derived
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_three_precisions() {
        let stdout = "Peak FP16: 118.79 GFLOPS\nPeak FP32: 59.40 GFLOPS\nPeak FP64: 29.70 GFLOPS\n";
        let features = MixedPrecision.parse(stdout);
        assert_eq!(features.get("peak_fp16_gflops").copied().flatten(), Some(118.79));
    }

    #[test]
    fn derive_computes_ratios_and_composite_score() {
        let mut stats = BTreeMap::new();
        for (key, mean) in [
            ("peak_fp16_gflops", 120.0),
            ("peak_fp32_gflops", 60.0),
            ("peak_fp64_gflops", 30.0),
        ] {
            stats.insert(
                key.to_string(),
                FeatureStats { count: 3, mean: Some(mean), stddev: None, min: None, max: None },
            );
        }
        let derived = MixedPrecision.derive(&stats);
        assert_eq!(derived.get("fp16_fp32_ratio"), Some(&2.0));
        assert_eq!(derived.get("fp32_fp64_ratio"), Some(&2.0));
        assert_eq!(derived.get("composite_score"), Some(&70.0));
    }
}
