//! FFTW transform suite (spec §4.5).

use std::collections::BTreeMap;

use super::{extract_first_number, Suite};
use crate::model::{FeatureMap, FeatureStats};

pub struct Fftw;

impl Suite for Fftw {
    fn name(&self) -> &'static str {
        "fftw"
    }

    fn parse(&self, stdout: &str) -> FeatureMap {
        let mut features = FeatureMap::new();
        features.insert(
            "gflops_1d_small".to_string(),
            extract_first_number(stdout, "1D-small:"),
        );
        features.insert(
            "gflops_1d_medium".to_string(),
            extract_first_number(stdout, "1D-medium:"),
        );
        features.insert(
            "gflops_1d_large".to_string(),
            extract_first_number(stdout, "1D-large:"),
        );
        features.insert("gflops_2d".to_string(), extract_first_number(stdout, "2D:"));
        features.insert("gflops_3d".to_string(), extract_first_number(stdout, "3D:"));
        features
    }

    fn derive(&self, stats: &BTreeMap<String, FeatureStats>) -> BTreeMap<String, f64> {
        let mut derived = BTreeMap::new();

        let oned = [
            stats.get("gflops_1d_small").and_then(|s| s.mean),
            stats.get("gflops_1d_medium").and_then(|s| s.mean),
            stats.get("gflops_1d_large").and_then(|s| s.mean),
        ];
        let peak_1d = oned.iter().flatten().copied().fold(f64::MIN, f64::max);
        if peak_1d > f64::MIN {
            derived.insert("peak_1d".to_string(), peak_1d);
        }

        if let (Some(small), Some(large)) = (
            stats.get("gflops_1d_small").and_then(|s| s.mean),
            stats.get("gflops_1d_large").and_then(|s| s.mean),
        ) {
            if small > 0.0 {
                derived.insert("memory_scaling_efficiency".to_string(), large / small);
            }
        }

        if let (Some(two_d), Some(small)) = (
            stats.get("gflops_2d").and_then(|s| s.mean),
            stats.get("gflops_1d_small").and_then(|s| s.mean),
        ) {
            if small > 0.0 {
                derived.insert("dimensionality_efficiency".to_string(), two_d / small);
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
