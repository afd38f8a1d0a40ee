//! Statistical aggregation: folds N raw per-iteration feature maps into an
//! [`AggregatedResultRecord`] (spec §4.7).
//!
//! Grounded on `src/stats/mod.rs`'s use of `statrs::statistics::Statistics`
//! directly on `&[f64]` slices for `.mean()` / `.std_dev()`. No outlier
//! rejection is performed — a deliberate policy carried over from spec §9:
//! small sample sizes (3-5) make outlier tests unreliable.

use std::collections::BTreeMap;

use statrs::statistics::Statistics;

use crate::model::{AggregatedResultRecord, FeatureStats, RawResultObject};
use crate::suites::registry;

/// Fold a node's raw per-iteration measurements into a statistical summary.
///
/// For an opaque suite (no registered parser), returns a record with no
/// features and `success` taken directly from the raw object — aggregation
/// is skipped entirely, per spec §4.5/§9.
pub fn aggregate(raw: &RawResultObject) -> AggregatedResultRecord {
    let Some(suite) = registry(&raw.benchmark_suite) else {
        return AggregatedResultRecord {
            suite: raw.benchmark_suite.clone(),
            features: BTreeMap::new(),
            derived: BTreeMap::new(),
            success: raw.success,
        };
    };

    // Union of every feature key seen across iterations, so a field absent
    // from one iteration but present in another is still aggregated over
    // the iterations that did report it.
    let mut keys: Vec<String> = Vec::new();
    for iteration in &raw.iterations {
        for key in iteration.keys() {
            if !keys.contains(key) {
                keys.push(key.clone());
            }
        }
    }

    let mut features = BTreeMap::new();
    for key in &keys {
        let values: Vec<f64> = raw
            .iterations
            .iter()
            .filter_map(|iteration| iteration.get(key).copied().flatten())
            .collect();
        features.insert(key.clone(), summarize(&values));
    }

    let derived = suite.derive(&features);

    // Empty iteration list -> all features absent, success false (spec §8
    // boundary behavior), regardless of what the node reported.
    let success = raw.success && !raw.iterations.is_empty();

    AggregatedResultRecord {
        suite: raw.benchmark_suite.clone(),
        features,
        derived,
        success,
    }
}

fn summarize(values: &[f64]) -> FeatureStats {
    if values.is_empty() {
        return FeatureStats {
            count: 0,
            mean: None,
            stddev: None,
            min: None,
            max: None,
        };
    }

    let mean = values.mean();
    let stddev = if values.len() >= 2 {
        Some(values.std_dev())
    } else {
        None
    };
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    FeatureStats {
        count: values.len(),
        mean: Some(mean),
        stddev,
        min: Some(min),
        max: Some(max),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FeatureMap;
    use crate::suites::SuiteKind;
    use chrono::Utc;
    use std::time::Duration;

    fn raw_with_iterations(iterations: Vec<FeatureMap>) -> RawResultObject {
        RawResultObject {
            benchmark_suite: SuiteKind::Stream,
            iterations,
            raw_output: None,
            success: true,
            exit_code: 0,
            duration: Duration::from_secs(60),
            timestamp: Utc::now(),
        }
    }

    fn feature_map(triad: f64) -> FeatureMap {
        let mut map = FeatureMap::new();
        map.insert("triad".to_string(), Some(triad));
        map
    }

    #[test]
    fn single_iteration_has_no_stddev() {
        let raw = raw_with_iterations(vec![feature_map(13000.0)]);
        let aggregated = aggregate(&raw);
        let triad = &aggregated.features["triad"];
        assert_eq!(triad.count, 1);
        assert_eq!(triad.mean, Some(13000.0));
        assert_eq!(triad.stddev, None);
    }

    #[test]
    fn repeated_identical_iterations_yield_zero_stddev() {
        let raw = raw_with_iterations(vec![feature_map(13000.0); 5]);
        let aggregated = aggregate(&raw);
        let triad = &aggregated.features["triad"];
        assert_eq!(triad.mean, Some(13000.0));
        assert_eq!(triad.stddev, Some(0.0));
    }

    #[test]
    fn empty_iteration_list_marks_the_record_unsuccessful() {
        let raw = raw_with_iterations(vec![]);
        let aggregated = aggregate(&raw);
        assert!(aggregated.features.is_empty());
        assert!(!aggregated.success);
    }

    #[test]
    fn opaque_suite_skips_aggregation_entirely() {
        let mut raw = raw_with_iterations(vec![feature_map(1.0)]);
        raw.benchmark_suite = SuiteKind::Opaque("unknown-future-suite".to_string());
        let aggregated = aggregate(&raw);
        assert!(aggregated.features.is_empty());
        assert!(aggregated.derived.is_empty());
    }

    #[test]
    fn mean_and_stddev_match_hand_computed_values_across_three_iterations() {
        let raw = raw_with_iterations(vec![
            feature_map(12000.0),
            feature_map(13000.0),
            feature_map(14000.0),
        ]);
        let aggregated = aggregate(&raw);
        let triad = &aggregated.features["triad"];
        assert_eq!(triad.count, 3);
        assert_eq!(triad.mean, Some(13000.0));
        // sample stddev of [12000, 13000, 14000] is 1000.0 exactly
        assert_eq!(triad.stddev, Some(1000.0));
        assert_eq!(triad.min, Some(12000.0));
        assert_eq!(triad.max, Some(14000.0));
    }
}
