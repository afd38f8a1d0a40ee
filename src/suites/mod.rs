//! Benchmark suite registry.
//!
//! A suite is a triple of (stdout parser, derived-metric function, name),
//! generalized from the teacher's `BenchmarkExecutor` trait (`benchmarks/mod.rs`):
//! where the teacher's trait runs a task and returns a `TaskResult`, this
//! trait consumes a finished node's stdout and returns a [`FeatureMap`]. The
//! registry itself is a closed enum dispatch per spec §9 "Suite
//! extensibility" — new suites are added as variants, not via dynamic
//! plugin loading.

pub mod cache;
pub mod compilation;
pub mod dgemm;
pub mod fftw;
pub mod hpl;
pub mod mixed_precision;
pub mod opaque;
pub mod sevenzip;
pub mod stream;
pub mod sysbench;
pub mod vector_ops;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{FeatureMap, FeatureStats};

/// The closed set of benchmark suites the registry knows about, plus an
/// `Opaque` escape hatch for anything unrecognized (spec §4.5, §9).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SuiteKind {
    Stream,
    Hpl,
    Dgemm,
    SevenZip,
    Sysbench,
    Cache,
    Fftw,
    VectorOps,
    MixedPrecision,
    Compilation,
    /// A suite name the registry does not recognize; stdout is captured
    /// verbatim (base64) and no aggregation is attempted.
    Opaque(String),
}

impl SuiteKind {
    /// The wire/slug name used in `benchmark_suite` fields and object-store
    /// key prefixes.
    pub fn slug(&self) -> String {
        match self {
            SuiteKind::Stream => "stream".to_string(),
            SuiteKind::Hpl => "hpl".to_string(),
            SuiteKind::Dgemm => "dgemm".to_string(),
            SuiteKind::SevenZip => "7zip".to_string(),
            SuiteKind::Sysbench => "sysbench".to_string(),
            SuiteKind::Cache => "cache".to_string(),
            SuiteKind::Fftw => "fftw".to_string(),
            SuiteKind::VectorOps => "vector_ops".to_string(),
            SuiteKind::MixedPrecision => "mixed_precision".to_string(),
            SuiteKind::Compilation => "compilation".to_string(),
            SuiteKind::Opaque(name) => name.clone(),
        }
    }

    pub fn from_slug(slug: &str) -> Self {
        match slug {
            "stream" => SuiteKind::Stream,
            "hpl" => SuiteKind::Hpl,
            "dgemm" => SuiteKind::Dgemm,
            "7zip" => SuiteKind::SevenZip,
            "sysbench" => SuiteKind::Sysbench,
            "cache" => SuiteKind::Cache,
            "fftw" => SuiteKind::Fftw,
            "vector_ops" => SuiteKind::VectorOps,
            "mixed_precision" => SuiteKind::MixedPrecision,
            "compilation" => SuiteKind::Compilation,
            other => SuiteKind::Opaque(other.to_string()),
        }
    }

    /// Whether this suite participates in statistical aggregation, or is
    /// captured raw with aggregation skipped (spec §4.5, §9).
    pub fn is_opaque(&self) -> bool {
        matches!(self, SuiteKind::Opaque(_))
    }

    /// Suite-level default minimum iteration count (spec §4.7), overridable
    /// per descriptor.
    pub fn default_min_iterations(&self) -> u32 {
        3
    }
}

impl Serialize for SuiteKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.slug())
    }
}

impl<'de> Deserialize<'de> for SuiteKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let slug = String::deserialize(deserializer)?;
        Ok(SuiteKind::from_slug(&slug))
    }
}

/// A benchmark suite's stdout parser and derived-metrics contract.
///
/// # Thread Safety
///
/// Implementations are stateless and `Send + Sync`; a single instance is
/// shared across every job the collector folds.
pub trait Suite: Send + Sync {
    fn name(&self) -> &'static str;

    /// Scan `stdout` for this suite's labeled numeric fields. Never fails:
    /// a field that cannot be found is simply absent from the map (spec
    /// §4.7 — "a parser never fails the whole benchmark on a missing
    /// field").
    fn parse(&self, stdout: &str) -> FeatureMap;

    /// Compute this suite's derived ratios (spec §4.5) from already-computed
    /// per-feature statistics. Derived fields may reference other derived
    /// fields computed earlier in the same call, never fields from another
    /// suite.
    fn derive(&self, stats: &BTreeMap<String, FeatureStats>) -> BTreeMap<String, f64>;
}

/// Look up the registered [`Suite`] implementation for a [`SuiteKind`].
/// Returns `None` for [`SuiteKind::Opaque`], which has no parser by
/// definition.
pub fn registry(kind: &SuiteKind) -> Option<&'static dyn Suite> {
    match kind {
        SuiteKind::Stream => Some(&stream::Stream),
        SuiteKind::Hpl => Some(&hpl::Hpl),
        SuiteKind::Dgemm => Some(&dgemm::Dgemm),
        SuiteKind::SevenZip => Some(&sevenzip::SevenZip),
        SuiteKind::Sysbench => Some(&sysbench::Sysbench),
        SuiteKind::Cache => Some(&cache::Cache),
        SuiteKind::Fftw => Some(&fftw::Fftw),
        SuiteKind::VectorOps => Some(&vector_ops::VectorOps),
        SuiteKind::MixedPrecision => Some(&mixed_precision::MixedPrecision),
        SuiteKind::Compilation => Some(&compilation::Compilation),
        SuiteKind::Opaque(_) => None,
    }
}

/// Shared helper: find the first occurrence of `label` in `stdout` and
/// parse the next whitespace-delimited numeric token as an `f64`. Every
/// suite parser in this registry is line-oriented and built on this
/// primitive (spec §4.7: "scan for labeled numeric fields").
pub(crate) fn extract_first_number(stdout: &str, label: &str) -> Option<f64> {
    for line in stdout.lines() {
        if let Some(pos) = line.find(label) {
            let rest = &line[pos + label.len()..];
            for token in rest.split(|c: char| c.is_whitespace() || c == ':') {
                if token.is_empty() {
                    continue;
                }
                let cleaned: String = token
                    .chars()
                    .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                    .collect();
                if cleaned.is_empty() {
                    continue;
                }
                if let Ok(value) = cleaned.parse::<f64>() {
                    return Some(value);
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_round_trips_through_from_slug() {
        let kinds = [
            SuiteKind::Stream,
            SuiteKind::Hpl,
            SuiteKind::Dgemm,
            SuiteKind::SevenZip,
            SuiteKind::Sysbench,
            SuiteKind::Cache,
            SuiteKind::Fftw,
            SuiteKind::VectorOps,
            SuiteKind::MixedPrecision,
            SuiteKind::Compilation,
        ];
        for kind in kinds {
            assert_eq!(SuiteKind::from_slug(&kind.slug()), kind);
        }
    }

    #[test]
    fn unrecognized_slug_becomes_opaque() {
        let kind = SuiteKind::from_slug("some-future-suite");
        assert!(kind.is_opaque());
        assert_eq!(kind.slug(), "some-future-suite");
    }

    #[test]
    fn registry_has_no_entry_for_opaque_suites() {
        assert!(registry(&SuiteKind::Opaque("mystery".to_string())).is_none());
        assert!(registry(&SuiteKind::Stream).is_some());
    }

    #[test]
    fn extract_first_number_finds_a_labeled_value() {
        let stdout = "Some preamble\nPeak FP16: 118.79 GFLOPS\nTrailer";
        assert_eq!(extract_first_number(stdout, "Peak FP16:"), Some(118.79));
    }

    #[test]
    fn extract_first_number_returns_none_when_label_is_absent() {
        let stdout = "nothing relevant here";
        assert_eq!(extract_first_number(stdout, "Peak FP16:"), None);
    }
}
