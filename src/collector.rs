//! Collector: scans an object store for every job under a prefix,
//! classifies each by its sentinel set, and produces a [`CollectorSnapshot`]
//! (spec §4.6).
//!
//! Side-effect-free and idempotent: it only ever calls `object_list` /
//! `object_get`, never `object_put`. Grounded on
//! `Orchestrator::aggregate_results`'s "fold many things into one summary"
//! shape, generalized from folding benchmark results to folding job
//! classifications. Per-job fetches run concurrently via
//! `futures::future::join_all`, mirroring the teacher's dependency on
//! `futures` for fan-out.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;

use crate::aggregate::aggregate;
use crate::cloud::CloudAdapter;
use crate::model::{
    CollectorSnapshot, FleetSummary, JobClass, JobRecord, JobSummary, RawResultObject, Sentinel,
    SentinelState,
};

pub struct Collector {
    adapter: Arc<dyn CloudAdapter>,
    bucket: String,
}

impl Collector {
    pub fn new(adapter: Arc<dyn CloudAdapter>, bucket: impl Into<String>) -> Self {
        Self {
            adapter,
            bucket: bucket.into(),
        }
    }

    /// Scan `benchmarks/` under the configured bucket and classify every
    /// job found. May be called any number of times; each call observes
    /// the authoritative current state (spec §4.6).
    pub async fn collect(&self) -> Result<CollectorSnapshot, crate::errors::OrchestratorError> {
        let keys = self.adapter.object_list(&self.bucket, "benchmarks/").await?;
        let prefixes = group_by_job_prefix(&keys);

        let summaries = join_all(
            prefixes
                .into_iter()
                .map(|prefix| self.classify_job(prefix)),
        )
        .await;

        let mut snapshot = CollectorSnapshot {
            completed: Vec::new(),
            failed: Vec::new(),
            in_progress: Vec::new(),
            timed_out: Vec::new(),
            summary: FleetSummary {
                total_jobs: 0,
                success_rate: 0.0,
                total_estimated_cost: 0.0,
            },
        };

        for summary in summaries.into_iter().flatten() {
            snapshot.summary.total_estimated_cost += summary.estimated_cost_ceiling.unwrap_or(0.0);
            match summary.class {
                JobClass::Completed => snapshot.completed.push(summary),
                JobClass::Failed => snapshot.failed.push(summary),
                JobClass::InProgress => snapshot.in_progress.push(summary),
                JobClass::TimedOut => snapshot.timed_out.push(summary),
            }
        }

        snapshot.summary.total_jobs = snapshot.completed.len()
            + snapshot.failed.len()
            + snapshot.in_progress.len()
            + snapshot.timed_out.len();
        let terminal = snapshot.completed.len() + snapshot.failed.len() + snapshot.timed_out.len();
        snapshot.summary.success_rate = if terminal == 0 {
            0.0
        } else {
            snapshot.completed.len() as f64 / terminal as f64
        };

        Ok(snapshot)
    }

    async fn classify_job(&self, prefix: String) -> Option<JobSummary> {
        let metadata_bytes = self
            .adapter
            .object_get(&self.bucket, &format!("{prefix}job-metadata.json"))
            .await
            .ok()?;
        let record: JobRecord = serde_json::from_slice(&metadata_bytes).ok()?;

        let sentinels = self.present_sentinels(&prefix).await;
        let class = classify(&sentinels, &record);

        let aggregated = if class == JobClass::Completed {
            self.adapter
                .object_get(&self.bucket, &format!("{prefix}results.json"))
                .await
                .ok()
                .and_then(|bytes| serde_json::from_slice::<RawResultObject>(&bytes).ok())
                .map(|raw| aggregate(&raw))
        } else {
            None
        };

        let error_excerpt = if class == JobClass::Failed {
            self.adapter
                .object_get(&self.bucket, &format!("{prefix}benchmark.log"))
                .await
                .ok()
                .map(|bytes| {
                    let text = String::from_utf8_lossy(&bytes);
                    text.lines().rev().take(5).collect::<Vec<_>>().join("\n")
                })
        } else {
            None
        };

        Some(JobSummary {
            job_id: record.job_id,
            prefix,
            class,
            sentinels,
            estimated_cost_ceiling: record.estimated_cost_ceiling,
            aggregated,
            error_excerpt,
        })
    }

    async fn present_sentinels(&self, prefix: &str) -> Vec<SentinelState> {
        use SentinelState::*;
        let mut present = Vec::new();
        for state in [Launched, Running, Completed, Failed, TimedOut, EmergencyStop] {
            let key = format!("{prefix}{}", state.file_name());
            if self.adapter.object_get(&self.bucket, &key).await.is_ok() {
                present.push(state);
            }
        }
        present
    }
}

/// Classify a job from its present sentinels and record, per the decision
/// table in spec §4.6.
fn classify(sentinels: &[SentinelState], record: &JobRecord) -> JobClass {
    let has = |s: SentinelState| sentinels.contains(&s);

    if has(SentinelState::Completed) {
        return JobClass::Completed;
    }
    if has(SentinelState::Failed) || has(SentinelState::EmergencyStop) {
        return JobClass::Failed;
    }
    if has(SentinelState::TimedOut) {
        return JobClass::TimedOut;
    }

    // Only LAUNCHED/RUNNING present (or nothing at all). Past max-runtime,
    // the node failed to publish a terminal sentinel at all — classify as
    // TimedOut even without the sentinel (spec §4.6, §8 boundary case).
    let deadline = record.descriptor.failsafe_deadline();
    let elapsed = (Utc::now() - record.launch_timestamp)
        .to_std()
        .unwrap_or(Duration::ZERO);
    if elapsed > deadline {
        JobClass::TimedOut
    } else {
        JobClass::InProgress
    }
}

/// Group a flat key listing by job prefix (`benchmarks/<job-id>/<shape>/<suite>/`).
fn group_by_job_prefix(keys: &[String]) -> Vec<String> {
    let mut prefixes: BTreeMap<String, ()> = BTreeMap::new();
    for key in keys {
        if let Some(idx) = key.rfind('/') {
            prefixes.insert(key[..=idx].to_string(), ());
        }
    }
    prefixes.into_keys().collect()
}
