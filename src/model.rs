//! Wire-format data model shared by every component.
//!
//! Every type here round-trips through `serde_json` exactly as it is written
//! to, or read from, the object store. See the module-level docs on
//! [`crate::cloud`] for the bucket/key layout these types live at.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::suites::SuiteKind;

/// Input to the [`crate::launcher::Launcher`]. Immutable after submission.
///
/// # Examples
///
/// ```
/// use fleetbench::model::JobDescriptor;
/// use fleetbench::suites::SuiteKind;
/// use std::time::Duration;
///
/// let descriptor = JobDescriptor {
///     instance_shape: "c7g.large".to_string(),
///     benchmark_suite: SuiteKind::Stream,
///     region: "us-east-1".to_string(),
///     security_group: "sg-0123".to_string(),
///     subnet: "subnet-0123".to_string(),
///     key_id: None,
///     max_runtime: Duration::from_secs(900),
///     retry_budget: 3,
///     iteration_count: 3,
/// };
/// assert_eq!(descriptor.iteration_count, 3);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobDescriptor {
    /// Opaque provider instance shape, e.g. `c7g.large`.
    pub instance_shape: String,
    /// Which benchmark suite to run.
    pub benchmark_suite: SuiteKind,
    /// Provider region to launch in.
    pub region: String,
    /// Security group identifier.
    pub security_group: String,
    /// Subnet identifier.
    pub subnet: String,
    /// Optional SSH/login key identifier.
    #[serde(default)]
    pub key_id: Option<String>,
    /// Maximum wall-clock runtime before the graceful timer fires.
    #[serde(with = "humantime_serde")]
    pub max_runtime: Duration,
    /// Number of retries allowed for transient launch failures.
    #[serde(default = "default_retry_budget")]
    pub retry_budget: u32,
    /// Number of benchmark iterations the node should run.
    #[serde(default = "default_iteration_count")]
    pub iteration_count: u32,
}

fn default_retry_budget() -> u32 {
    3
}

fn default_iteration_count() -> u32 {
    3
}

/// Additional buffer added to `max_runtime` before the failsafe ladder's
/// emergency stage fires. See spec §4.2.
pub const FAILSAFE_BUFFER: Duration = Duration::from_secs(3600);

impl JobDescriptor {
    /// The absolute deadline past which an instance must never still be
    /// running, per the "no instance leak" invariant.
    pub fn failsafe_deadline(&self) -> Duration {
        self.max_runtime + FAILSAFE_BUFFER
    }
}

/// Current lifecycle status of a job, as tracked in the [`JobRecord`].
///
/// This is a convenience snapshot written by the launcher; the sentinel set
/// in the object store remains the authoritative status (spec §3).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Launching,
    Launched,
}

/// Persisted per-job metadata document (`job-metadata.json`).
///
/// Exclusively owned and written by the [`crate::launcher::Launcher`]:
/// created once at launch, updated at most twice (instance handle, then
/// optionally a terminal status note). Never mutated by the node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobRecord {
    /// Globally unique job ID: `bench-YYYYMMDD-HHMMSS-<8hex>`.
    pub job_id: String,
    /// Snapshot of the descriptor that produced this job.
    pub descriptor: JobDescriptor,
    /// Object-store bucket this job's objects live in.
    pub bucket: String,
    /// Key prefix under which every object for this job is written.
    pub prefix: String,
    /// Provider instance handle, populated after `launch_instance` succeeds.
    pub instance_handle: Option<String>,
    /// Launcher-side status snapshot.
    pub status: JobStatus,
    /// When the launcher created this record.
    pub launch_timestamp: DateTime<Utc>,
    /// Best-effort cost ceiling from [`crate::cloud::CloudAdapter::price_estimate`].
    /// Never recomputed after launch; spot/reserved pricing fields are
    /// carried through opaquely and not populated by the execution path.
    pub estimated_cost_ceiling: Option<f64>,
}

impl JobRecord {
    /// The key this record is written at: `<prefix>job-metadata.json`.
    pub fn metadata_key(&self) -> String {
        format!("{}job-metadata.json", self.prefix)
    }
}

/// Build the canonical key prefix for a job: `benchmarks/<job-id>/<shape>/<suite>/`.
pub fn job_prefix(job_id: &str, shape: &str, suite: &SuiteKind) -> String {
    format!("benchmarks/{job_id}/{shape}/{}/", suite.slug())
}

/// The state a [`Sentinel`] announces. Append-only: later states supersede
/// earlier ones, and the full set present at a prefix is the authoritative
/// status of a job (spec §3).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SentinelState {
    Launched,
    Running,
    Completed,
    Failed,
    TimedOut,
    EmergencyStop,
}

impl SentinelState {
    /// Whether this state is terminal (the job will never progress further).
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SentinelState::Completed
                | SentinelState::Failed
                | SentinelState::TimedOut
                | SentinelState::EmergencyStop
        )
    }

    /// The object key suffix this sentinel is written under, e.g.
    /// `status-completed.sentinel`.
    pub fn file_name(self) -> &'static str {
        match self {
            SentinelState::Launched => "status-launched.sentinel",
            SentinelState::Running => "status-running.sentinel",
            SentinelState::Completed => "status-completed.sentinel",
            SentinelState::Failed => "status-failed.sentinel",
            SentinelState::TimedOut => "status-timed_out.sentinel",
            SentinelState::EmergencyStop => "status-emergency_stop.sentinel",
        }
    }

    fn wire_name(self) -> &'static str {
        match self {
            SentinelState::Launched => "LAUNCHED",
            SentinelState::Running => "RUNNING",
            SentinelState::Completed => "COMPLETED",
            SentinelState::Failed => "FAILED",
            SentinelState::TimedOut => "TIMED_OUT",
            SentinelState::EmergencyStop => "EMERGENCY_STOP",
        }
    }
}

/// A sentinel object: presence is authoritative, body is advisory (spec §3).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sentinel {
    pub state: SentinelState,
    pub timestamp: DateTime<Utc>,
}

impl Sentinel {
    pub fn new(state: SentinelState, timestamp: DateTime<Utc>) -> Self {
        Self { state, timestamp }
    }

    /// Render the advisory body: `<ISO-8601 timestamp>: <STATE_NAME>`.
    pub fn to_body(self) -> String {
        format!("{}: {}", self.timestamp.to_rfc3339(), self.state.wire_name())
    }

    /// Parse a sentinel body. Tolerant of a missing/garbled timestamp since
    /// presence of the key, not the body, is authoritative.
    pub fn from_body(state: SentinelState, body: &str) -> Self {
        let timestamp = body
            .split_once(':')
            .and_then(|(ts, _)| DateTime::parse_from_rfc3339(ts.trim()).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);
        Self { state, timestamp }
    }
}

/// Optional, overwrite-at-will progress object (`status-progress.json`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgressObject {
    pub current_iteration: u32,
    pub total_iterations: u32,
    pub last_update: DateTime<Utc>,
    #[serde(default)]
    pub message: String,
    pub percent_complete: f64,
}

/// Captured once at node start (`system-info.json`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SystemInfoObject {
    pub instance_handle: String,
    pub shape: String,
    pub placement: String,
    pub cpu_model: String,
    pub memory_bytes: u64,
    pub arch_family: crate::arch::ArchFamily,
    pub kernel_version: String,
    pub timestamp: DateTime<Utc>,
}

/// A single iteration's extracted numeric feature map. `None` records a
/// field a parser could not find, without failing the whole iteration
/// (spec §4.7).
pub type FeatureMap = BTreeMap<String, Option<f64>>;

/// Raw, per-iteration measurements uploaded once by the node before the
/// terminal sentinel (`results.json`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawResultObject {
    pub benchmark_suite: SuiteKind,
    /// One feature map per iteration the node ran. Empty for an opaque
    /// suite, or if the benchmark produced zero iterations.
    #[serde(default)]
    pub iterations: Vec<FeatureMap>,
    /// Bounded, base64-encoded raw stdout, kept for suites whose parser
    /// found nothing structured to extract.
    #[serde(default)]
    pub raw_output: Option<String>,
    pub success: bool,
    pub exit_code: i32,
    #[serde(with = "humantime_serde")]
    pub duration: Duration,
    pub timestamp: DateTime<Utc>,
}

impl RawResultObject {
    /// Whether this suite's stdout was unparseable and only raw output was
    /// captured (spec §4.5, §9 "opaque-stdout fallback").
    pub fn is_opaque(&self) -> bool {
        self.iterations.is_empty() && self.raw_output.is_some()
    }
}

/// Per-feature summary statistics produced by the aggregator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FeatureStats {
    pub count: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation; `None` when `count < 2` (spec §4.7).
    pub stddev: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// In-memory statistical summary folded from a [`RawResultObject`]'s
/// iterations by [`crate::aggregate`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AggregatedResultRecord {
    pub suite: SuiteKind,
    pub features: BTreeMap<String, FeatureStats>,
    /// Suite-specific derived ratios (see spec §4.5), computed from
    /// `features` and never across suites.
    pub derived: BTreeMap<String, f64>,
    /// True unless the raw result was empty / success was false with no
    /// extractable features.
    pub success: bool,
}

/// One job's classification as produced by the [`crate::collector::Collector`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobClass {
    Completed,
    Failed,
    InProgress,
    TimedOut,
}

/// A single job's collector-facing summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobSummary {
    pub job_id: String,
    pub prefix: String,
    pub class: JobClass,
    pub sentinels: Vec<SentinelState>,
    pub estimated_cost_ceiling: Option<f64>,
    /// Populated only for `Completed` jobs.
    pub aggregated: Option<AggregatedResultRecord>,
    /// Populated only for `Failed` jobs where a log could be read.
    pub error_excerpt: Option<String>,
}

/// Fleet-wide counts produced alongside the per-class job lists.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FleetSummary {
    pub total_jobs: usize,
    /// `Completed / (Completed + Failed + TimedOut)`, `0.0` if that
    /// denominator is zero.
    pub success_rate: f64,
    pub total_estimated_cost: f64,
}

/// The full classification of every job found under a bucket prefix.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollectorSnapshot {
    pub completed: Vec<JobSummary>,
    pub failed: Vec<JobSummary>,
    pub in_progress: Vec<JobSummary>,
    pub timed_out: Vec<JobSummary>,
    pub summary: FleetSummary,
}
