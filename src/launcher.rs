//! Async Launcher: fire-and-forget per-descriptor job launch (spec §4.4).
//!
//! Grounded directly on `Orchestrator::run_evaluation` in
//! `benchmarks/orchestrator.rs`: a `Semaphore` bounds in-flight launches,
//! one `tokio::spawn` per descriptor acquires a permit before doing any
//! provider I/O, and a per-task failure is logged and folded into the
//! batch result rather than aborting the others.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use tokio_util::sync::CancellationToken;

use crate::cloud::{CloudAdapter, NetworkConfig};
use crate::errors::OrchestratorError;
use crate::model::{job_prefix, JobDescriptor, JobRecord, JobStatus};
use crate::payload::{build_payload, PayloadContext};
use crate::retry::with_retry;

/// One descriptor's outcome: either a launched [`JobRecord`] or the error
/// that stopped it (spec §4.4: "partial success is reported, surviving
/// jobs are returned with their handles").
#[derive(Debug)]
pub enum LaunchOutcome {
    Launched(JobRecord),
    Failed { descriptor: JobDescriptor, message: String },
}

/// Aggregated response for a batch (spec §7: `LaunchedCount`, `FailedCount`,
/// `Errors`).
#[derive(Debug, Default)]
pub struct BatchResult {
    pub launched: Vec<JobRecord>,
    pub errors: Vec<String>,
}

impl BatchResult {
    pub fn launched_count(&self) -> usize {
        self.launched.len()
    }

    pub fn failed_count(&self) -> usize {
        self.errors.len()
    }
}

pub struct Launcher {
    adapter: Arc<dyn CloudAdapter>,
    bucket: String,
    max_concurrent_launches: usize,
    retry_attempts: u32,
    cancel_token: CancellationToken,
}

impl Launcher {
    pub fn new(adapter: Arc<dyn CloudAdapter>, bucket: impl Into<String>, max_concurrent_launches: usize) -> Self {
        Self {
            adapter,
            bucket: bucket.into(),
            max_concurrent_launches: max_concurrent_launches.max(1),
            retry_attempts: 3,
            cancel_token: CancellationToken::new(),
        }
    }

    /// A handle to this launcher's cancellation token. Cancelling it aborts
    /// every launch still waiting on a semaphore permit or about to start
    /// provider I/O; launches already past that point run to completion
    /// (spec §5: "cancellation aborts pending launches but does not reach
    /// already-provisioned instances").
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Launch every descriptor in `batch`, up to `max_concurrent_launches`
    /// at a time. Never aborts on a single descriptor's failure; always
    /// returns a full [`BatchResult`] (spec §4.4, §7).
    pub async fn launch_batch(&self, batch: Vec<JobDescriptor>) -> BatchResult {
        let semaphore = Arc::new(tokio::sync::Semaphore::new(self.max_concurrent_launches));
        let mut handles = Vec::with_capacity(batch.len());

        for descriptor in batch {
            let semaphore = semaphore.clone();
            let adapter = self.adapter.clone();
            let bucket = self.bucket.clone();
            let retry_attempts = self.retry_attempts;
            let cancel_token = self.cancel_token.clone();

            handles.push(tokio::spawn(async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .expect("semaphore is never closed while launches are outstanding");

                if cancel_token.is_cancelled() {
                    tracing::info!(shape = %descriptor.instance_shape, "launch cancelled before provisioning");
                    return LaunchOutcome::Failed {
                        descriptor,
                        message: "launch cancelled before provisioning".to_string(),
                    };
                }

                launch_one(adapter, bucket, descriptor, retry_attempts).await
            }));
        }

        let mut result = BatchResult::default();
        for handle in handles {
            match handle.await {
                Ok(LaunchOutcome::Launched(record)) => result.launched.push(record),
                Ok(LaunchOutcome::Failed { descriptor, message }) => {
                    tracing::error!(shape = %descriptor.instance_shape, error = %message, "descriptor failed to launch");
                    result.errors.push(message);
                }
                Err(join_err) => {
                    tracing::error!(error = %join_err, "launch task panicked");
                    result.errors.push(format!("launch task panicked: {join_err}"));
                }
            }
        }
        result
    }
}

async fn launch_one(
    adapter: Arc<dyn CloudAdapter>,
    bucket: String,
    descriptor: JobDescriptor,
    retry_attempts: u32,
) -> LaunchOutcome {
    let job_id = mint_job_id();
    let prefix = job_prefix(&job_id, &descriptor.instance_shape, &descriptor.benchmark_suite);

    let estimated_cost_ceiling = adapter
        .price_estimate(&descriptor.instance_shape, descriptor.failsafe_deadline())
        .await
        .ok();

    let mut record = JobRecord {
        job_id: job_id.clone(),
        descriptor: descriptor.clone(),
        bucket: bucket.clone(),
        prefix: prefix.clone(),
        instance_handle: None,
        status: JobStatus::Launching,
        launch_timestamp: Utc::now(),
        estimated_cost_ceiling,
    };

    if let Err(err) = put_metadata(&adapter, &record, retry_attempts).await {
        return LaunchOutcome::Failed {
            descriptor,
            message: format!("job {job_id}: failed to write initial metadata: {err}"),
        };
    }

    let image = match with_retry(retry_attempts, || adapter.resolve_image(&descriptor.instance_shape)).await {
        Ok(image) => image,
        Err(err) => {
            return LaunchOutcome::Failed {
                descriptor,
                message: format!("job {job_id}: image resolution failed: {err}"),
            }
        }
    };

    let ctx = PayloadContext {
        job_id: job_id.clone(),
        bucket: bucket.clone(),
        descriptor: descriptor.clone(),
    };
    let user_data = build_payload(&ctx);

    let network = NetworkConfig {
        security_group: descriptor.security_group.clone(),
        subnet: descriptor.subnet.clone(),
        key_id: descriptor.key_id.clone(),
    };
    let mut tags = BTreeMap::new();
    tags.insert("BenchmarkID".to_string(), job_id.clone());
    tags.insert("Shape".to_string(), descriptor.instance_shape.clone());
    tags.insert("Suite".to_string(), descriptor.benchmark_suite.slug());
    tags.insert("AutoTerminate".to_string(), "true".to_string());

    let instance_handle = match with_retry(retry_attempts, || {
        adapter.launch_instance(&descriptor.instance_shape, &image, &network, &tags, &user_data)
    })
    .await
    {
        Ok(handle) => handle,
        Err(err) => {
            return LaunchOutcome::Failed {
                descriptor,
                message: format!("job {job_id}: launch_instance failed: {err}"),
            }
        }
    };

    record.instance_handle = Some(instance_handle);
    record.status = JobStatus::Launched;

    if let Err(err) = put_metadata(&adapter, &record, retry_attempts).await {
        return LaunchOutcome::Failed {
            descriptor,
            message: format!("job {job_id}: failed to update metadata post-launch: {err}"),
        };
    }

    let sentinel = crate::model::Sentinel::new(crate::model::SentinelState::Launched, Utc::now());
    let sentinel_key = format!("{prefix}{}", crate::model::SentinelState::Launched.file_name());
    let _ = with_retry(retry_attempts, || {
        let body = sentinel.to_body().into_bytes();
        let key = sentinel_key.clone();
        let adapter = adapter.clone();
        let bucket = bucket.clone();
        async move {
            adapter
                .object_put(&bucket, &key, body, "text/plain")
                .await
        }
    })
    .await;

    LaunchOutcome::Launched(record)
}

async fn put_metadata(
    adapter: &Arc<dyn CloudAdapter>,
    record: &JobRecord,
    retry_attempts: u32,
) -> Result<(), OrchestratorError> {
    let body = serde_json::to_vec(record)?;
    let key = record.metadata_key();
    with_retry(retry_attempts, || {
        let adapter = adapter.clone();
        let bucket = record.bucket.clone();
        let key = key.clone();
        let body = body.clone();
        async move { adapter.object_put(&bucket, &key, body, "application/json").await }
    })
    .await
}

fn mint_job_id() -> String {
    let timestamp = Utc::now().format("%Y%m%d-%H%M%S");
    let suffix: String = {
        let mut rng = rand::rng();
        (0..8).map(|_| std::char::from_digit(rng.random_range(0..16), 16).unwrap()).collect()
    };
    format!("bench-{timestamp}-{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::memory::InMemoryCloudAdapter;
    use crate::suites::SuiteKind;
    use std::time::Duration;

    fn descriptor(shape: &str) -> JobDescriptor {
        JobDescriptor {
            instance_shape: shape.to_string(),
            benchmark_suite: SuiteKind::Stream,
            region: "us-east-1".to_string(),
            security_group: "sg-1".to_string(),
            subnet: "subnet-1".to_string(),
            key_id: None,
            max_runtime: Duration::from_secs(900),
            retry_budget: 3,
            iteration_count: 3,
        }
    }

    #[test]
    fn job_id_matches_the_documented_format() {
        let id = mint_job_id();
        assert!(id.starts_with("bench-"));
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[3].len(), 8);
        assert!(parts[3].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn a_single_descriptor_launches_successfully() {
        let adapter = InMemoryCloudAdapter::new();
        let launcher = Launcher::new(adapter, "test-bucket", 5);
        let result = launcher.launch_batch(vec![descriptor("c7g.large")]).await;
        assert_eq!(result.launched_count(), 1);
        assert_eq!(result.failed_count(), 0);
        assert!(result.launched[0].instance_handle.is_some());
    }

    #[tokio::test]
    async fn a_batch_launches_concurrently_up_to_the_fan_out_ceiling() {
        let adapter = InMemoryCloudAdapter::new();
        let launcher = Launcher::new(adapter, "test-bucket", 2);
        let batch: Vec<_> = ["c7g.large", "c7a.large", "c7i.large", "c5.large"]
            .iter()
            .map(|s| descriptor(s))
            .collect();
        let result = launcher.launch_batch(batch).await;
        assert_eq!(result.launched_count(), 4);
        assert_eq!(result.failed_count(), 0);
    }

    #[tokio::test]
    async fn launched_jobs_carry_distinct_job_ids() {
        let adapter = InMemoryCloudAdapter::new();
        let launcher = Launcher::new(adapter, "test-bucket", 5);
        let batch = vec![descriptor("c7g.large"), descriptor("c7g.large")];
        let result = launcher.launch_batch(batch).await;
        assert_eq!(result.launched_count(), 2);
        assert_ne!(result.launched[0].job_id, result.launched[1].job_id);
    }

    #[tokio::test]
    async fn cancelling_before_launch_aborts_every_pending_descriptor() {
        let adapter = InMemoryCloudAdapter::new();
        let launcher = Launcher::new(adapter, "test-bucket", 5);
        launcher.cancel_token().cancel();

        let batch = vec![descriptor("c7g.large"), descriptor("c7a.large")];
        let result = launcher.launch_batch(batch).await;

        assert_eq!(result.launched_count(), 0);
        assert_eq!(result.failed_count(), 2);
        assert!(result.errors.iter().all(|e| e.contains("cancelled")));
    }
}
