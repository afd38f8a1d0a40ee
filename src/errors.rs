//! Domain error taxonomy for the orchestrator.
//!
//! Mirrors the teacher's `llm::errors::LLMError` shape: one enum carrying
//! enough context to format a useful message, plus `is_retryable` /
//! `is_permanent` / `retry_delay` helpers that callers use to decide whether
//! to hand an error to [`crate::retry::with_retry`] or surface it directly.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// A provider call failed in a way that is expected to clear on retry
    /// (throttling, connection reset, 5xx).
    #[error("transient provider error: {0}")]
    Transient(String),

    /// The account or region is out of capacity/quota for the requested
    /// shape. Not retryable with the same parameters.
    #[error("quota exceeded for shape '{shape}': {message}")]
    Quota { shape: String, message: String },

    /// A descriptor, config file, or CLI argument was invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The benchmark process on the node exited non-zero or produced no
    /// usable output.
    #[error("benchmark '{suite}' failed on job {job_id}: {message}")]
    BenchmarkFailure {
        job_id: String,
        suite: String,
        message: String,
    },

    /// A job exceeded its `max_runtime` and the graceful-timeout stage of
    /// the failsafe ladder fired.
    #[error("job {job_id} timed out after {elapsed_secs}s")]
    Timeout { job_id: String, elapsed_secs: u64 },

    /// A job was still running past its `failsafe_deadline`; the emergency
    /// stage of the ladder had to be invoked.
    #[error("job {job_id} exceeded its failsafe deadline and was force-stopped")]
    Runaway { job_id: String },

    /// A suite parser or wire-format decode failed.
    #[error("failed to parse {what}: {source}")]
    Parse {
        what: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl OrchestratorError {
    /// Whether retrying the same call, unmodified, might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            OrchestratorError::Transient(_)
                | OrchestratorError::Network(_)
        )
    }

    /// Whether this error reflects something that will never succeed by
    /// retrying — a misconfiguration or a hard resource limit.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            OrchestratorError::Quota { .. } | OrchestratorError::Configuration(_)
        )
    }

    /// Suggested backoff before the next retry attempt, in milliseconds.
    /// `None` for errors [`Self::is_retryable`] reports `false` for.
    pub fn retry_delay_ms(&self) -> Option<u64> {
        match self {
            OrchestratorError::Transient(_) => Some(500),
            OrchestratorError::Network(_) => Some(1000),
            _ => None,
        }
    }
}
