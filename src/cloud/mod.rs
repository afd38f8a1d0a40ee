//! Cloud Adapter: the uniform interface over a provider SDK (spec §4.1,
//! §6). The core has no provider-specific types in its signatures — any
//! cloud whose SDK exposes these primitives can back the trait.
//!
//! Generalized from the teacher's `BenchmarkExecutor` trait
//! (`benchmarks/mod.rs`): same `#[async_trait] ... : Send + Sync` shape,
//! same doc-comment density, same idea of "a narrow capability surface a
//! test double can stand in for."

pub mod memory;

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::errors::OrchestratorError;

/// An opaque handle to a provisioned instance. The core never inspects its
/// contents; it is round-tripped back into `terminate_instance`.
pub type InstanceHandle = String;

/// An opaque handle to a resolved base image.
pub type ImageHandle = String;

/// Everything the Launcher, node-side simulation, and Collector need from a
/// cloud provider.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`: the launcher shares one adapter
/// instance across every concurrently-launching task (see
/// [`crate::launcher::Launcher`]).
///
/// # Examples
///
/// ```
/// use fleetbench::cloud::memory::InMemoryCloudAdapter;
///
/// let adapter = InMemoryCloudAdapter::new();
/// ```
#[async_trait]
pub trait CloudAdapter: Send + Sync {
    /// Pick a base image matching the shape's architecture family (spec
    /// §4.1, §4.3). Misclassification here is the named historical bug
    /// class; callers should use [`crate::arch::detect_family`] rather than
    /// re-deriving architecture from the shape string.
    async fn resolve_image(&self, shape: &str) -> Result<ImageHandle, OrchestratorError>;

    /// Provision one instance with the given boot-time payload. The
    /// instance must be tagged with at least `BenchmarkID`, `Shape`,
    /// `Suite`, `AutoTerminate=true` (spec §6 "Identity and tagging").
    async fn launch_instance(
        &self,
        shape: &str,
        image: &ImageHandle,
        network: &NetworkConfig,
        tags: &BTreeMap<String, String>,
        user_data: &str,
    ) -> Result<InstanceHandle, OrchestratorError>;

    /// Idempotent: terminating an already-terminated (or unknown) handle is
    /// not an error.
    async fn terminate_instance(&self, handle: &InstanceHandle) -> Result<(), OrchestratorError>;

    async fn object_put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), OrchestratorError>;

    async fn object_get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, OrchestratorError>;

    async fn object_list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, OrchestratorError>;

    /// Synchronous remote command execution, used only for the non-async
    /// legacy path and diagnostic health probes (spec §4.1) — not part of
    /// the async core's hot path.
    async fn execute_remote(
        &self,
        handle: &InstanceHandle,
        command: &str,
    ) -> Result<(String, i32), OrchestratorError>;

    /// Best-effort cost estimate; callers must tolerate an adapter that
    /// falls back to a static default rate (spec §4.1, §9).
    async fn price_estimate(&self, shape: &str, duration: Duration) -> Result<f64, OrchestratorError>;
}

/// Network placement parameters for `launch_instance` (spec §4.1).
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub security_group: String,
    pub subnet: String,
    pub key_id: Option<String>,
}
