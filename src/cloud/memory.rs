//! In-memory [`CloudAdapter`] for tests and local CLI use (spec §6: "tests
//! use an in-memory adapter").
//!
//! [`RoleTaggedAdapter`] wraps a shared [`InMemoryCloudAdapter`] and labels
//! every object write with a caller-supplied role string ("launcher",
//! "node", ...), satisfying spec §8's "Single-writer on job path" test
//! requirement without adding a role parameter to the provider-neutral
//! [`CloudAdapter`] trait itself.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{CloudAdapter, ImageHandle, InstanceHandle, NetworkConfig};
use crate::arch::detect_family;
use crate::errors::OrchestratorError;

/// Records who wrote which object, for single-writer-discipline assertions
/// in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRecord {
    pub bucket: String,
    pub key: String,
    pub role: String,
}

#[derive(Default)]
struct State {
    objects: BTreeMap<(String, String), Vec<u8>>,
    instances: BTreeMap<String, bool>,
    writes: Vec<WriteRecord>,
    next_instance_id: u64,
}

/// A local, in-process stand-in for a provider SDK. Launches never touch
/// the network; object storage is a `BTreeMap` guarded by a `tokio::sync::Mutex`
/// (same guarded-shared-state idiom as the teacher's `RateLimiter`).
pub struct InMemoryCloudAdapter {
    state: Mutex<State>,
    /// Flat per-shape hourly rate used by [`CloudAdapter::price_estimate`]'s
    /// fallback table (spec §9).
    default_hourly_rate: f64,
}

impl InMemoryCloudAdapter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(State::default()),
            default_hourly_rate: 0.17,
        })
    }

    pub fn with_default_rate(rate: f64) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(State::default()),
            default_hourly_rate: rate,
        })
    }

    /// Wrap this adapter so every write it performs through the returned
    /// handle is tagged with `role`.
    pub fn as_role(self: &Arc<Self>, role: impl Into<String>) -> RoleTaggedAdapter {
        RoleTaggedAdapter {
            inner: self.clone(),
            role: role.into(),
        }
    }

    pub async fn write_log(&self) -> Vec<WriteRecord> {
        self.state.lock().await.writes.clone()
    }

    pub async fn is_terminated(&self, handle: &InstanceHandle) -> bool {
        self.state
            .lock()
            .await
            .instances
            .get(handle)
            .copied()
            .unwrap_or(false)
    }

    async fn put(&self, bucket: &str, key: &str, body: Vec<u8>, role: &str) {
        let mut state = self.state.lock().await;
        state
            .objects
            .insert((bucket.to_string(), key.to_string()), body);
        state.writes.push(WriteRecord {
            bucket: bucket.to_string(),
            key: key.to_string(),
            role: role.to_string(),
        });
    }
}

#[async_trait]
impl CloudAdapter for InMemoryCloudAdapter {
    async fn resolve_image(&self, shape: &str) -> Result<ImageHandle, OrchestratorError> {
        let family = detect_family(shape);
        Ok(format!("ami-{family:?}").to_lowercase())
    }

    async fn launch_instance(
        &self,
        shape: &str,
        _image: &ImageHandle,
        _network: &NetworkConfig,
        _tags: &BTreeMap<String, String>,
        _user_data: &str,
    ) -> Result<InstanceHandle, OrchestratorError> {
        let mut state = self.state.lock().await;
        state.next_instance_id += 1;
        let handle = format!("i-{:016x}", state.next_instance_id);
        state.instances.insert(handle.clone(), false);
        tracing::debug!(shape, instance = %handle, "launched in-memory instance");
        Ok(handle)
    }

    async fn terminate_instance(&self, handle: &InstanceHandle) -> Result<(), OrchestratorError> {
        let mut state = self.state.lock().await;
        state.instances.insert(handle.clone(), true);
        Ok(())
    }

    async fn object_put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        _content_type: &str,
    ) -> Result<(), OrchestratorError> {
        self.put(bucket, key, body, "unspecified").await;
        Ok(())
    }

    async fn object_get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, OrchestratorError> {
        let state = self.state.lock().await;
        state
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| OrchestratorError::Configuration(format!("no such object: {bucket}/{key}")))
    }

    async fn object_list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, OrchestratorError> {
        let state = self.state.lock().await;
        Ok(state
            .objects
            .keys()
            .filter(|(b, k)| b == bucket && k.starts_with(prefix))
            .map(|(_, k)| k.clone())
            .collect())
    }

    async fn execute_remote(
        &self,
        _handle: &InstanceHandle,
        _command: &str,
    ) -> Result<(String, i32), OrchestratorError> {
        Ok((String::new(), 0))
    }

    async fn price_estimate(&self, _shape: &str, duration: Duration) -> Result<f64, OrchestratorError> {
        Ok(self.default_hourly_rate * (duration.as_secs_f64() / 3600.0))
    }
}

/// A [`CloudAdapter`] view over a shared [`InMemoryCloudAdapter`] that
/// tags every write it performs with a fixed role string.
pub struct RoleTaggedAdapter {
    inner: Arc<InMemoryCloudAdapter>,
    role: String,
}

#[async_trait]
impl CloudAdapter for RoleTaggedAdapter {
    async fn resolve_image(&self, shape: &str) -> Result<ImageHandle, OrchestratorError> {
        self.inner.resolve_image(shape).await
    }

    async fn launch_instance(
        &self,
        shape: &str,
        image: &ImageHandle,
        network: &NetworkConfig,
        tags: &BTreeMap<String, String>,
        user_data: &str,
    ) -> Result<InstanceHandle, OrchestratorError> {
        self.inner
            .launch_instance(shape, image, network, tags, user_data)
            .await
    }

    async fn terminate_instance(&self, handle: &InstanceHandle) -> Result<(), OrchestratorError> {
        self.inner.terminate_instance(handle).await
    }

    async fn object_put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        _content_type: &str,
    ) -> Result<(), OrchestratorError> {
        self.inner.put(bucket, key, body, &self.role).await;
        Ok(())
    }

    async fn object_get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, OrchestratorError> {
        self.inner.object_get(bucket, key).await
    }

    async fn object_list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, OrchestratorError> {
        self.inner.object_list(bucket, prefix).await
    }

    async fn execute_remote(
        &self,
        handle: &InstanceHandle,
        command: &str,
    ) -> Result<(String, i32), OrchestratorError> {
        self.inner.execute_remote(handle, command).await
    }

    async fn price_estimate(&self, shape: &str, duration: Duration) -> Result<f64, OrchestratorError> {
        self.inner.price_estimate(shape, duration).await
    }
}
