//! Guarded lazy construction of the process-wide pipeline handle

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::inference::{Device, PipelineBackend, PipelineHandle};
use crate::storage::{HubCache, ModelRef};

/// Owns the one pipeline a worker process ever loads.
///
/// The first call validates the environment (an accelerator must be present),
/// resolves the snapshot, and constructs the handle; every later call returns
/// the cached handle with no re-validation. The lock is held across the whole
/// first-load path, so concurrent first calls cannot double-build or observe
/// a half-initialized handle.
pub struct PipelineLoader {
    model: ModelRef,
    cache: HubCache,
    local_files_only: bool,
    backend: Box<dyn PipelineBackend>,
    probe: fn() -> Option<Device>,
    handle: Mutex<Option<Arc<PipelineHandle>>>,
}

impl PipelineLoader {
    pub fn new(
        model: ModelRef,
        cache: HubCache,
        local_files_only: bool,
        backend: Box<dyn PipelineBackend>,
    ) -> Self {
        Self {
            model,
            cache,
            local_files_only,
            backend,
            probe: Device::detect,
            handle: Mutex::new(None),
        }
    }

    /// Replace the accelerator probe. Intended for tests that drive the full
    /// worker path on hosts without a GPU.
    pub fn with_probe(mut self, probe: fn() -> Option<Device>) -> Self {
        self.probe = probe;
        self
    }

    /// Return the loaded pipeline, constructing it on first call.
    pub async fn get_or_load(&self) -> Result<Arc<PipelineHandle>> {
        let mut slot = self.handle.lock().await;
        if let Some(handle) = slot.as_ref() {
            debug!(model = %self.model, "pipeline already loaded");
            return Ok(Arc::clone(handle));
        }

        let device = (self.probe)().ok_or(Error::DeviceNotAvailable)?;
        let snapshot = self.cache.resolve_snapshot(&self.model)?;
        info!(model = %self.model, snapshot = %snapshot.display(), %device, "loading pipeline");
        let pipeline = self
            .backend
            .load(&snapshot, device, self.local_files_only)
            .await?;

        let handle = Arc::new(PipelineHandle::new(
            self.model.clone(),
            snapshot,
            device,
            pipeline,
        ));
        *slot = Some(Arc::clone(&handle));
        Ok(handle)
    }
}
