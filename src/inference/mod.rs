//! Inference boundary: the pipeline trait, device probe, and loaded handle
//!
//! Nothing in here defines how generation works. The worker core only defines
//! how a pipeline is obtained (one snapshot, one device, once per process)
//! and the capability it exposes to request handling.

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image::RgbImage;

use crate::error::{Error, Result};
use crate::storage::ModelRef;

pub mod loader;
pub mod preview;

/// Accelerated compute device a pipeline is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Cuda,
    Rocm,
}

impl Device {
    /// Probe the host for an accelerator. Returns `None` on CPU-only hosts;
    /// the loader turns that into a fatal, non-retryable error.
    pub fn detect() -> Option<Device> {
        if Path::new("/proc/driver/nvidia/version").exists() || Path::new("/dev/nvidia0").exists()
        {
            return Some(Device::Cuda);
        }
        if Path::new("/dev/kfd").exists() {
            return Some(Device::Rocm);
        }
        None
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cuda => write!(f, "cuda"),
            Device::Rocm => write!(f, "rocm"),
        }
    }
}

/// Single-request text-to-image capability obtained from a loaded pipeline.
#[async_trait]
pub trait TextToImagePipeline: Send + Sync {
    async fn generate(&self, prompt: &str, steps: u32) -> Result<RgbImage>;
}

/// Engine-specific pipeline construction from a resolved snapshot.
#[async_trait]
pub trait PipelineBackend: Send + Sync + fmt::Debug {
    async fn load(
        &self,
        snapshot: &Path,
        device: Device,
        local_files_only: bool,
    ) -> Result<Box<dyn TextToImagePipeline>>;
}

/// Handle to a loaded pipeline, bound to one snapshot and one device.
///
/// Read-only after construction; shared by every subsequent request and
/// reclaimed only at process exit.
pub struct PipelineHandle {
    pub model: ModelRef,
    pub snapshot_path: PathBuf,
    pub device: Device,
    pipeline: Box<dyn TextToImagePipeline>,
}

impl PipelineHandle {
    pub fn new(
        model: ModelRef,
        snapshot_path: PathBuf,
        device: Device,
        pipeline: Box<dyn TextToImagePipeline>,
    ) -> Self {
        Self {
            model,
            snapshot_path,
            device,
            pipeline,
        }
    }

    /// Delegate generation to the underlying engine.
    pub async fn generate(&self, prompt: &str, steps: u32) -> Result<RgbImage> {
        self.pipeline.generate(prompt, steps).await
    }
}

/// Resolve a configured backend name to a linked engine.
pub fn backend_for(name: &str) -> Result<Box<dyn PipelineBackend>> {
    match name {
        "preview" => Ok(Box::new(preview::PreviewBackend)),
        other => Err(Error::UnsupportedBackend {
            name: other.to_string(),
        }),
    }
}
