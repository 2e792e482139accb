//! CPU preview backend
//!
//! Renders a deterministic placeholder image for a prompt instead of running
//! a real diffusion sampler. This is the engine used where no
//! accelerator-backed pipeline is linked into the binary: it keeps the whole
//! worker path (snapshot resolution, guarded loading, PNG encoding, the job
//! protocol) exercisable end to end in tests and smoke deployments.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image::{Rgb, RgbImage};
use tracing::{info, warn};

use crate::error::Result;
use crate::inference::{Device, PipelineBackend, TextToImagePipeline};

const PREVIEW_WIDTH: u32 = 512;
const PREVIEW_HEIGHT: u32 = 512;

/// Builds [`PreviewPipeline`]s from a resolved snapshot.
#[derive(Debug, Default)]
pub struct PreviewBackend;

#[async_trait]
impl PipelineBackend for PreviewBackend {
    async fn load(
        &self,
        snapshot: &Path,
        device: Device,
        _local_files_only: bool,
    ) -> Result<Box<dyn TextToImagePipeline>> {
        // This engine never fetches anything, so local_files_only holds
        // trivially; real engines receive and must honor the flag.
        let class = pipeline_class(snapshot).await;
        info!(
            snapshot = %snapshot.display(),
            class = class.as_deref().unwrap_or("unknown"),
            %device,
            "preview pipeline ready"
        );
        Ok(Box::new(PreviewPipeline {
            snapshot: snapshot.to_path_buf(),
        }))
    }
}

/// Pipeline class declared by the snapshot's `model_index.json`, when the
/// file is present and parseable. Placeholder snapshots in tests have no
/// index, so absence is not an error.
async fn pipeline_class(snapshot: &Path) -> Option<String> {
    let index = snapshot.join("model_index.json");
    let text = tokio::fs::read_to_string(&index).await.ok()?;
    match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(value) => value
            .get("_class_name")
            .and_then(|v| v.as_str())
            .map(str::to_owned),
        Err(err) => {
            warn!(index = %index.display(), %err, "unreadable model_index.json");
            None
        }
    }
}

/// Deterministic placeholder renderer bound to one snapshot.
pub struct PreviewPipeline {
    snapshot: PathBuf,
}

#[async_trait]
impl TextToImagePipeline for PreviewPipeline {
    async fn generate(&self, prompt: &str, steps: u32) -> Result<RgbImage> {
        let mut hasher = DefaultHasher::new();
        self.snapshot.hash(&mut hasher);
        prompt.hash(&mut hasher);
        let seed = hasher.finish();

        let mut image = RgbImage::from_fn(PREVIEW_WIDTH, PREVIEW_HEIGHT, |x, y| {
            let h = pixel_hash(seed, x, y);
            Rgb([(h >> 16) as u8, (h >> 8) as u8, h as u8])
        });
        // One smoothing pass per requested step, so `steps` observably shapes
        // the output the way it would for a real sampler.
        for _ in 0..steps {
            smooth(&mut image);
        }
        Ok(image)
    }
}

fn pixel_hash(seed: u64, x: u32, y: u32) -> u32 {
    let mut v = seed ^ (((x as u64) << 32) | y as u64);
    v ^= v >> 33;
    v = v.wrapping_mul(0xff51_afd7_ed55_8ccd);
    v ^= v >> 33;
    v as u32
}

fn smooth(image: &mut RgbImage) {
    let (width, height) = image.dimensions();
    for y in 0..height {
        for x in 0..width {
            let a = *image.get_pixel(x, y);
            let b = *image.get_pixel((x + 1) % width, y);
            let c = *image.get_pixel(x, (y + 1) % height);
            let mixed = Rgb([
                ((a[0] as u16 + b[0] as u16 + c[0] as u16) / 3) as u8,
                ((a[1] as u16 + b[1] as u16 + c[1] as u16) / 3) as u8,
                ((a[2] as u16 + b[2] as u16 + c[2] as u16) / 3) as u8,
            ]);
            image.put_pixel(x, y, mixed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline() -> PreviewPipeline {
        PreviewPipeline {
            snapshot: PathBuf::from("/cache/models--acme--tiny/snapshots/abc"),
        }
    }

    #[tokio::test]
    async fn test_generate_is_deterministic() {
        let pipe = pipeline();
        let first = pipe.generate("a red bicycle", 2).await.unwrap();
        let second = pipe.generate("a red bicycle", 2).await.unwrap();
        assert_eq!(first.as_raw(), second.as_raw());
    }

    #[tokio::test]
    async fn test_generate_varies_with_prompt() {
        let pipe = pipeline();
        let first = pipe.generate("a red bicycle", 2).await.unwrap();
        let second = pipe.generate("a blue bicycle", 2).await.unwrap();
        assert_ne!(first.as_raw(), second.as_raw());
    }

    #[tokio::test]
    async fn test_backend_loads_without_model_index() {
        let tmp = tempfile::tempdir().unwrap();
        let pipeline = PreviewBackend
            .load(tmp.path(), Device::Cuda, true)
            .await
            .unwrap();
        let image = pipeline.generate("anything", 1).await.unwrap();
        assert_eq!(image.dimensions(), (PREVIEW_WIDTH, PREVIEW_HEIGHT));
    }
}
