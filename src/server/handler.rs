//! Per-job request handling
//!
//! Extracts the job parameters, obtains the shared pipeline handle, delegates
//! generation, and assembles the response envelope. No business logic beyond
//! field extraction and assembly lives here.

use std::io::Cursor;
use std::time::Instant;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::{ImageFormat, RgbImage};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::constants::{DEFAULT_PROMPT, DEFAULT_STEPS};
use crate::error::Result;
use crate::server::state::WorkerState;

/// Job envelope consumed from the hosting runtime.
#[derive(Debug, Default, Deserialize)]
pub struct JobRequest {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub input: JobInput,
}

/// Optional per-job parameters.
#[derive(Debug, Default, Deserialize)]
pub struct JobInput {
    pub prompt: Option<String>,
    pub steps: Option<u32>,
}

/// Response envelope produced for the hosting runtime.
#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub model_id: String,
    pub prompt: String,
    pub steps: u32,
    pub image_base64_png: String,
    pub cache_root: String,
    pub snapshot_path: String,
}

/// Failure envelope for the runtime's per-job error reporting. The message
/// string is the entire diagnostic.
#[derive(Debug, Serialize)]
pub struct JobFailure {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub error: String,
}

/// Handle one job end to end.
pub async fn handle_job(state: &WorkerState, job: JobRequest) -> Result<JobResponse> {
    let prompt = job
        .input
        .prompt
        .unwrap_or_else(|| DEFAULT_PROMPT.to_string());
    let steps = job.input.steps.unwrap_or(DEFAULT_STEPS);

    let started = Instant::now();
    let handle = state.loader.get_or_load().await?;
    let image = handle.generate(&prompt, steps).await?;
    let image_base64_png = png_base64(&image)?;

    // Re-resolve at response time so the echoed path tracks the cache as it
    // is now, not as it was when the pipeline first loaded.
    let snapshot_path = state.cache.resolve_snapshot(&state.model)?;

    info!(
        job = job.id.as_deref().unwrap_or("-"),
        prompt_len = prompt.len(),
        steps,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "job complete"
    );

    Ok(JobResponse {
        model_id: state.model.to_string(),
        prompt,
        steps,
        image_base64_png,
        cache_root: state.cache.root().display().to_string(),
        snapshot_path: snapshot_path.display().to_string(),
    })
}

/// Encode an image as PNG bytes wrapped in standard base64 text.
pub fn png_base64(image: &RgbImage) -> Result<String> {
    let mut png = Vec::new();
    image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(STANDARD.encode(png))
}
