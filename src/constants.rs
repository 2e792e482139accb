//! Shared constants for the snapserve worker
//!
//! Centralizes the default identifiers and limits so behavior stays
//! discoverable and consistent across the codebase.

/// Model reference used when no `MODEL_ID` is configured.
pub const DEFAULT_MODEL_ID: &str = "ofa-sys/small-stable-diffusion-v0";

/// Root of the mounted hub cache volume.
///
/// The layout below it follows the HuggingFace hub cache convention:
/// `models--{org}--{name}/refs/main` and `models--{org}--{name}/snapshots/{rev}/`.
pub const DEFAULT_CACHE_ROOT: &str = "/runpod-volume/huggingface-cache/hub";

/// Pipeline backend selected when the config does not name one.
pub const DEFAULT_BACKEND: &str = "preview";

/// Prompt used when a job supplies none.
pub const DEFAULT_PROMPT: &str = "a cute corgi astronaut, cinematic lighting";

/// Inference step count used when a job supplies none.
pub const DEFAULT_STEPS: u32 = 20;

/// Maximum number of cache-root entries included in a cache-miss diagnostic.
pub const CACHE_LISTING_CAP: usize = 30;

/// Path marker that identifies hub URLs in raw model references.
pub const HUB_URL_MARKER: &str = "huggingface.co/";

/// Environment key carrying the offline toggle for the artifact loader.
pub const LOCAL_FILES_ONLY_ENV: &str = "LOCAL_FILES_ONLY";

/// Offline-mode flags forced on at process start so the underlying
/// model-loading libraries never reach for the network.
pub const OFFLINE_ENV_FLAGS: [&str; 2] = ["HF_HUB_OFFLINE", "TRANSFORMERS_OFFLINE"];
