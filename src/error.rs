//! Error types for the snapserve worker.

use std::path::PathBuf;

use thiserror::Error;

use crate::storage::ModelRef;

/// A specialized Result type for snapserve operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for snapserve operations.
///
/// Every variant is fatal for the job that hit it; nothing here is retried
/// in-process. The `Display` string is the entire operator-facing diagnostic.
#[derive(Error, Debug)]
pub enum Error {
    /// The raw model reference had no `org/name` separator after stripping.
    #[error("Malformed model id {raw:?}: expected 'org/name'")]
    MalformedModelId { raw: String },

    /// The expected model cache directory is absent from the cache volume.
    /// The fix is external: mount the correct cached artifact.
    #[error(
        "Model cache dir not found: {}. Make sure the mounted cache provides \
         https://huggingface.co/{model}. Hub entries (first 30): {siblings:?}",
        .dir.display()
    )]
    CacheMiss {
        dir: PathBuf,
        model: ModelRef,
        siblings: Vec<String>,
    },

    /// The model cache directory exists but holds no usable revision.
    #[error("No snapshots found under {}", .dir.display())]
    NoSnapshots { dir: PathBuf },

    /// No accelerated compute device was present at load time.
    #[error("No accelerated compute device available; reschedule this worker on GPU hardware")]
    DeviceNotAvailable,

    /// The configured backend name matches no linked pipeline engine.
    #[error("Unsupported pipeline backend {name:?} (supported: preview)")]
    UnsupportedBackend { name: String },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Image encoding errors
    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),
}
