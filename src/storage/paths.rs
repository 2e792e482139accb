//! Snapshot resolution over the mounted hub cache
//!
//! The cache root follows the hub convention:
//!
//! ```text
//! {root}/models--{org}--{name}/refs/main            (optional, plain text revision)
//! {root}/models--{org}--{name}/snapshots/{revision}/
//! ```
//!
//! Resolution prefers the revision named by `refs/main`, falling back to the
//! lexicographically first entry under `snapshots/`. It is a pure read:
//! nothing is written, nothing is cached across calls, and an unchanged cache
//! directory always resolves to the same path.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::constants::CACHE_LISTING_CAP;
use crate::error::{Error, Result};
use crate::storage::ModelRef;

/// Read-only view of the hub cache volume.
#[derive(Debug, Clone)]
pub struct HubCache {
    root: PathBuf,
}

impl HubCache {
    /// Create a cache view over the given root. The root is never created or
    /// modified by this system; it is populated by the volume mount.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The cache root this view reads from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Expected cache directory for a model.
    pub fn model_cache_dir(&self, model: &ModelRef) -> PathBuf {
        self.root.join(model.cache_dir_name())
    }

    /// Resolve the snapshot directory for a model.
    ///
    /// When `refs/main` names a revision whose directory exists, that wins.
    /// Otherwise the entries of `snapshots/` are sorted and the first one is
    /// taken; lexicographic order is the documented tie-break, not recency.
    pub fn resolve_snapshot(&self, model: &ModelRef) -> Result<PathBuf> {
        let model_dir = self.model_cache_dir(model);
        if !model_dir.exists() {
            return Err(Error::CacheMiss {
                dir: model_dir,
                model: model.clone(),
                siblings: self.list_root(CACHE_LISTING_CAP),
            });
        }

        let ref_main = model_dir.join("refs").join("main");
        if ref_main.exists() {
            let revision = fs::read_to_string(&ref_main)?;
            let candidate = model_dir.join("snapshots").join(revision.trim());
            if candidate.exists() {
                debug!(model = %model, snapshot = %candidate.display(), "resolved via refs/main");
                return Ok(candidate);
            }
            warn!(
                model = %model,
                revision = revision.trim(),
                "refs/main names a missing snapshot, falling back to directory listing"
            );
        }

        let snapshots_dir = model_dir.join("snapshots");
        let mut entries: Vec<PathBuf> = match fs::read_dir(&snapshots_dir) {
            Ok(read_dir) => read_dir
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .collect(),
            Err(_) => Vec::new(),
        };
        entries.sort();

        match entries.into_iter().next() {
            Some(snapshot) => {
                debug!(model = %model, snapshot = %snapshot.display(), "resolved via first snapshot entry");
                Ok(snapshot)
            }
            None => Err(Error::NoSnapshots { dir: snapshots_dir }),
        }
    }

    /// Bounded, sorted listing of whatever exists directly under the root.
    /// Used only for cache-miss diagnostics; listing failures degrade to an
    /// empty list rather than masking the miss itself.
    fn list_root(&self, cap: usize) -> Vec<String> {
        let read_dir = match fs::read_dir(&self.root) {
            Ok(read_dir) => read_dir,
            Err(_) => return Vec::new(),
        };
        let mut names: Vec<String> = read_dir
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        names.sort();
        names.truncate(cap);
        names
    }
}
