//! Configuration management for the snapserve worker.
//!
//! Options are loaded in order of precedence, with later sources overriding
//! earlier ones:
//! 1. Built-in defaults
//! 2. User-specified configuration file (TOML)
//! 3. Environment variables (`MODEL_ID`, `CACHE_ROOT`, `BACKEND`)
//! 4. Command-line arguments
//!
//! `LOCAL_FILES_ONLY` is read straight from the environment with the loose
//! parse rule the hosting platform uses: `"true"` (case-insensitive) enables
//! it, any other value disables it, unset means enabled.

use std::env;
use std::path::PathBuf;

use clap::Parser;
use serde::Deserialize;

use crate::constants::{
    DEFAULT_BACKEND, DEFAULT_CACHE_ROOT, DEFAULT_MODEL_ID, LOCAL_FILES_ONLY_ENV,
    OFFLINE_ENV_FLAGS,
};
use crate::error::Result;

/// Command-line arguments
#[derive(Debug, Default, Parser)]
#[clap(version, about)]
pub struct Args {
    /// Configuration file path
    #[clap(short, long)]
    pub config: Option<PathBuf>,

    /// Raw model reference (org/name or a hub URL)
    #[clap(long)]
    pub model_id: Option<String>,

    /// Root of the mounted hub cache volume
    #[clap(long)]
    pub cache_root: Option<PathBuf>,

    /// Pipeline backend to load behind the inference boundary
    #[clap(long)]
    pub backend: Option<String>,

    /// Tracing filter directive, e.g. `snapserve_core=debug`
    #[clap(long)]
    pub log_filter: Option<String>,
}

/// Worker configuration
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Raw model reference, normalized later by the identifier normalizer
    pub model_id: String,
    /// Cache volume root holding the hub layout
    pub cache_root: PathBuf,
    /// Backend name resolved against the linked pipeline engines
    pub backend: String,
    /// Refuse any network fetch in the artifact loader
    pub local_files_only: bool,
}

/// File/environment-sourced subset of the configuration.
#[derive(Debug, Deserialize)]
struct RawConfig {
    model_id: String,
    cache_root: PathBuf,
    backend: String,
}

impl WorkerConfig {
    /// Load configuration from all sources
    pub fn load(args: &Args) -> Result<Self> {
        let mut builder = config::Config::builder()
            .set_default("model_id", DEFAULT_MODEL_ID)?
            .set_default("cache_root", DEFAULT_CACHE_ROOT)?
            .set_default("backend", DEFAULT_BACKEND)?;

        // Load user config if specified
        if let Some(path) = &args.config {
            builder = builder.add_source(config::File::from(path.as_path()));
        }

        // Add environment variables
        builder = builder.add_source(config::Environment::default());

        let raw: RawConfig = builder.build()?.try_deserialize()?;

        let mut config = WorkerConfig {
            model_id: raw.model_id,
            cache_root: raw.cache_root,
            backend: raw.backend,
            local_files_only: local_files_only_from_env(),
        };

        // Override with command line args
        if let Some(model_id) = &args.model_id {
            config.model_id = model_id.clone();
        }
        if let Some(cache_root) = &args.cache_root {
            config.cache_root = cache_root.clone();
        }
        if let Some(backend) = &args.backend {
            config.backend = backend.clone();
        }

        Ok(config)
    }
}

/// Force the offline-mode flags on so the underlying model-loading libraries
/// only ever read from the mounted cache. Called once at process start.
pub fn force_offline_env() {
    for flag in OFFLINE_ENV_FLAGS {
        env::set_var(flag, "1");
    }
}

fn local_files_only_from_env() -> bool {
    parse_local_files_only(env::var(LOCAL_FILES_ONLY_ENV).ok().as_deref())
}

fn parse_local_files_only(value: Option<&str>) -> bool {
    match value {
        Some(v) => v.eq_ignore_ascii_case("true"),
        None => true,
    }
}
