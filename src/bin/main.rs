//! Snapserve binary.
//!
//! Entry point for the serverless worker: resolves the configured model
//! against the mounted hub cache and serves single-request text-to-image
//! jobs over the runtime's job protocol.

use std::sync::Arc;

use clap::Parser;
use snapserve_core::{
    config::{force_offline_env, Args, WorkerConfig},
    inference::{backend_for, loader::PipelineLoader},
    server::{worker, WorkerState},
    storage::{HubCache, ModelRef},
};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .parse_lossy(args.log_filter.as_deref().unwrap_or("snapserve_core=info")),
        )
        .with_target(true)
        .init();

    // Fence the artifact loader off the network before anything else runs
    force_offline_env();

    let config = WorkerConfig::load(&args)?;
    let model = ModelRef::normalize(&config.model_id)?;
    let cache = HubCache::new(&config.cache_root);
    let backend = backend_for(&config.backend)?;
    let loader = Arc::new(PipelineLoader::new(
        model.clone(),
        cache.clone(),
        config.local_files_only,
        backend,
    ));

    info!(
        model = %model,
        cache_root = %cache.root().display(),
        backend = %config.backend,
        local_files_only = config.local_files_only,
        "snapserve worker starting"
    );

    let state = WorkerState {
        model,
        cache,
        loader,
    };

    tokio::select! {
        result = worker::run(state) => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    Ok(())
}
