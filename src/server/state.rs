//! Shared worker state

use std::sync::Arc;

use crate::inference::loader::PipelineLoader;
use crate::storage::{HubCache, ModelRef};

/// State shared by every job a worker process handles.
#[derive(Clone)]
pub struct WorkerState {
    /// Normalized identity of the one model this worker serves
    pub model: ModelRef,

    /// Read-only view of the mounted hub cache
    pub cache: HubCache,

    /// Guarded owner of the process-wide pipeline handle
    pub loader: Arc<PipelineLoader>,
}
