//! Request handling for the serverless worker
//!
//! The hosting runtime owns transport and queueing; this module only defines
//! the per-job handler, the shared worker state, and a thin NDJSON loop the
//! runtime drives over stdio.

pub mod handler;
pub mod state;
pub mod worker;

pub use handler::{handle_job, JobInput, JobRequest, JobResponse};
pub use state::WorkerState;
