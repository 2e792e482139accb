//! Model identification and hub cache resolution
//!
//! The cache volume is populated out-of-band and consumed read-only here:
//! identifiers are normalized to a stable `org/name` key, then resolved to a
//! concrete snapshot directory through the hub's refs/snapshots layout.

pub mod model_ref;
pub mod paths;

pub use model_ref::ModelRef;
pub use paths::HubCache;
