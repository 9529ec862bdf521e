//! Keeping storage, the location service and the catalog in step.

mod bridge;
mod cache;

pub use bridge::{Bridge, ReconcileReport, SyncOutcome};
pub use cache::{CacheConfig, KeyGuard, SyncCache};
