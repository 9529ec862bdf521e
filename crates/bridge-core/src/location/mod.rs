//! The location service: documents the catalog pulls over HTTP.

mod registry;
mod rehydrate;

pub use registry::{LocationRegistry, LocationSlot};
pub use rehydrate::{rehydrate, RehydrateConfig, RehydrateOutcome, Rehydrator};
