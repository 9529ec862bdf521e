//! Model Catalog Bridge servers.
//!
//! Two HTTP surfaces ship in one binary:
//! - the storage server fronts the sync core (`/upsert`, `/currentkeyset`,
//!   `/list`, `/fetch`)
//! - the location server publishes catalog documents under their location
//!   URIs and rehydrates itself from the storage server after a restart

pub mod error;
pub mod handlers;
pub mod server;

pub use error::{ApiError, ApiResult};
pub use server::{
    location_router, serve_location, serve_storage, start_location_server, start_storage_server,
    storage_router, LocationState,
};
