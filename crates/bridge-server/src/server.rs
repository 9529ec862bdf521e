//! HTTP server implementation using Axum.

use crate::handlers::{self, location, storage};
use axum::body::Body;
use axum::http::Request;
use axum::routing::{delete, get, post};
use axum::Router;
use model_catalog_bridge::config::Routes;
use model_catalog_bridge::{Bridge, LocationRegistry, Rehydrator};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, info_span};

/// State of the location server.
pub struct LocationState {
    pub registry: Arc<LocationRegistry>,
    pub rehydrator: Rehydrator,
}

/// Request id, tracing span and id propagation for every request.
fn with_request_layers(router: Router) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|value| value.to_str().ok())
                        .unwrap_or("-");
                    info_span!(
                        "request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id,
                    )
                }),
            )
            .layer(PropagateRequestIdLayer::x_request_id()),
    )
}

/// Router of the storage server, fronting the bridge core.
pub fn storage_router(bridge: Arc<Bridge>) -> Router {
    let router = Router::new()
        .route(Routes::HEALTH, get(handlers::handle_health))
        .route(Routes::UPSERT, post(storage::handle_upsert))
        .route(Routes::CURRENT_KEY_SET, post(storage::handle_current_key_set))
        .route(Routes::LIST, get(storage::handle_list))
        .route(Routes::FETCH, get(storage::handle_fetch))
        .with_state(bridge);
    with_request_layers(router)
}

/// Router of the location server. Unclaimed paths resolve to documents.
pub fn location_router(state: Arc<LocationState>) -> Router {
    let router = Router::new()
        .route(Routes::HEALTH, get(handlers::handle_health))
        .route(Routes::UPSERT, post(location::handle_upsert))
        .route(Routes::REMOVE, delete(location::handle_remove))
        .route(Routes::LIST, get(location::handle_discover))
        .route(Routes::BACKGROUND_POLL, get(location::handle_poll))
        .fallback(location::handle_document)
        .with_state(state);
    with_request_layers(router)
}

fn spawn_server(listener: TcpListener, app: Router, name: &'static str) {
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("{} server error: {}", name, e);
        }
    });
}

async fn bind(host: &str, port: u16) -> anyhow::Result<TcpListener> {
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    Ok(TcpListener::bind(addr).await?)
}

/// Serve the storage routes on an already bound listener.
pub fn serve_storage(listener: TcpListener, bridge: Arc<Bridge>) -> anyhow::Result<SocketAddr> {
    let addr = listener.local_addr()?;
    info!("Storage server listening on {}", addr);
    spawn_server(listener, storage_router(bridge), "storage");
    Ok(addr)
}

/// Start the storage server.
///
/// Returns the actual address the server is bound to (useful when port=0).
pub async fn start_storage_server(
    bridge: Arc<Bridge>,
    host: &str,
    port: u16,
) -> anyhow::Result<SocketAddr> {
    serve_storage(bind(host, port).await?, bridge)
}

/// Serve the location routes on an already bound listener and kick off the
/// initial rehydration from storage.
pub fn serve_location(
    listener: TcpListener,
    registry: Arc<LocationRegistry>,
    rehydrator: Rehydrator,
) -> anyhow::Result<SocketAddr> {
    let addr = listener.local_addr()?;
    info!("Location server listening on {}", addr);

    let state = Arc::new(LocationState {
        registry,
        rehydrator,
    });
    // Detached; the task logs its own outcome.
    drop(state.rehydrator.trigger());
    spawn_server(listener, location_router(state), "location");
    Ok(addr)
}

/// Start the location server.
///
/// Returns the actual address the server is bound to (useful when port=0).
pub async fn start_location_server(
    registry: Arc<LocationRegistry>,
    rehydrator: Rehydrator,
    host: &str,
    port: u16,
) -> anyhow::Result<SocketAddr> {
    serve_location(bind(host, port).await?, registry, rehydrator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use model_catalog_bridge::{MemoryStorage, NormalizerFormat, RehydrateConfig};

    #[tokio::test]
    async fn test_location_server_starts() {
        let registry = Arc::new(LocationRegistry::new(
            NormalizerFormat::CatalogInfoYaml,
            "http://127.0.0.1:9090",
        ));
        let rehydrator = Rehydrator::new(
            registry.clone(),
            Arc::new(MemoryStorage::new()),
            RehydrateConfig::default(),
        );

        let addr = start_location_server(registry, rehydrator, "127.0.0.1", 0)
            .await
            .unwrap();
        assert!(addr.port() > 0);
    }

    #[tokio::test]
    async fn test_bad_host_is_rejected() {
        assert!(bind("not a host", 0).await.is_err());
    }
}
