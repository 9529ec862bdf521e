//! HTTP clients for the services the model catalog bridge talks to.
//!
//! Each client implements one of the collaborator traits from
//! `model-catalog-bridge`, so the sync core and the location registry can be
//! wired against remote services without knowing about HTTP.

mod catalog;
mod http;
mod location;
mod storage;

pub use catalog::BackstageCatalogClient;
pub use http::ClientConfig;
pub use location::LocationServiceClient;
pub use storage::StorageServiceClient;

#[cfg(test)]
mod test_server {
    use axum::Router;
    use tokio::net::TcpListener;

    /// Serve `router` on an ephemeral port, returning its base URL.
    pub(crate) async fn serve(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }
}
