//! Location service endpoints.
//!
//! Documents are served from the router's fallback: every path not claimed
//! by a management route is looked up in the registry.

use super::{parse_post_body, KeyQuery};
use crate::error::ApiResult;
use crate::server::LocationState;
use axum::extract::{Query, State};
use axum::http::{header, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use model_catalog_bridge::types::DiscoveryResponse;
use model_catalog_bridge::UpsertOutcome;
use std::sync::Arc;
use tracing::debug;

/// `POST /upsert?key=<k>`: 201 when the URI is new, 200 on update.
pub async fn handle_upsert(
    State(state): State<Arc<LocationState>>,
    Query(query): Query<KeyQuery>,
    body: Bytes,
) -> ApiResult<StatusCode> {
    let key = query.require()?;
    let post = parse_post_body(&body)?;

    match state.registry.upsert_key(&key, Bytes::from(post.body))? {
        UpsertOutcome::Created => Ok(StatusCode::CREATED),
        UpsertOutcome::Updated => Ok(StatusCode::OK),
    }
}

/// `DELETE /remove?key=<k>`: soft delete, idempotent.
pub async fn handle_remove(
    State(state): State<Arc<LocationState>>,
    Query(query): Query<KeyQuery>,
) -> ApiResult<StatusCode> {
    let key = query.require()?;
    state.registry.delete_key(&key)?;
    Ok(StatusCode::OK)
}

/// `GET /list`
pub async fn handle_discover(State(state): State<Arc<LocationState>>) -> Json<DiscoveryResponse> {
    Json(DiscoveryResponse {
        uris: state.registry.discover(),
    })
}

/// `GET /poll`: answer right away, reload from storage in the background.
pub async fn handle_poll(State(state): State<Arc<LocationState>>) -> StatusCode {
    // Detached; the task logs its own outcome.
    drop(state.rehydrator.trigger());
    StatusCode::OK
}

/// `GET <uri>`: the catalog document registered under the request path.
pub async fn handle_document(
    State(state): State<Arc<LocationState>>,
    method: Method,
    uri: Uri,
) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let path = uri.path();
    match state.registry.get(path) {
        Some(content) => {
            debug!("Serving {} ({} bytes)", path, content.len());
            (
                [(header::CONTENT_TYPE, state.registry.format().content_type())],
                content,
            )
                .into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
