//! Bridge core endpoints served by the storage server.

use super::{parse_post_body, KeyQuery};
use crate::error::ApiResult;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use bytes::Bytes;
use model_catalog_bridge::types::ListKeysResponse;
use model_catalog_bridge::{Bridge, StorageBody, SyncOutcome};
use std::sync::Arc;
use tracing::{debug, info};

/// `POST /upsert?key=<k>`: 201 on first import, 200 afterwards.
pub async fn handle_upsert(
    State(bridge): State<Arc<Bridge>>,
    Query(query): Query<KeyQuery>,
    body: Bytes,
) -> ApiResult<StatusCode> {
    let key = query.require()?;
    let post = parse_post_body(&body)?;

    match bridge.upsert(&key, post.body).await? {
        SyncOutcome::Imported { .. } => Ok(StatusCode::CREATED),
        SyncOutcome::Updated => Ok(StatusCode::OK),
    }
}

/// `POST /currentkeyset?key=<k1,k2,..>`: remove every stored key not listed.
///
/// A missing or empty parameter means no models were discovered upstream.
pub async fn handle_current_key_set(
    State(bridge): State<Arc<Bridge>>,
    Query(query): Query<KeyQuery>,
) -> ApiResult<StatusCode> {
    let raw = query.key.unwrap_or_default();
    let current: Vec<&str> = raw.split(',').filter(|k| !k.is_empty()).collect();
    info!("Reconciling storage against {} current keys", current.len());
    debug!("Current key set: {:?}", current);

    let report = bridge.reconcile(current).await?;
    if !report.removed.is_empty() {
        info!("Removed keys no longer in the current key set: {:?}", report.removed);
    }
    Ok(StatusCode::OK)
}

/// `GET /list`
pub async fn handle_list(State(bridge): State<Arc<Bridge>>) -> ApiResult<Json<ListKeysResponse>> {
    let keys = bridge.list().await?;
    Ok(Json(ListKeysResponse { keys }))
}

/// `GET /fetch?key=<k>`
pub async fn handle_fetch(
    State(bridge): State<Arc<Bridge>>,
    Query(query): Query<KeyQuery>,
) -> ApiResult<Json<StorageBody>> {
    let key = query.require()?;
    Ok(Json(bridge.fetch(&key).await?))
}
