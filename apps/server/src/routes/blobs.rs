// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Stored artifact download.

use crate::error::ApiError;
use crate::services::BlobStore;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};

/// GET /api/blobs/:blob_name - Serve a job artifact.
///
/// Artifacts never change once written, so responses carry a strong ETag
/// and `If-None-Match` is honoured.
pub async fn get_blob(
    State(state): State<AppState>,
    Path(blob_name): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let blob = state
        .blobs
        .get(&BlobStore::result_key(&blob_name))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Blob not found: {}", blob_name)))?;

    let etag = format!("\"{}\"", blob.digest());
    let unchanged = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == etag);
    if unchanged {
        return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response());
    }

    Ok((
        [
            (header::CONTENT_TYPE, blob.content_type),
            (header::ETAG, etag),
            (header::CACHE_CONTROL, "public, max-age=31536000, immutable".to_string()),
        ],
        blob.data,
    )
        .into_response())
}
