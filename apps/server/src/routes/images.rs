// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Image upload endpoints.

use crate::error::ApiError;
use crate::services::{blob_store, BlobStore};
use crate::types::{ImageStoredResponse, UploadUrlQuery, UploadUrlResponse};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use bytes::Bytes;
use uuid::Uuid;

const DEFAULT_IMAGE_TYPE: &str = "image/png";

/// GET /api/images/upload-url - Reserve an image name to `PUT` to.
pub async fn upload_url(Query(query): Query<UploadUrlQuery>) -> Result<Json<UploadUrlResponse>, ApiError> {
    let content_type = query.content_type.unwrap_or_else(|| DEFAULT_IMAGE_TYPE.to_string());
    if !content_type.starts_with("image/") {
        return Err(ApiError::BadRequest(format!("Not an image content type: {}", content_type)));
    }

    let image_name = Uuid::new_v4().simple().to_string();
    Ok(Json(UploadUrlResponse {
        url: format!("/api/images/{}", image_name),
        image_name,
        content_type,
    }))
}

/// PUT /api/images/:image_name - Store the raw request body as an image.
pub async fn put_image(
    State(state): State<AppState>,
    Path(image_name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<ImageStoredResponse>), ApiError> {
    validate_name(&image_name)?;
    if body.is_empty() {
        return Err(ApiError::BadRequest("Empty image body".into()));
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or(DEFAULT_IMAGE_TYPE);

    state
        .blobs
        .put(&BlobStore::image_key(&image_name), &body, content_type)
        .await?;

    tracing::info!(image_name = %image_name, size = body.len(), "Image stored");

    Ok((
        StatusCode::CREATED,
        Json(ImageStoredResponse {
            image_name,
            size: body.len(),
            digest: blob_store::digest(&body),
        }),
    ))
}

fn validate_name(name: &str) -> Result<(), ApiError> {
    let valid = !name.is_empty()
        && name.len() <= 128
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && !name.starts_with('.');
    if valid {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!("Invalid image name: {:?}", name)))
    }
}
