// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types and handling for the server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    /// One or more jobs are still running; the caller should poll again.
    #[error("Not ready: {0}")]
    NotReady(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The job's input image was missing or could not be decoded.
    #[error("Input image error: {0}")]
    InputImage(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Job failed: {0}")]
    JobFailed(String),

    #[error("Blob store error: {0}")]
    Blob(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'static str>,
    pub error: String,
    pub code: String,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotReady(_) => StatusCode::ACCEPTED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InputImage(_) => StatusCode::FAILED_DEPENDENCY,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::JobFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Blob(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::NotReady(_) => "NOT_READY",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::InputImage(_) => "INPUT_IMAGE_ERROR",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::JobFailed(_) => "JOB_FAILED",
            ApiError::Blob(_) => "BLOB_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = ErrorResponse {
            status: matches!(self, ApiError::NotReady(_)).then_some("NOT READY"),
            error: self.to_string(),
            code: self.code().to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<cacache::Error> for ApiError {
    fn from(err: cacache::Error) -> Self {
        ApiError::Blob(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Internal(format!("JSON error: {}", err))
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("Task error: {}", err))
    }
}

impl From<floorplan_vision::VisionError> for ApiError {
    fn from(err: floorplan_vision::VisionError) -> Self {
        use floorplan_vision::VisionError;
        match err {
            VisionError::InputImage(msg) => ApiError::InputImage(msg),
            VisionError::Config(msg) => ApiError::BadRequest(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}
