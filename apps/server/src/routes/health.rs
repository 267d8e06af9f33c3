// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Health check endpoint.

use crate::AppState;
use axum::{extract::State, Json};
use serde::Serialize;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub service: &'static str,
    pub models_loaded: bool,
    /// Tags of the registered model kinds; empty until the registry loads.
    pub models: Vec<&'static str>,
}

/// API information response.
#[derive(Debug, Serialize)]
pub struct ApiInfoResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    pub endpoints: Vec<EndpointInfo>,
}

/// Endpoint information.
#[derive(Debug, Serialize)]
pub struct EndpointInfo {
    pub method: &'static str,
    pub path: &'static str,
    pub description: &'static str,
}

/// GET /api/v1/health - Health check endpoint.
pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        service: "floorplan-server",
        models_loaded: state.models.is_loaded(),
        models: state.models.loaded_kinds().iter().map(|kind| kind.tag()).collect(),
    })
}

/// GET / - API information endpoint.
pub async fn info() -> Json<ApiInfoResponse> {
    let endpoints = [
        ("GET", "/api/v1/health", "Health check endpoint"),
        ("GET", "/api/images/upload-url", "Reserve an image name and upload URL"),
        ("PUT", "/api/images/:image_name", "Upload raw image bytes"),
        ("POST", "/api/request-prediction", "Submit wall, icon and space jobs"),
        ("POST", "/api/request-prediction/icons", "Submit an icon job"),
        ("GET", "/api/retrieve-results/:task_file", "Poll a job result as {id}.json or {id}.svg"),
        ("GET", "/api/blobs/:blob_name", "Download a stored artifact"),
        ("POST", "/api/retrieve-stats", "Statistics over finished jobs"),
        ("POST", "/api/retrieve-background", "Background shapes over finished jobs"),
    ];

    Json(ApiInfoResponse {
        service: "floorplan-server",
        version: env!("CARGO_PKG_VERSION"),
        description: "Floorplan recognition job server",
        endpoints: endpoints
            .into_iter()
            .map(|(method, path, description)| EndpointInfo {
                method,
                path,
                description,
            })
            .collect(),
    })
}
