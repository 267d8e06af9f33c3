// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Floorplan Server - asynchronous job API for floorplan recognition.
//!
//! Images are uploaded to a blob store, prediction jobs run in the
//! background and clients poll for the results.
//!
//! # Endpoints
//!
//! - `GET /api/v1/health` - Health check and registered models
//! - `GET /api/images/upload-url` - Reserve an image name
//! - `PUT /api/images/:image_name` - Upload an image
//! - `POST /api/request-prediction` - Submit wall, icon and space jobs
//! - `POST /api/request-prediction/icons` - Submit an icon job
//! - `GET /api/retrieve-results/:task_file` - Poll `{id}.json` / `{id}.svg`
//! - `GET /api/blobs/:blob_name` - Download a stored artifact
//! - `POST /api/retrieve-stats` - Statistics over finished jobs
//! - `POST /api/retrieve-background` - Background over finished jobs

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

pub mod config;
pub mod error;
pub mod routes;
pub mod services;
pub mod types;

use config::Config;
use services::{BlobStore, JobQueue, Models};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub blobs: Arc<BlobStore>,
    pub jobs: Arc<JobQueue>,
    pub models: Arc<Models>,
    pub config: Arc<Config>,
}

impl AppState {
    pub async fn new(config: Config, models: Models) -> Self {
        let blobs = Arc::new(BlobStore::new(&config.blob_dir).await);
        let models = Arc::new(models);
        let jobs = Arc::new(JobQueue::new(
            Arc::clone(&blobs),
            Arc::clone(&models),
            Duration::from_secs(config.job_timeout_secs),
        ));

        Self {
            blobs,
            jobs,
            models,
            config: Arc::new(config),
        }
    }
}

/// Build the HTTP router with all routes and middleware.
pub fn router(state: AppState) -> Router {
    let max_body = state.config.max_image_size_mb * 1024 * 1024;
    let request_timeout = Duration::from_secs(state.config.request_timeout_secs);

    Router::new()
        .route("/", get(routes::health::info))
        .route("/api/v1/health", get(routes::health::check))
        // Uploads
        .route("/api/images/upload-url", get(routes::images::upload_url))
        .route("/api/images/:image_name", put(routes::images::put_image))
        // Jobs
        .route("/api/request-prediction", post(routes::predict::request_prediction))
        .route("/api/request-prediction/icons", post(routes::predict::request_icons))
        .route("/api/retrieve-results/:task_file", get(routes::results::retrieve_results))
        .route("/api/blobs/:blob_name", get(routes::blobs::get_blob))
        // Fan-in over finished jobs
        .route("/api/retrieve-stats", post(routes::derived::retrieve_stats))
        .route("/api/retrieve-background", post(routes::derived::retrieve_background))
        // Middleware
        .layer(DefaultBodyLimit::max(max_body))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
