// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use anyhow::Context;
use floorplan_server::{config::Config, router, services::Models, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::from_env();

    // Tile inference runs on the global rayon pool
    rayon::ThreadPoolBuilder::new()
        .num_threads(config.worker_threads)
        .build_global()
        .context("Failed to initialize rayon thread pool")?;

    let state = AppState::new(config.clone(), Models::classical()).await;

    if config.preload_models {
        let models = Arc::clone(&state.models);
        if let Err(e) = tokio::task::spawn_blocking(move || models.registry()).await? {
            tracing::warn!(error = %e, "Model preload failed, loading on first job instead");
        }
    }

    tracing::info!(
        port = config.port,
        blob_dir = %config.blob_dir,
        max_image_size_mb = config.max_image_size_mb,
        worker_threads = config.worker_threads,
        job_timeout_secs = config.job_timeout_secs,
        models = ?state.models.loaded_kinds(),
        "Starting floorplan server"
    );

    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("floorplan_server=info,floorplan_vision=info,tower_http=info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
