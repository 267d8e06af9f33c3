// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Statistics and background derived from a set of finished jobs.
//!
//! Both endpoints answer 202 until every listed job is done and only
//! then combine their shapes.

use crate::error::ApiError;
use crate::types::{BackgroundQuery, ResultFormat, StatsResponse, TaskSetRequest};
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use floorplan_vision::{
    background_prediction, calculate_statistics, to_geojson, to_svg, Prediction, DEFAULT_PIXELS_PER_METER,
};
use futures::future::try_join_all;
use uuid::Uuid;

/// POST /api/retrieve-stats - Statistics over the shapes of finished jobs.
pub async fn retrieve_stats(
    State(state): State<AppState>,
    Json(request): Json<TaskSetRequest>,
) -> Result<Json<StatsResponse>, ApiError> {
    let pixels_per_meter = request
        .pixels_per_meter
        .or(state.config.default_pixels_per_meter)
        .unwrap_or(DEFAULT_PIXELS_PER_METER);
    let (prediction, _) = combined_prediction(&state, &request.task_ids).await?;

    let statistics =
        tokio::task::spawn_blocking(move || calculate_statistics(&prediction, pixels_per_meter)).await??;

    Ok(Json(StatsResponse {
        status: "READY".to_string(),
        statistics,
    }))
}

/// POST /api/retrieve-background - Background of the image outside all shapes.
pub async fn retrieve_background(
    State(state): State<AppState>,
    Query(query): Query<BackgroundQuery>,
    Json(request): Json<TaskSetRequest>,
) -> Result<Response, ApiError> {
    let (prediction, (width, height)) = combined_prediction(&state, &request.task_ids).await?;
    let format = query.format.unwrap_or(ResultFormat::Json);

    let body = tokio::task::spawn_blocking(move || -> floorplan_vision::Result<String> {
        let background = background_prediction(&prediction, width, height)?;
        match format {
            ResultFormat::Json => to_geojson(&background),
            ResultFormat::Svg => Ok(to_svg(&background, width, height)),
        }
    })
    .await??;

    Ok(([(header::CONTENT_TYPE, format.content_type())], body).into_response())
}

/// Shapes of all `task_ids` in order, with the first job's image size.
async fn combined_prediction(state: &AppState, task_ids: &[String]) -> Result<(Prediction, (u32, u32)), ApiError> {
    if task_ids.is_empty() {
        return Err(ApiError::BadRequest("task_ids must not be empty".into()));
    }
    let ids = task_ids
        .iter()
        .map(|raw| Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(format!("Unknown task: {}", raw))))
        .collect::<Result<Vec<_>, _>>()?;

    let ready = state.jobs.ready(&ids).await?;
    let size = ready
        .first()
        .map(|(_, output)| (output.width, output.height))
        .unwrap_or_default();

    let predictions = try_join_all(ready.iter().map(|(record, _)| state.jobs.load_prediction(record))).await?;
    let mut combined = Prediction::new();
    for prediction in predictions {
        combined.extend(prediction);
    }

    Ok((combined, size))
}
