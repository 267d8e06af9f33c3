// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Prediction submission endpoints.

use crate::error::ApiError;
use crate::types::{IconTasksResponse, PredictionParams, PredictionTasksResponse, TaskHandle};
use crate::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use floorplan_vision::ModelKind;

/// POST /api/request-prediction - Submit wall, icon and space jobs for one image.
pub async fn request_prediction(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<PredictionTasksResponse>, ApiError> {
    let params = resolve(&state, &pairs)?;

    let wall_task = submit(&state, ModelKind::Walls, &params).await;
    let icon_task = submit(&state, ModelKind::IconsV2, &params).await;
    let spaces_task = submit(&state, ModelKind::Spaces, &params).await;

    Ok(Json(PredictionTasksResponse {
        wall_task,
        icon_task,
        spaces_task,
    }))
}

/// POST /api/request-prediction/icons - Submit an icon job only.
pub async fn request_icons(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<IconTasksResponse>, ApiError> {
    let params = resolve(&state, &pairs)?;
    let icon_task = submit(&state, ModelKind::IconsV2, &params).await;
    Ok(Json(IconTasksResponse { icon_task }))
}

fn resolve(state: &AppState, pairs: &[(String, String)]) -> Result<PredictionParams, ApiError> {
    let mut params = PredictionParams::from_pairs(pairs)?;
    params.pixels_per_meter = params.pixels_per_meter.or(state.config.default_pixels_per_meter);
    Ok(params)
}

async fn submit(state: &AppState, kind: ModelKind, params: &PredictionParams) -> TaskHandle {
    let id = state.jobs.submit(kind, params.clone()).await;
    TaskHandle {
        id,
        status: "PENDING".to_string(),
    }
}
