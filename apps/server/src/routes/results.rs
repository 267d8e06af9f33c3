// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Job result polling.

use crate::error::ApiError;
use crate::services::JobState;
use crate::types::ResultFormat;
use crate::AppState;
use axum::{
    extract::{Path, State},
    response::Redirect,
};
use uuid::Uuid;

/// GET /api/retrieve-results/:task_file - Poll `{id}.json` or `{id}.svg`.
///
/// Redirects to the stored artifact once the job is done.
pub async fn retrieve_results(
    State(state): State<AppState>,
    Path(task_file): Path<String>,
) -> Result<Redirect, ApiError> {
    let (id, format) = parse_task_file(&task_file)?;

    let record = state
        .jobs
        .get(&id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Unknown task: {}", id)))?;

    match record.state {
        JobState::Pending => Err(ApiError::NotReady(format!("Task {} is still running", id))),
        JobState::Failed(failure) => Err(failure.into()),
        JobState::Ready(_) => {
            tracing::debug!(job_id = %id, format = format.extension(), "Result ready");
            Ok(Redirect::temporary(&format!("/api/blobs/{}", record.blob_name(format))))
        }
    }
}

fn parse_task_file(task_file: &str) -> Result<(Uuid, ResultFormat), ApiError> {
    let not_found = || ApiError::NotFound(format!("No such result: {}", task_file));

    let (stem, extension) = task_file.rsplit_once('.').ok_or_else(not_found)?;
    let format = ResultFormat::from_extension(extension).ok_or_else(not_found)?;
    let id = Uuid::parse_str(stem).map_err(|_| not_found())?;
    Ok((id, format))
}
