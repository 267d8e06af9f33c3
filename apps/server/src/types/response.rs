// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Response types for the API.

use floorplan_vision::Statistics;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where and under which name to upload an image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadUrlResponse {
    /// Relative URL accepting a `PUT` of the raw image bytes.
    pub url: String,
    pub image_name: String,
    pub content_type: String,
}

/// Acknowledgement of a stored image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageStoredResponse {
    pub image_name: String,
    pub size: usize,
    /// SHA256 of the stored bytes.
    pub digest: String,
}

/// Handle of a submitted job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskHandle {
    pub id: Uuid,
    pub status: String,
}

/// Handles returned by `POST /api/request-prediction`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionTasksResponse {
    pub wall_task: TaskHandle,
    pub icon_task: TaskHandle,
    pub spaces_task: TaskHandle,
}

/// Handles returned by `POST /api/request-prediction/icons`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IconTasksResponse {
    pub icon_task: TaskHandle,
}

/// Ready statistics over a set of jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub status: String,
    pub statistics: Statistics,
}

/// Serialized form of a job result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultFormat {
    Json,
    Svg,
}

impl ResultFormat {
    pub const ALL: [ResultFormat; 2] = [ResultFormat::Json, ResultFormat::Svg];

    pub fn extension(&self) -> &'static str {
        match self {
            ResultFormat::Json => "json",
            ResultFormat::Svg => "svg",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|format| format.extension() == ext)
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ResultFormat::Json => "application/geo+json",
            ResultFormat::Svg => "image/svg+xml",
        }
    }
}
