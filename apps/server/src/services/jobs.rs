// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Asynchronous prediction jobs.
//!
//! Submission records a pending job and returns its id at once; the work
//! runs on a spawned task that hands the CPU-bound part to the blocking
//! pool under a timeout. A job settles exactly once, so every later poll
//! sees the same artifacts.

use super::blob_store::BlobStore;
use super::models::Models;
use super::processor::{process_prediction, ProcessedPrediction};
use crate::error::ApiError;
use crate::types::{PredictionParams, ResultFormat};
use floorplan_vision::{from_geojson, ModelKind, Prediction, VisionError};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Why a job failed.
#[derive(Debug, Clone, PartialEq)]
pub enum JobFailure {
    /// The input image was missing or undecodable.
    InputImage(String),
    Failed(String),
}

impl From<VisionError> for JobFailure {
    fn from(err: VisionError) -> Self {
        match err {
            VisionError::InputImage(msg) => JobFailure::InputImage(msg),
            other => JobFailure::Failed(other.to_string()),
        }
    }
}

impl From<JobFailure> for ApiError {
    fn from(failure: JobFailure) -> Self {
        match failure {
            JobFailure::InputImage(msg) => ApiError::InputImage(msg),
            JobFailure::Failed(msg) => ApiError::JobFailed(msg),
        }
    }
}

/// Summary of a finished job; the shapes themselves live in the blob store.
#[derive(Debug, Clone, PartialEq)]
pub struct JobOutput {
    pub width: u32,
    pub height: u32,
    pub shape_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobState {
    Pending,
    Ready(JobOutput),
    Failed(JobFailure),
}

impl JobState {
    pub fn status(&self) -> &'static str {
        match self {
            JobState::Pending => "PENDING",
            JobState::Ready(_) => "SUCCESS",
            JobState::Failed(_) => "FAILURE",
        }
    }
}

#[derive(Debug, Clone)]
pub struct JobRecord {
    pub id: Uuid,
    pub kind: ModelKind,
    pub image_name: String,
    pub state: JobState,
}

impl JobRecord {
    /// Name of this job's artifact in the given format.
    pub fn blob_name(&self, format: ResultFormat) -> String {
        format!("{}.{}", self.id, format.extension())
    }
}

/// Job table plus the resources jobs run against.
pub struct JobQueue {
    jobs: RwLock<FxHashMap<Uuid, JobRecord>>,
    blobs: Arc<BlobStore>,
    models: Arc<Models>,
    timeout: Duration,
}

impl JobQueue {
    pub fn new(blobs: Arc<BlobStore>, models: Arc<Models>, timeout: Duration) -> Self {
        Self {
            jobs: RwLock::new(FxHashMap::default()),
            blobs,
            models,
            timeout,
        }
    }

    /// Record a pending job and start it. Never fails; problems surface
    /// when the result is retrieved.
    pub async fn submit(self: &Arc<Self>, kind: ModelKind, params: PredictionParams) -> Uuid {
        let id = Uuid::new_v4();
        let record = JobRecord {
            id,
            kind,
            image_name: params.image_name.clone(),
            state: JobState::Pending,
        };
        self.jobs.write().await.insert(id, record);

        tracing::info!(
            job_id = %id,
            model = %kind,
            image_name = %params.image_name,
            regions = params.rois.len(),
            pixels_per_meter = ?params.pixels_per_meter,
            "Job submitted"
        );

        let queue = Arc::clone(self);
        tokio::spawn(async move {
            queue.run(id, kind, params).await;
        });

        id
    }

    pub async fn get(&self, id: &Uuid) -> Option<JobRecord> {
        self.jobs.read().await.get(id).cloned()
    }

    /// Records of `ids` once every one of them has finished successfully.
    pub async fn ready(&self, ids: &[Uuid]) -> Result<Vec<(JobRecord, JobOutput)>, ApiError> {
        let jobs = self.jobs.read().await;
        let mut ready = Vec::with_capacity(ids.len());
        let mut pending = 0usize;

        for id in ids {
            let record = jobs
                .get(id)
                .ok_or_else(|| ApiError::NotFound(format!("Unknown task: {}", id)))?;
            match &record.state {
                JobState::Ready(output) => ready.push((record.clone(), output.clone())),
                JobState::Failed(failure) => return Err(failure.clone().into()),
                JobState::Pending => pending += 1,
            }
        }

        if pending > 0 {
            return Err(ApiError::NotReady(format!("{} of {} tasks still running", pending, ids.len())));
        }
        Ok(ready)
    }

    /// Read a finished job's shapes back from its stored GeoJSON.
    pub async fn load_prediction(&self, record: &JobRecord) -> Result<Prediction, ApiError> {
        let key = BlobStore::result_key(&record.blob_name(ResultFormat::Json));
        let blob = self
            .blobs
            .get(&key)
            .await?
            .ok_or_else(|| ApiError::Blob(format!("Missing artifact for task {}", record.id)))?;
        let text = String::from_utf8(blob.data).map_err(|e| ApiError::Blob(e.to_string()))?;
        Ok(from_geojson(&text)?)
    }

    async fn run(&self, id: Uuid, kind: ModelKind, params: PredictionParams) {
        let state = match self.execute(id, kind, &params).await {
            Ok(output) => JobState::Ready(output),
            Err(failure) => {
                tracing::warn!(job_id = %id, model = %kind, failure = ?failure, "Job failed");
                JobState::Failed(failure)
            }
        };

        if let Some(record) = self.jobs.write().await.get_mut(&id) {
            record.state = state;
        }
    }

    async fn execute(&self, id: Uuid, kind: ModelKind, params: &PredictionParams) -> Result<JobOutput, JobFailure> {
        let image = self
            .blobs
            .get(&BlobStore::image_key(&params.image_name))
            .await
            .map_err(|e| JobFailure::Failed(e.to_string()))?
            .ok_or_else(|| JobFailure::InputImage(format!("Image not found: {}", params.image_name)))?;

        let models = Arc::clone(&self.models);
        let rois = params.rois.clone();
        let pixels_per_meter = params.pixels_per_meter;
        let task = tokio::task::spawn_blocking(move || {
            let registry = models.registry()?;
            process_prediction(&registry, kind, &image.data, &rois, pixels_per_meter)
        });

        let processed: ProcessedPrediction = match tokio::time::timeout(self.timeout, task).await {
            Err(_) => {
                return Err(JobFailure::Failed(format!(
                    "Prediction timed out after {}s",
                    self.timeout.as_secs()
                )))
            }
            Ok(Err(join_error)) => return Err(JobFailure::Failed(join_error.to_string())),
            Ok(Ok(result)) => result?,
        };

        for (format, body) in [
            (ResultFormat::Json, processed.geojson.as_bytes()),
            (ResultFormat::Svg, processed.svg.as_bytes()),
        ] {
            let key = BlobStore::result_key(&format!("{}.{}", id, format.extension()));
            self.blobs
                .put(&key, body, format.content_type())
                .await
                .map_err(|e| JobFailure::Failed(e.to_string()))?;
        }

        tracing::info!(
            job_id = %id,
            model = %kind,
            shapes = processed.prediction.len(),
            width = processed.width,
            height = processed.height,
            elapsed_ms = processed.elapsed_ms,
            "Job complete"
        );

        Ok(JobOutput {
            width: processed.width,
            height: processed.height,
            shape_count: processed.prediction.len(),
        })
    }
}

impl std::fmt::Debug for JobQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobQueue")
            .field("models", &self.models)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use floorplan_vision::ModelRegistry;

    async fn queue() -> Arc<JobQueue> {
        let dir = std::env::temp_dir().join(format!("floorplan-jobs-{}", Uuid::new_v4()));
        let blobs = Arc::new(BlobStore::new(&dir.to_string_lossy()).await);
        let models = Arc::new(Models::new(Arc::new(|| Ok(ModelRegistry::new()))));
        Arc::new(JobQueue::new(blobs, models, Duration::from_secs(5)))
    }

    async fn settle(queue: &JobQueue, id: Uuid) -> JobState {
        for _ in 0..200 {
            let state = queue.get(&id).await.map(|r| r.state);
            match state {
                Some(JobState::Pending) | None => tokio::time::sleep(Duration::from_millis(10)).await,
                Some(state) => return state,
            }
        }
        JobState::Pending
    }

    fn params(image_name: &str) -> PredictionParams {
        PredictionParams {
            image_name: image_name.into(),
            pixels_per_meter: None,
            rois: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_missing_image_fails_as_input_error() {
        let queue = queue().await;
        let id = queue.submit(ModelKind::Walls, params("absent")).await;

        assert!(matches!(settle(&queue, id).await, JobState::Failed(JobFailure::InputImage(_))));
    }

    #[tokio::test]
    async fn test_unknown_model_fails() {
        let queue = queue().await;
        let mut png = Vec::new();
        image::RgbImage::new(8, 8)
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        queue.blobs.put(&BlobStore::image_key("plan"), &png, "image/png").await.unwrap();

        let id = queue.submit(ModelKind::Walls, params("plan")).await;
        assert!(matches!(settle(&queue, id).await, JobState::Failed(JobFailure::Failed(_))));
    }

    #[tokio::test]
    async fn test_fan_in_reports_unknown_task() {
        let queue = queue().await;
        let result = queue.ready(&[Uuid::new_v4()]).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }
}
