// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Service modules for job execution and storage.

pub mod blob_store;
pub mod jobs;
pub mod models;
pub mod processor;

pub use blob_store::{Blob, BlobStore};
pub use jobs::{JobFailure, JobOutput, JobQueue, JobRecord, JobState};
pub use models::{Models, RegistryLoader};
pub use processor::{process_prediction, ProcessedPrediction};
