// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Server configuration loaded from environment variables.

use std::str::FromStr;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port to listen on.
    pub port: u16,
    /// Directory backing the blob store (uploaded images and job artifacts).
    pub blob_dir: String,
    /// Maximum upload size in MB.
    pub max_image_size_mb: usize,
    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Upper bound on a single prediction job, in seconds.
    pub job_timeout_secs: u64,
    /// Number of rayon threads used for tile inference.
    pub worker_threads: usize,
    /// Load the model registry at startup instead of on the first job.
    pub preload_models: bool,
    /// Scale applied when a request does not carry `pixels_per_meter`.
    pub default_pixels_per_meter: Option<f64>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: env_or("PORT", defaults.port),
            blob_dir: std::env::var("BLOB_DIR").unwrap_or(defaults.blob_dir),
            max_image_size_mb: env_or("MAX_IMAGE_SIZE_MB", defaults.max_image_size_mb),
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs),
            job_timeout_secs: env_or("JOB_TIMEOUT_SECS", defaults.job_timeout_secs),
            worker_threads: env_or("WORKER_THREADS", defaults.worker_threads),
            preload_models: env_or("PRELOAD_MODELS", defaults.preload_models),
            default_pixels_per_meter: std::env::var("DEFAULT_PIXELS_PER_METER")
                .ok()
                .and_then(|value| value.parse::<f64>().ok())
                .filter(|ppm| *ppm > 0.0),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            blob_dir: "./.floorplan-blobs".into(),
            max_image_size_mb: 50,
            request_timeout_secs: 60,
            job_timeout_secs: 600,
            worker_threads: num_cpus::get(),
            preload_models: true,
            default_pixels_per_meter: None,
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}
