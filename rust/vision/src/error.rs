// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for recognition operations
pub type Result<T> = std::result::Result<T, VisionError>;

/// Errors that can occur during floorplan recognition
#[derive(Error, Debug)]
pub enum VisionError {
    /// Invalid predictor setup; raised at construction, never retried
    #[error("Configuration error: {0}")]
    Config(String),

    /// The input image could not be decoded
    #[error("Input image error: {0}")]
    InputImage(String),

    /// A model returned output that does not fit its contract
    #[error("Model error: {0}")]
    Model(String),

    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Unknown class label: {0}")]
    UnknownLabel(String),

    #[error("Geometry error: {0}")]
    Geometry(#[from] floorplan_geometry::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
