// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Prediction processing - runs on the blocking pool.

use floorplan_vision::{
    decode_image, to_geojson, to_svg, FloorplanPredictor, ModelKind, ModelRegistry, Prediction, Roi,
};
use std::time::Instant;

/// A finished prediction with its serialized artifacts.
#[derive(Debug, Clone)]
pub struct ProcessedPrediction {
    pub prediction: Prediction,
    pub width: u32,
    pub height: u32,
    pub geojson: String,
    pub svg: String,
    pub elapsed_ms: u64,
}

/// Decode `image_bytes`, predict with the `kind` model and serialize.
pub fn process_prediction(
    registry: &ModelRegistry,
    kind: ModelKind,
    image_bytes: &[u8],
    rois: &[Roi],
    pixels_per_meter: Option<f64>,
) -> floorplan_vision::Result<ProcessedPrediction> {
    let start = Instant::now();

    let image = decode_image(image_bytes)?;
    let (width, height) = image.dimensions();
    let prediction = FloorplanPredictor::default().predict_with(registry, kind, &image, rois, pixels_per_meter)?;

    let geojson = to_geojson(&prediction)?;
    let svg = to_svg(&prediction, width, height);

    Ok(ProcessedPrediction {
        prediction,
        width,
        height,
        geojson,
        svg,
        elapsed_ms: start.elapsed().as_millis() as u64,
    })
}
