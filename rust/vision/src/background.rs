// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::error::Result;
use crate::types::{ClassLabel, Prediction};
use floorplan_geometry::{derive_background, MultiPolygon, DEFAULT_CLOSING_DISTANCE};

/// Uncovered image area as BACKGROUND shapes, one per polygon
pub fn background_prediction(prediction: &Prediction, width: u32, height: u32) -> Result<Prediction> {
    let polygons = derive_background(
        prediction.shapes(),
        width as f64,
        height as f64,
        DEFAULT_CLOSING_DISTANCE,
    )?;

    let mut background = Prediction::new();
    for polygon in polygons {
        background.push(ClassLabel::Background, MultiPolygon::new(vec![polygon]));
    }
    Ok(background)
}
