// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Counts and areas of a finished prediction

use crate::error::{Result, VisionError};
use crate::types::{ClassLabel, Prediction};
use floorplan_geometry::{union_all, MultiPolygon};
use geo::{Area, Intersects};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PIXELS_PER_METER: f64 = 40.0;

/// Room and element statistics, areas in square meters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub room_count: usize,
    pub bathroom_count: usize,
    pub room_space: f64,
    pub bathroom_space: f64,
    pub wall_count: usize,
    pub wall_space: f64,
    pub railing_count: usize,
    pub railing_space: f64,
    pub door_count: usize,
    pub door_space: f64,
    pub window_count: usize,
    pub window_space: f64,
    pub toilet_count: usize,
    pub toilet_space: f64,
    pub bathtub_count: usize,
    pub bathtub_space: f64,
    pub sink_count: usize,
    pub sink_space: f64,
    pub shower_count: usize,
    pub shower_space: f64,
    pub kitchen_count: usize,
    pub kitchen_space: f64,
}

impl Statistics {
    fn element_mut(&mut self, label: ClassLabel) -> Option<(&mut usize, &mut f64)> {
        match label {
            ClassLabel::Wall => Some((&mut self.wall_count, &mut self.wall_space)),
            ClassLabel::Railing => Some((&mut self.railing_count, &mut self.railing_space)),
            ClassLabel::Door => Some((&mut self.door_count, &mut self.door_space)),
            ClassLabel::Window => Some((&mut self.window_count, &mut self.window_space)),
            ClassLabel::Toilet => Some((&mut self.toilet_count, &mut self.toilet_space)),
            ClassLabel::Bathtub => Some((&mut self.bathtub_count, &mut self.bathtub_space)),
            ClassLabel::Sink => Some((&mut self.sink_count, &mut self.sink_space)),
            ClassLabel::Shower => Some((&mut self.shower_count, &mut self.shower_space)),
            ClassLabel::Kitchen => Some((&mut self.kitchen_count, &mut self.kitchen_space)),
            ClassLabel::Space | ClassLabel::Background | ClassLabel::Foreground => None,
        }
    }
}

/// Compute statistics for labeled shapes at `pixels_per_meter`
///
/// A space is a bathroom when it touches any bath fixture. Element counts
/// are the number of disjoint polygons after unioning each label, so
/// touching walls count once.
pub fn calculate_statistics(prediction: &Prediction, pixels_per_meter: f64) -> Result<Statistics> {
    if !(pixels_per_meter > 0.0) {
        return Err(VisionError::Config(format!(
            "pixels per meter must be positive, got {}",
            pixels_per_meter
        )));
    }
    let square_meters = |shape: &MultiPolygon<f64>| shape.unsigned_area() / (pixels_per_meter * pixels_per_meter);

    let fixtures: Vec<MultiPolygon<f64>> = prediction
        .iter()
        .filter(|(label, _)| label.is_bath_fixture())
        .map(|(_, shape)| shape.clone())
        .collect();
    let fixtures = union_all(&fixtures);

    let mut stats = Statistics::default();
    let (mut rooms, mut bathrooms) = (Vec::new(), Vec::new());
    for shape in prediction.shapes_with_label(ClassLabel::Space) {
        if !fixtures.0.is_empty() && shape.intersects(&fixtures) {
            bathrooms.push(shape);
        } else {
            rooms.push(shape);
        }
    }
    stats.room_count = rooms.len();
    stats.bathroom_count = bathrooms.len();
    stats.room_space = square_meters(&union_all(&rooms));
    stats.bathroom_space = square_meters(&union_all(&bathrooms));

    for label in ClassLabel::ALL {
        let shapes = prediction.shapes_with_label(label);
        if shapes.is_empty() {
            continue;
        }
        let merged = union_all(&shapes);
        let space = square_meters(&merged);
        if let Some((count, area)) = stats.element_mut(label) {
            *count = merged.0.len();
            *area = space;
        }
    }

    Ok(stats)
}
