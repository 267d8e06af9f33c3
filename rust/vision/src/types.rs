// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core types for floorplan recognition

use crate::error::VisionError;
use floorplan_geometry::{box_polygon, MultiPolygon};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Semantic class of a detected shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClassLabel {
    Wall,
    Door,
    Window,
    Kitchen,
    Toilet,
    Sink,
    Shower,
    Bathtub,
    Railing,
    Space,
    Background,
    Foreground,
}

impl ClassLabel {
    pub const ALL: [ClassLabel; 12] = [
        ClassLabel::Wall,
        ClassLabel::Door,
        ClassLabel::Window,
        ClassLabel::Kitchen,
        ClassLabel::Toilet,
        ClassLabel::Sink,
        ClassLabel::Shower,
        ClassLabel::Bathtub,
        ClassLabel::Railing,
        ClassLabel::Space,
        ClassLabel::Background,
        ClassLabel::Foreground,
    ];

    /// Fixtures that only ever appear in bathrooms
    pub const BATH_FIXTURES: [ClassLabel; 4] = [
        ClassLabel::Toilet,
        ClassLabel::Bathtub,
        ClassLabel::Sink,
        ClassLabel::Shower,
    ];

    /// Canonical upper-case name used in interchange formats
    pub fn name(&self) -> &'static str {
        match self {
            ClassLabel::Wall => "WALL",
            ClassLabel::Door => "DOOR",
            ClassLabel::Window => "WINDOW",
            ClassLabel::Kitchen => "KITCHEN",
            ClassLabel::Toilet => "TOILET",
            ClassLabel::Sink => "SINK",
            ClassLabel::Shower => "SHOWER",
            ClassLabel::Bathtub => "BATHTUB",
            ClassLabel::Railing => "RAILING",
            ClassLabel::Space => "SPACE",
            ClassLabel::Background => "BACKGROUND",
            ClassLabel::Foreground => "FOREGROUND",
        }
    }

    /// Fill colour for rendered output
    pub fn color(&self) -> [u8; 3] {
        match self {
            ClassLabel::Wall => [42, 121, 161],
            ClassLabel::Window => [255, 0, 0],
            ClassLabel::Railing => [128, 0, 128],
            ClassLabel::Door => [0, 255, 0],
            ClassLabel::Toilet => [0, 255, 255],
            ClassLabel::Bathtub => [255, 0, 255],
            ClassLabel::Sink => [0, 128, 0],
            ClassLabel::Shower => [192, 126, 24],
            ClassLabel::Kitchen => [255, 255, 0],
            ClassLabel::Space => [250, 250, 210],
            ClassLabel::Background => [0, 0, 0],
            ClassLabel::Foreground => [128, 128, 128],
        }
    }

    pub fn is_bath_fixture(&self) -> bool {
        Self::BATH_FIXTURES.contains(self)
    }
}

impl fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ClassLabel {
    type Err = VisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ClassLabel::ALL
            .iter()
            .find(|label| label.name().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| VisionError::UnknownLabel(s.to_string()))
    }
}

/// A scored, labeled shape produced by a model
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub label: ClassLabel,
    pub shape: MultiPolygon<f64>,
    pub score: f32,
}

/// Labeled shapes as index-aligned parallel arrays
///
/// Order carries no meaning beyond the pairing of `labels[i]` with `shapes[i]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Prediction {
    labels: Vec<ClassLabel>,
    shapes: Vec<MultiPolygon<f64>>,
}

impl Prediction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one shape; empty shapes are ignored
    pub fn push(&mut self, label: ClassLabel, shape: MultiPolygon<f64>) {
        if shape.0.is_empty() {
            return;
        }
        self.labels.push(label);
        self.shapes.push(shape);
    }

    pub fn extend(&mut self, other: Prediction) {
        self.labels.extend(other.labels);
        self.shapes.extend(other.shapes);
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[ClassLabel] {
        &self.labels
    }

    pub fn shapes(&self) -> &[MultiPolygon<f64>] {
        &self.shapes
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClassLabel, &MultiPolygon<f64>)> {
        self.labels.iter().copied().zip(self.shapes.iter())
    }

    /// Shapes carrying `label`
    pub fn shapes_with_label(&self, label: ClassLabel) -> Vec<MultiPolygon<f64>> {
        self.iter()
            .filter(|(l, _)| *l == label)
            .map(|(_, shape)| shape.clone())
            .collect()
    }

    /// Apply `f` to every shape, keeping labels
    pub fn map_shapes<F>(&self, f: F) -> Prediction
    where
        F: Fn(&MultiPolygon<f64>) -> MultiPolygon<f64>,
    {
        let mut mapped = Prediction::new();
        for (label, shape) in self.iter() {
            mapped.push(label, f(shape));
        }
        mapped
    }
}

impl FromIterator<Detection> for Prediction {
    fn from_iter<I: IntoIterator<Item = Detection>>(iter: I) -> Self {
        let mut prediction = Prediction::new();
        for detection in iter {
            prediction.push(detection.label, detection.shape);
        }
        prediction
    }
}

/// Region of interest in image pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Roi {
    pub xmin: u32,
    pub ymin: u32,
    pub xmax: u32,
    pub ymax: u32,
}

impl Roi {
    pub fn new(xmin: u32, ymin: u32, xmax: u32, ymax: u32) -> Self {
        Self { xmin, ymin, xmax, ymax }
    }

    /// The full frame of a `width` × `height` image
    pub fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn width(&self) -> u32 {
        self.xmax.saturating_sub(self.xmin)
    }

    pub fn height(&self) -> u32 {
        self.ymax.saturating_sub(self.ymin)
    }

    /// Restrict to a `width` × `height` image
    pub fn clamped(&self, width: u32, height: u32) -> Self {
        Self::new(
            self.xmin.min(width),
            self.ymin.min(height),
            self.xmax.min(width),
            self.ymax.min(height),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

/// Axis-aligned bounding box in floating point pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl BoundingBox {
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self { xmin, ymin, xmax, ymax }
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox::new(
            self.xmin.min(other.xmin),
            self.ymin.min(other.ymin),
            self.xmax.max(other.xmax),
            self.ymax.max(other.ymax),
        )
    }

    pub fn translated(&self, dx: f64, dy: f64) -> BoundingBox {
        BoundingBox::new(self.xmin + dx, self.ymin + dy, self.xmax + dx, self.ymax + dy)
    }

    /// Scale about the box centre
    pub fn scaled_about_center(&self, factor: f64) -> BoundingBox {
        let cx = (self.xmin + self.xmax) / 2.0;
        let cy = (self.ymin + self.ymax) / 2.0;
        let hw = self.width() * factor / 2.0;
        let hh = self.height() * factor / 2.0;
        BoundingBox::new(cx - hw, cy - hh, cx + hw, cy + hh)
    }

    pub fn to_shape(&self) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![box_polygon(self.xmin, self.ymin, self.xmax, self.ymax)])
    }
}
