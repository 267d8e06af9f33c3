// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Coarse layout detection producing regions of interest

use crate::error::Result;
use crate::image_ops::resize;
use crate::predictor::Predictor;
use crate::types::{BoundingBox, ClassLabel, Prediction, Roi};
use floorplan_geometry::{box_polygon, intersection, union_all};
use geo::{BoundingRect, MultiPolygon};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Tolerance for snapping nearly-integral bounds before truncation
const SNAP_EPSILON: f64 = 1e-6;

/// A box in detector input coordinates with its confidence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredBox {
    pub bbox: BoundingBox,
    pub confidence: f32,
}

/// A first-pass box detector running at a fixed input resolution
pub trait BoxDetector: Send + Sync {
    /// `(width, height)` the detector expects
    fn input_size(&self) -> (u32, u32);

    /// Boxes in input-size pixel coordinates
    fn detect(&self, image: &RgbImage) -> Result<Vec<ScoredBox>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoiConfig {
    /// Boxes must score strictly above this
    pub confidence_threshold: f32,
    /// Growth factor applied about each box centre
    pub scale: f64,
}

impl Default for RoiConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,
            scale: 1.1,
        }
    }
}

/// Layout regions as FOREGROUND shapes
#[derive(Debug)]
pub struct RoiPredictor<D> {
    detector: D,
    config: RoiConfig,
}

impl<D: BoxDetector> RoiPredictor<D> {
    pub fn new(detector: D, config: RoiConfig) -> Self {
        Self { detector, config }
    }
}

impl<D: BoxDetector> Predictor for RoiPredictor<D> {
    fn predict(&self, image: &RgbImage) -> Result<Prediction> {
        let (width, height) = image.dimensions();
        let (input_w, input_h) = self.detector.input_size();
        let resized = resize(image, input_w, input_h);
        let boxes = self.detector.detect(&resized)?;

        let ratio_x = width as f64 / input_w as f64;
        let ratio_y = height as f64 / input_h as f64;
        let frame = MultiPolygon::new(vec![box_polygon(0.0, 0.0, width as f64, height as f64)]);

        let regions: Vec<MultiPolygon<f64>> = boxes
            .iter()
            .filter(|scored| scored.confidence > self.config.confidence_threshold)
            .map(|scored| {
                let b = scored.bbox;
                let rescaled = BoundingBox::new(b.xmin * ratio_x, b.ymin * ratio_y, b.xmax * ratio_x, b.ymax * ratio_y);
                intersection(&rescaled.scaled_about_center(self.config.scale).to_shape(), &frame)
            })
            .collect();

        let merged = union_all(&regions);
        debug!(detected = boxes.len(), regions = merged.0.len(), "Layout regions found");

        let mut prediction = Prediction::new();
        for polygon in merged {
            prediction.push(ClassLabel::Foreground, MultiPolygon::new(vec![polygon]));
        }
        Ok(prediction)
    }
}

/// Integer ROIs from the bounds of each predicted shape
///
/// Bounds are truncated toward zero, clamped to the image, and empty
/// regions dropped.
pub fn rois_from_prediction(prediction: &Prediction, width: u32, height: u32) -> Vec<Roi> {
    prediction
        .shapes()
        .iter()
        .flat_map(|shape| shape.0.iter())
        .filter_map(|polygon| polygon.bounding_rect())
        .map(|rect| {
            Roi::new(
                truncate(rect.min().x),
                truncate(rect.min().y),
                truncate(rect.max().x),
                truncate(rect.max().y),
            )
            .clamped(width, height)
        })
        .filter(|roi| !roi.is_empty())
        .collect()
}

fn truncate(value: f64) -> u32 {
    (value + SNAP_EPSILON).floor().max(0.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    struct FixedDetector {
        boxes: Vec<ScoredBox>,
    }

    impl BoxDetector for FixedDetector {
        fn input_size(&self) -> (u32, u32) {
            (100, 100)
        }

        fn detect(&self, image: &RgbImage) -> Result<Vec<ScoredBox>> {
            assert_eq!(image.dimensions(), (100, 100));
            Ok(self.boxes.clone())
        }
    }

    fn scored(xmin: f64, ymin: f64, xmax: f64, ymax: f64, confidence: f32) -> ScoredBox {
        ScoredBox {
            bbox: BoundingBox::new(xmin, ymin, xmax, ymax),
            confidence,
        }
    }

    #[test]
    fn test_boxes_rescaled_grown_and_filtered() {
        let detector = FixedDetector {
            boxes: vec![scored(10.0, 10.0, 50.0, 50.0, 0.9), scored(70.0, 70.0, 90.0, 90.0, 0.5)],
        };
        let predictor = RoiPredictor::new(detector, RoiConfig::default());
        let prediction = predictor.predict(&RgbImage::new(200, 100)).unwrap();

        assert_eq!(prediction.labels(), &[ClassLabel::Foreground]);
        let rect = prediction.shapes()[0].bounding_rect().unwrap();
        assert_relative_eq!(rect.min().x, 16.0, epsilon = 1e-4);
        assert_relative_eq!(rect.min().y, 8.0, epsilon = 1e-4);
        assert_relative_eq!(rect.max().x, 104.0, epsilon = 1e-4);
        assert_relative_eq!(rect.max().y, 52.0, epsilon = 1e-4);
    }

    #[test]
    fn test_overlapping_boxes_union_and_clip() {
        let detector = FixedDetector {
            boxes: vec![scored(0.0, 0.0, 60.0, 60.0, 0.8), scored(40.0, 40.0, 100.0, 100.0, 0.8)],
        };
        let predictor = RoiPredictor::new(detector, RoiConfig::default());
        let prediction = predictor.predict(&RgbImage::new(100, 100)).unwrap();

        assert_eq!(prediction.len(), 1);
        let rois = rois_from_prediction(&prediction, 100, 100);
        assert_eq!(rois, vec![Roi::new(0, 0, 100, 100)]);
    }

    #[test]
    fn test_rois_truncate_bounds() {
        let mut prediction = Prediction::new();
        prediction.push(
            ClassLabel::Foreground,
            MultiPolygon::new(vec![box_polygon(10.7, 5.2, 49.999_999_9, 80.9)]),
        );
        prediction.push(
            ClassLabel::Foreground,
            MultiPolygon::new(vec![box_polygon(3.0, 3.0, 3.5, 9.0)]),
        );
        assert_eq!(rois_from_prediction(&prediction, 60, 60), vec![Roi::new(10, 5, 50, 60)]);
    }
}
