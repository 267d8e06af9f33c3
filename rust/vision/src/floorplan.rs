// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Region-of-interest composition
//!
//! Each region is cropped out of the source image, rescaled to the
//! canonical resolution, predicted, and the shapes are mapped back into
//! the source frame. Results of several regions are concatenated without
//! deduplication, so overlapping regions can report the same object twice.

use crate::error::Result;
use crate::image_ops::{crop, resize};
use crate::predictor::{ModelKind, ModelRegistry, Predictor};
use crate::roi::rois_from_prediction;
use crate::types::{Prediction, Roi};
use floorplan_geometry::FrameTransform;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloorplanConfig {
    /// Resolution every model runs at
    pub target_pixels_per_meter: f64,
}

impl Default for FloorplanConfig {
    fn default() -> Self {
        Self {
            target_pixels_per_meter: FloorplanPredictor::TARGET_PIXELS_PER_METER,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FloorplanPredictor {
    config: FloorplanConfig,
}

impl FloorplanPredictor {
    pub const TARGET_PIXELS_PER_METER: f64 = 40.0;

    pub fn new(config: FloorplanConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FloorplanConfig {
        &self.config
    }

    /// Crop `roi` and, when the source scale is known, resize it to the
    /// target scale
    ///
    /// Resized dimensions are truncated and never drop below one pixel.
    pub fn crop_and_scale(&self, image: &RgbImage, roi: &Roi, pixels_per_meter: Option<f64>) -> RgbImage {
        let cropped = crop(image, roi.xmin, roi.ymin, roi.width(), roi.height());
        match pixels_per_meter {
            Some(ppm) => {
                let factor = self.config.target_pixels_per_meter / ppm;
                let width = ((factor * cropped.width() as f64) as u32).max(1);
                let height = ((factor * cropped.height() as f64) as u32).max(1);
                resize(&cropped, width, height)
            }
            None => cropped,
        }
    }

    /// Inverse of [`FloorplanPredictor::crop_and_scale`]: scale about the
    /// origin, then shift by the region offset
    pub fn transform_for(&self, roi: &Roi, pixels_per_meter: Option<f64>) -> Result<FrameTransform> {
        let (x, y) = (roi.xmin as f64, roi.ymin as f64);
        let target = self.config.target_pixels_per_meter;
        Ok(FrameTransform::for_region(x, y, pixels_per_meter.unwrap_or(target), target)?)
    }

    /// Run `model` on every region and compose the results in image space
    pub fn predict(
        &self,
        model: &dyn Predictor,
        image: &RgbImage,
        rois: &[Roi],
        pixels_per_meter: Option<f64>,
    ) -> Result<Prediction> {
        let (width, height) = image.dimensions();
        let mut composed = Prediction::new();

        for requested in rois {
            let roi = requested.clamped(width, height);
            if roi.is_empty() {
                warn!(?requested, "Skipping empty region of interest");
                continue;
            }

            let transform = self.transform_for(&roi, pixels_per_meter)?;
            let region = self.crop_and_scale(image, &roi, pixels_per_meter);
            let prediction = model.predict(&region)?;
            debug!(?roi, size = ?region.dimensions(), shapes = prediction.len(), "Region predicted");

            composed.extend(prediction.map_shapes(|shape| transform.apply(shape)));
        }

        Ok(composed)
    }

    /// Regions to predict in: the caller's, else the layout model's, else
    /// the whole image
    pub fn resolve_rois(&self, registry: &ModelRegistry, image: &RgbImage, requested: &[Roi]) -> Result<Vec<Roi>> {
        let (width, height) = image.dimensions();
        if !requested.is_empty() {
            return Ok(requested.to_vec());
        }

        if registry.contains(ModelKind::Roi) {
            let layout = registry.get(ModelKind::Roi)?.predict(image)?;
            let rois = rois_from_prediction(&layout, width, height);
            if !rois.is_empty() {
                return Ok(rois);
            }
            debug!("Layout model found no regions, using the whole image");
        }

        Ok(vec![Roi::full(width, height)])
    }

    /// Resolve regions and predict with the registered model for `kind`
    pub fn predict_with(
        &self,
        registry: &ModelRegistry,
        kind: ModelKind,
        image: &RgbImage,
        rois: &[Roi],
        pixels_per_meter: Option<f64>,
    ) -> Result<Prediction> {
        let model = registry.get(kind)?;
        let rois = self.resolve_rois(registry, image, rois)?;
        let prediction = self.predict(model.as_ref(), image, &rois, pixels_per_meter)?;

        info!(
            model = %kind,
            regions = rois.len(),
            shapes = prediction.len(),
            pixels_per_meter = ?pixels_per_meter,
            "Prediction complete"
        );
        Ok(prediction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VisionError;
    use crate::types::ClassLabel;
    use floorplan_geometry::{box_polygon, MultiPolygon};
    use geo::BoundingRect;

    /// Reports its input size as a shape
    struct SizeEcho;

    impl Predictor for SizeEcho {
        fn predict(&self, image: &RgbImage) -> Result<Prediction> {
            let (w, h) = image.dimensions();
            let mut prediction = Prediction::new();
            prediction.push(
                ClassLabel::Space,
                MultiPolygon::new(vec![box_polygon(0.0, 0.0, w as f64, h as f64)]),
            );
            Ok(prediction)
        }
    }

    struct NoRegions;

    impl Predictor for NoRegions {
        fn predict(&self, _image: &RgbImage) -> Result<Prediction> {
            Ok(Prediction::new())
        }
    }

    #[test]
    fn test_crop_without_scale() {
        let image = RgbImage::from_fn(4, 4, |x, y| image::Rgb([(x * 10 + y) as u8, 0, 0]));
        let predictor = FloorplanPredictor::default();
        let region = predictor.crop_and_scale(&image, &Roi::new(2, 2, 4, 4), None);
        assert_eq!(region.dimensions(), (2, 2));
        assert_eq!(region.get_pixel(0, 0).0[0], 22);
        assert_eq!(region.get_pixel(1, 1).0[0], 33);
    }

    #[test]
    fn test_scale_truncates_and_keeps_a_pixel() {
        let image = RgbImage::new(10, 7);
        let predictor = FloorplanPredictor::default();
        let half = predictor.crop_and_scale(&image, &Roi::full(10, 7), Some(80.0));
        assert_eq!(half.dimensions(), (5, 3));
        let tiny = predictor.crop_and_scale(&image, &Roi::full(10, 7), Some(4000.0));
        assert_eq!(tiny.dimensions(), (1, 1));
    }

    #[test]
    fn test_shapes_map_back_to_source_frame() {
        let predictor = FloorplanPredictor::default();
        let image = RgbImage::new(100, 100);
        let prediction = predictor
            .predict(&SizeEcho, &image, &[Roi::new(20, 40, 60, 80)], Some(20.0))
            .unwrap();

        // 40 x 40 crop doubled to 80 x 80, then halved back
        let rect = prediction.shapes()[0].bounding_rect().unwrap();
        assert_eq!((rect.min().x, rect.min().y), (20.0, 40.0));
        assert_eq!((rect.max().x, rect.max().y), (60.0, 80.0));
    }

    #[test]
    fn test_empty_rois_skipped() {
        let predictor = FloorplanPredictor::default();
        let image = RgbImage::new(50, 50);
        let prediction = predictor
            .predict(&SizeEcho, &image, &[Roi::new(60, 60, 80, 80), Roi::new(0, 0, 10, 10)], None)
            .unwrap();
        assert_eq!(prediction.len(), 1);
    }

    #[test]
    fn test_invalid_scale() {
        let predictor = FloorplanPredictor::default();
        let result = predictor.predict(&SizeEcho, &RgbImage::new(8, 8), &[Roi::full(8, 8)], Some(0.0));
        assert!(matches!(result, Err(VisionError::Geometry(_))));
    }

    #[test]
    fn test_resolve_rois() {
        let predictor = FloorplanPredictor::default();
        let image = RgbImage::new(30, 20);

        let explicit = [Roi::new(1, 2, 3, 4)];
        let empty = ModelRegistry::new();
        assert_eq!(predictor.resolve_rois(&empty, &image, &explicit).unwrap(), explicit.to_vec());
        assert_eq!(predictor.resolve_rois(&empty, &image, &[]).unwrap(), vec![Roi::full(30, 20)]);

        let layout = ModelRegistry::new().with(ModelKind::Roi, SizeEcho);
        assert_eq!(predictor.resolve_rois(&layout, &image, &[]).unwrap(), vec![Roi::full(30, 20)]);

        let nothing = ModelRegistry::new().with(ModelKind::Roi, NoRegions);
        assert_eq!(predictor.resolve_rois(&nothing, &image, &[]).unwrap(), vec![Roi::full(30, 20)]);
    }

    #[test]
    fn test_unknown_model() {
        let predictor = FloorplanPredictor::default();
        let result = predictor.predict_with(&ModelRegistry::new(), ModelKind::Walls, &RgbImage::new(4, 4), &[], None);
        assert!(matches!(result, Err(VisionError::UnknownModel(_))));
    }
}
