// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Classical (non-learned) model backends
//!
//! Threshold and morphology stand-ins for the learned models, good enough
//! for clean line drawings and for running the pipeline without weights.

use crate::error::Result;
use crate::image_ops::{dilate, ink_mask, invert, morphological_close, morphological_open, ScoreMap};
use crate::mask::Mask;
use crate::predictor::{ModelKind, ModelRegistry};
use crate::roi::{BoxDetector, RoiConfig, RoiPredictor, ScoredBox};
use crate::spaces::{SpaceConfig, SpacePredictor};
use crate::tiled::{Instance, InstanceModel};
use crate::types::BoundingBox;
use crate::wall_detector::{SegmentationLabel, SegmentationModel, WallPredictor};
use image::imageops::grayscale;
use image::{GrayImage, Luma, RgbImage};
use imageproc::region_labelling::{connected_components, Connectivity};
use rustc_hash::FxHashMap;
use tracing::debug;

/// Grey levels below this count as ink
pub const INK_THRESHOLD: u8 = 128;

fn ink(image: &RgbImage) -> GrayImage {
    ink_mask(&grayscale(image), INK_THRESHOLD)
}

/// The bounding box of all ink as a single layout region
#[derive(Debug, Clone, Copy)]
pub struct InkRoiDetector {
    pub input_size: u32,
}

impl Default for InkRoiDetector {
    fn default() -> Self {
        Self { input_size: 512 }
    }
}

impl BoxDetector for InkRoiDetector {
    fn input_size(&self) -> (u32, u32) {
        (self.input_size, self.input_size)
    }

    fn detect(&self, image: &RgbImage) -> Result<Vec<ScoredBox>> {
        let ink = ink(image);
        let bounds = Mask::from_gray(&ink, 0, 0).foreground_bounds();
        Ok(bounds
            .map(|(x0, y0, x1, y1)| ScoredBox {
                bbox: BoundingBox::new(x0 as f64, y0 as f64, x1 as f64, y1 as f64),
                confidence: 1.0,
            })
            .into_iter()
            .collect())
    }
}

/// Thick ink strokes scored as walls
///
/// Gaps up to two pixels are closed, then strokes thinner than
/// `2 * min_stroke_radius + 1` pixels (text, hatching, dimension lines)
/// are opened away.
#[derive(Debug, Clone, Copy)]
pub struct InkWallSegmenter {
    pub min_stroke_radius: u8,
}

impl Default for InkWallSegmenter {
    fn default() -> Self {
        Self { min_stroke_radius: 1 }
    }
}

impl SegmentationModel for InkWallSegmenter {
    fn predict_scores(&self, tile: &RgbImage) -> Result<Vec<ScoreMap>> {
        let strokes = morphological_open(&morphological_close(&ink(tile), 1), self.min_stroke_radius);
        let (w, h) = strokes.dimensions();
        let wall = |x: u32, y: u32| if strokes.get_pixel(x, y).0[0] > 0 { 1.0 } else { 0.0 };

        Ok(SegmentationLabel::ALL
            .iter()
            .map(|label| match label {
                SegmentationLabel::Walls => ScoreMap::from_fn(w, h, |x, y| Luma([wall(x, y)])),
                SegmentationLabel::Background => ScoreMap::from_fn(w, h, |x, y| Luma([1.0 - wall(x, y)])),
                _ => ScoreMap::new(w, h),
            })
            .collect())
    }
}

/// Ink-free regions fully enclosed by ink, one instance each
#[derive(Debug, Clone, Copy)]
pub struct EnclosedSpaceModel {
    /// Smaller regions are noise (letters, hatching cells)
    pub min_area: usize,
}

impl Default for EnclosedSpaceModel {
    fn default() -> Self {
        Self { min_area: 400 }
    }
}

#[derive(Debug, Clone, Copy)]
struct Region {
    xmin: u32,
    ymin: u32,
    xmax: u32,
    ymax: u32,
    area: usize,
}

impl InstanceModel for EnclosedSpaceModel {
    fn predict_instances(&self, tile: &RgbImage) -> Result<Vec<Instance>> {
        let free = invert(&dilate(&ink(tile), 1));
        let labels = connected_components(&free, Connectivity::Four, Luma([0u8]));
        let (w, h) = labels.dimensions();

        let mut regions: FxHashMap<u32, Region> = FxHashMap::default();
        for (x, y, pixel) in labels.enumerate_pixels() {
            let id = pixel.0[0];
            if id == 0 {
                continue;
            }
            let region = regions.entry(id).or_insert(Region {
                xmin: x,
                ymin: y,
                xmax: x,
                ymax: y,
                area: 0,
            });
            region.xmin = region.xmin.min(x);
            region.ymin = region.ymin.min(y);
            region.xmax = region.xmax.max(x);
            region.ymax = region.ymax.max(y);
            region.area += 1;
        }

        let mut ids: Vec<u32> = regions.keys().copied().collect();
        ids.sort_unstable();

        let instances: Vec<Instance> = ids
            .into_iter()
            .filter_map(|id| {
                let r = regions[&id];
                let touches_edge = r.xmin == 0 || r.ymin == 0 || r.xmax + 1 == w || r.ymax + 1 == h;
                if touches_edge || r.area < self.min_area {
                    return None;
                }
                let (mw, mh) = (r.xmax - r.xmin + 1, r.ymax - r.ymin + 1);
                let mask = Mask::from_fn(r.xmin as i32, r.ymin as i32, mw, mh, |x, y| {
                    labels.get_pixel(r.xmin + x, r.ymin + y).0[0] == id
                });
                Some(Instance {
                    mask,
                    bbox: BoundingBox::new(r.xmin as f64, r.ymin as f64, (r.xmax + 1) as f64, (r.ymax + 1) as f64),
                    class_index: 0,
                    score: 1.0,
                })
            })
            .collect();

        debug!(regions = regions.len(), enclosed = instances.len(), "Enclosed regions found");
        Ok(instances)
    }
}

/// Registry of classical backends for layout, walls and spaces
///
/// Icons have no classical backend; requesting them reports an unknown
/// model.
pub fn classical_registry() -> Result<ModelRegistry> {
    Ok(ModelRegistry::new()
        .with(
            ModelKind::Roi,
            RoiPredictor::new(InkRoiDetector::default(), RoiConfig::default()),
        )
        .with(ModelKind::Walls, WallPredictor::new(InkWallSegmenter::default()))
        .with(
            ModelKind::Spaces,
            SpacePredictor::new(EnclosedSpaceModel::default(), SpaceConfig::default())?,
        ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::Predictor;
    use crate::types::ClassLabel;
    use image::Rgb;

    /// Two rooms side by side, walls 5 px thick, on a white sheet
    fn two_rooms() -> RgbImage {
        RgbImage::from_fn(200, 120, |x, y| {
            let outer = (20..180).contains(&x) && (20..100).contains(&y);
            let inner_left = (25..95).contains(&x) && (25..95).contains(&y);
            let inner_right = (100..175).contains(&x) && (25..95).contains(&y);
            if outer && !inner_left && !inner_right {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        })
    }

    #[test]
    fn test_roi_detector_finds_ink_extent() {
        let boxes = InkRoiDetector::default().detect(&two_rooms()).unwrap();
        assert_eq!(boxes.len(), 1);
        let b = boxes[0].bbox;
        assert_eq!((b.xmin, b.ymin), (20.0, 20.0));
        assert!(b.xmax >= 179.0 && b.ymax >= 99.0);

        let blank = RgbImage::from_pixel(10, 10, Rgb([255, 255, 255]));
        assert!(InkRoiDetector::default().detect(&blank).unwrap().is_empty());
    }

    #[test]
    fn test_wall_segmenter_drops_thin_lines() {
        let mut image = two_rooms();
        for x in 30..90 {
            image.put_pixel(x, 60, Rgb([0, 0, 0]));
        }
        let maps = InkWallSegmenter::default().predict_scores(&image).unwrap();
        assert_eq!(maps.len(), SegmentationLabel::ALL.len());

        let walls = &maps[SegmentationLabel::Walls.channel()];
        assert_eq!(walls.get_pixel(22, 50).0[0], 1.0);
        assert_eq!(walls.get_pixel(60, 60).0[0], 0.0);
        assert_eq!(maps[SegmentationLabel::Background.channel()].get_pixel(60, 60).0[0], 1.0);
    }

    #[test]
    fn test_enclosed_regions_become_instances() {
        let instances = EnclosedSpaceModel::default().predict_instances(&two_rooms()).unwrap();
        assert_eq!(instances.len(), 2);
        for instance in &instances {
            assert!(instance.bbox.xmin > 20.0 && instance.bbox.xmax < 180.0);
            assert!(instance.mask.area() > 3000);
        }
    }

    #[test]
    fn test_classical_pipeline_runs() {
        let registry = classical_registry().unwrap();
        assert_eq!(registry.kinds(), vec![ModelKind::Roi, ModelKind::Walls, ModelKind::Spaces]);

        let spaces = registry.get(ModelKind::Spaces).unwrap().predict(&two_rooms()).unwrap();
        assert_eq!(spaces.len(), 2);
        assert!(spaces.labels().iter().all(|label| *label == ClassLabel::Space));

        let layout = registry.get(ModelKind::Roi).unwrap().predict(&two_rooms()).unwrap();
        assert_eq!(layout.labels(), &[ClassLabel::Foreground]);
    }
}
