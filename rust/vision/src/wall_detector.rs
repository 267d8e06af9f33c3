// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wall, railing and opening reconstruction from semantic segmentation

use crate::contour::scores_to_shape;
use crate::error::{Result, VisionError};
use crate::image_ops::{crop, crop_scores, dilate_scores, max_into, pad_centered, threshold_scores, ScoreMap, PAD_COLOR};
use crate::line_ops::{extend_across, find_corners, percentile, probabilistic_hough, profile_line, HoughParams};
use crate::predictor::Predictor;
use crate::skeleton::{distance_transform, skeletonize};
use crate::tiling::{generate_tiles, Tile};
use crate::types::{ClassLabel, Prediction};
use floorplan_geometry::segment::{distance_to_point, interpolate, project};
use floorplan_geometry::{align_openings, segment_rectangle, EndCap};
use geo::{Coord, Line, MultiPolygon, Polygon, Rect};
use image::{Luma, RgbImage};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Output channels of the segmentation model, in channel order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentationLabel {
    Background,
    Spaces,
    Separators,
    Walls,
    Railings,
    Openings,
    Windows,
    Doors,
}

impl SegmentationLabel {
    pub const ALL: [SegmentationLabel; 8] = [
        SegmentationLabel::Background,
        SegmentationLabel::Spaces,
        SegmentationLabel::Separators,
        SegmentationLabel::Walls,
        SegmentationLabel::Railings,
        SegmentationLabel::Openings,
        SegmentationLabel::Windows,
        SegmentationLabel::Doors,
    ];

    pub fn channel(self) -> usize {
        self as usize
    }
}

/// A per-tile semantic segmentation model
pub trait SegmentationModel: Send + Sync {
    /// One score map per [`SegmentationLabel`], each the size of the tile
    fn predict_scores(&self, tile: &RgbImage) -> Result<Vec<ScoreMap>>;
}

impl<S: SegmentationModel + ?Sized> SegmentationModel for Box<S> {
    fn predict_scores(&self, tile: &RgbImage) -> Result<Vec<ScoreMap>> {
        (**self).predict_scores(tile)
    }
}

/// Settings for skeleton/Hough rectangle extraction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RectangleConfig {
    /// Scores strictly above this are foreground
    pub pred_threshold: f32,
    pub hough: HoughParams,
    /// Lower bound on the sampled half width
    pub segment_min_width: f64,
    pub segment_min_length: f64,
    /// Percentile of the width profile used as the rectangle half width
    pub width_percentile: f64,
    /// Percentile of the width profile compared against `segment_min_width`
    pub min_width_percentile: f64,
    /// How far segments are stretched when looking for corners
    pub corner_scale_distance: f64,
    pub cap: EndCap,
}

impl RectangleConfig {
    pub fn walls() -> Self {
        Self {
            pred_threshold: 0.08,
            hough: HoughParams {
                threshold: 11,
                min_line_length: 13,
                max_line_gap: 15,
                angle_count: 64,
            },
            segment_min_width: 1.0,
            segment_min_length: 10.0,
            corner_scale_distance: 30.0,
            ..Self::default()
        }
    }

    pub fn railings() -> Self {
        Self {
            segment_min_width: 0.5,
            segment_min_length: 5.0,
            ..Self::default()
        }
    }
}

impl Default for RectangleConfig {
    fn default() -> Self {
        Self {
            pred_threshold: 0.5,
            hough: HoughParams::default(),
            segment_min_width: 1.0,
            segment_min_length: 20.0,
            width_percentile: 25.0,
            min_width_percentile: 50.0,
            corner_scale_distance: 20.0,
            cap: EndCap::Flat,
        }
    }
}

/// Rebuild long thin structures in a score map as rectangles
///
/// The thresholded mask is skeletonized and Hough segments are detected on
/// the skeleton. Each segment is extended across the frame, cut at the
/// corners lying on it, and every piece between consecutive corners whose
/// medial-axis width profile is wide and long enough becomes a rectangle.
/// Segments that never meet another one have no corners and produce
/// nothing.
pub fn extract_rectangles(scores: &ScoreMap, config: &RectangleConfig) -> Vec<Polygon<f64>> {
    let (width, height) = scores.dimensions();
    let mask = threshold_scores(scores, config.pred_threshold);
    if mask.area() == 0 {
        return Vec::new();
    }

    let distance = distance_transform(&mask);
    let skeleton = skeletonize(&mask);
    let segments = probabilistic_hough(&skeleton, &config.hough);
    let corners = find_corners(&segments, config.corner_scale_distance);

    let frame = Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: width as f64, y: height as f64 });
    let rectangles: Vec<Polygon<f64>> = segments
        .iter()
        .filter_map(|segment| extend_across(segment, &frame))
        .flat_map(|line| rectangles_along(&line, &corners, &distance, width, height, config))
        .collect();

    debug!(
        segments = segments.len(),
        corners = corners.len(),
        rectangles = rectangles.len(),
        "Extracted rectangles"
    );
    rectangles
}

fn rectangles_along(
    line: &Line<f64>,
    corners: &[Coord<f64>],
    distance: &[f32],
    width: u32,
    height: u32,
    config: &RectangleConfig,
) -> Vec<Polygon<f64>> {
    let mut stops: Vec<f64> = corners
        .iter()
        .filter(|corner| distance_to_point(line, **corner) < config.segment_min_length / 2.0)
        .map(|corner| project(line, *corner))
        .collect();
    stops.sort_by(|a, b| a.total_cmp(b));

    stops
        .windows(2)
        .filter_map(|pair| {
            let start = interpolate(line, pair[0]);
            let end = interpolate(line, pair[1]);
            let widths = profile_line(distance, width, height, start, end);

            let min_width = percentile(&widths, config.min_width_percentile);
            let half_width = percentile(&widths, config.width_percentile);
            let length = pair[1] - pair[0];
            if min_width > config.segment_min_width && length > config.segment_min_length {
                segment_rectangle(&Line::new(start, end), half_width, config.cap)
            } else {
                None
            }
        })
        .collect()
}

/// Wall score: strongest separator-like channel minus the dilated railings
pub fn wall_scores(maps: &[ScoreMap]) -> ScoreMap {
    let channel = |label: SegmentationLabel| &maps[label.channel()];
    let railings = dilate_scores(channel(SegmentationLabel::Railings));
    let sources = [
        SegmentationLabel::Separators,
        SegmentationLabel::Walls,
        SegmentationLabel::Openings,
        SegmentationLabel::Doors,
        SegmentationLabel::Windows,
    ];

    let (w, h) = railings.dimensions();
    ScoreMap::from_fn(w, h, |x, y| {
        let strongest = sources
            .iter()
            .map(|label| channel(*label).get_pixel(x, y).0[0])
            .fold(f32::MIN, f32::max);
        Luma([(strongest - railings.get_pixel(x, y).0[0]).clamp(0.0, 1.0)])
    })
}

/// Wall predictor over a semantic segmentation model
#[derive(Debug)]
pub struct WallPredictor<S> {
    model: S,
    tile_size: u32,
    overlap: u32,
}

impl<S: SegmentationModel> WallPredictor<S> {
    pub const TILE_SIZE: u32 = 1024;
    pub const TILE_OVERLAP: u32 = 128;

    pub fn new(model: S) -> Self {
        Self {
            model,
            tile_size: Self::TILE_SIZE,
            overlap: Self::TILE_OVERLAP,
        }
    }

    /// Custom tile layout; the overlap must be smaller than the tile
    pub fn with_tiling(model: S, tile_size: u32, overlap: u32) -> Result<Self> {
        if tile_size == 0 || overlap >= tile_size {
            return Err(VisionError::Config(format!(
                "overlap {overlap} must be smaller than tile size {tile_size}"
            )));
        }
        Ok(Self { model, tile_size, overlap })
    }

    /// Full-image score maps, combined across tiles by element-wise maximum
    pub fn predict_scores(&self, image: &RgbImage) -> Result<Vec<ScoreMap>> {
        let (width, height) = image.dimensions();
        let tiles = generate_tiles(width, height, self.tile_size, self.tile_size - self.overlap)?;

        let per_tile = tiles
            .par_iter()
            .map(|tile| self.predict_tile(image, tile).map(|maps| (*tile, maps)))
            .collect::<Result<Vec<_>>>()?;

        let mut combined = vec![ScoreMap::new(width, height); SegmentationLabel::ALL.len()];
        for (tile, maps) in per_tile {
            for (target, source) in combined.iter_mut().zip(&maps) {
                max_into(target, source, tile.x1, tile.y1);
            }
        }
        Ok(combined)
    }

    fn predict_tile(&self, image: &RgbImage, tile: &Tile) -> Result<Vec<ScoreMap>> {
        let patch = crop(image, tile.x1, tile.y1, tile.width(), tile.height());
        let (padded, (pad_x, pad_y)) = pad_centered(&patch, self.tile_size, self.tile_size, PAD_COLOR);

        let maps = self.model.predict_scores(&padded)?;
        if maps.len() != SegmentationLabel::ALL.len() {
            return Err(VisionError::Model(format!(
                "expected {} score channels, got {}",
                SegmentationLabel::ALL.len(),
                maps.len()
            )));
        }
        if let Some(map) = maps.iter().find(|map| map.dimensions() != padded.dimensions()) {
            return Err(VisionError::Model(format!(
                "score map is {:?}, tile is {:?}",
                map.dimensions(),
                padded.dimensions()
            )));
        }

        debug!(row = tile.row, col = tile.col, "Segmented tile");
        Ok(maps
            .iter()
            .map(|map| crop_scores(map, pad_x, pad_y, tile.width(), tile.height()))
            .collect())
    }
}

impl<S: SegmentationModel> Predictor for WallPredictor<S> {
    /// Walls, then railings, then doors, then windows
    fn predict(&self, image: &RgbImage) -> Result<Prediction> {
        let maps = self.predict_scores(image)?;

        let walls = extract_rectangles(&wall_scores(&maps), &RectangleConfig::walls());
        let railings = extract_rectangles(
            &maps[SegmentationLabel::Railings.channel()],
            &RectangleConfig::railings(),
        );
        let doors = aligned_openings(&maps[SegmentationLabel::Doors.channel()], &walls);
        let windows = aligned_openings(&maps[SegmentationLabel::Windows.channel()], &walls);

        let mut prediction = Prediction::new();
        for (label, polygons) in [
            (ClassLabel::Wall, walls),
            (ClassLabel::Railing, railings),
            (ClassLabel::Door, doors),
            (ClassLabel::Window, windows),
        ] {
            for polygon in polygons {
                prediction.push(label, MultiPolygon::new(vec![polygon]));
            }
        }
        Ok(prediction)
    }
}

/// Opening polygons snapped into every wall they touch
fn aligned_openings(scores: &ScoreMap, walls: &[Polygon<f64>]) -> Vec<Polygon<f64>> {
    let openings = scores_to_shape(scores, 0.001);
    align_openings(&openings.0, walls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Area, BoundingRect};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Walls of a 100 x 100 room, 7 px thick, inside a 140 x 140 image
    fn room_scores() -> ScoreMap {
        ScoreMap::from_fn(140, 140, |x, y| {
            let inside = (20..127).contains(&x) && (20..127).contains(&y);
            let hollow = (27..120).contains(&x) && (27..120).contains(&y);
            Luma([if inside && !hollow { 1.0 } else { 0.0 }])
        })
    }

    /// Scores dark pixels as walls
    struct BandModel {
        calls: AtomicUsize,
    }

    impl SegmentationModel for BandModel {
        fn predict_scores(&self, tile: &RgbImage) -> Result<Vec<ScoreMap>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let (w, h) = tile.dimensions();
            Ok(SegmentationLabel::ALL
                .iter()
                .map(|label| {
                    ScoreMap::from_fn(w, h, |x, y| {
                        let value = match label {
                            SegmentationLabel::Walls if tile.get_pixel(x, y).0[0] < 128 => 0.9,
                            _ => 0.0,
                        };
                        Luma([value])
                    })
                })
                .collect())
        }
    }

    struct WrongChannels;

    impl SegmentationModel for WrongChannels {
        fn predict_scores(&self, tile: &RgbImage) -> Result<Vec<ScoreMap>> {
            Ok(vec![ScoreMap::new(tile.width(), tile.height())])
        }
    }

    #[test]
    fn test_presets() {
        let walls = RectangleConfig::walls();
        assert_eq!(walls.pred_threshold, 0.08);
        assert_eq!(walls.hough.angle_count, 64);
        assert_eq!(walls.width_percentile, 25.0);
        assert_eq!(walls.min_width_percentile, 50.0);

        let railings = RectangleConfig::railings();
        assert_eq!(railings.pred_threshold, 0.5);
        assert_eq!(railings.hough, HoughParams::default());
        assert_eq!(railings.segment_min_length, 5.0);
        assert_eq!(railings.cap, EndCap::Flat);
    }

    #[test]
    fn test_room_outline_becomes_rectangles() {
        let scores = room_scores();
        let rectangles = extract_rectangles(&scores, &RectangleConfig::walls());

        assert!(rectangles.len() >= 4, "got {} rectangles", rectangles.len());
        for rectangle in &rectangles {
            let bounds = rectangle.bounding_rect().unwrap();
            assert!(bounds.min().x >= 0.0 && bounds.min().y >= 0.0);
            assert!(bounds.max().x <= 140.0 && bounds.max().y <= 140.0);
            assert!(rectangle.unsigned_area() > 0.0);
        }
    }

    #[test]
    fn test_isolated_segment_has_no_corners() {
        let scores = ScoreMap::from_fn(100, 40, |x, y| {
            Luma([if (10..90).contains(&x) && (17..24).contains(&y) { 1.0 } else { 0.0 }])
        });
        assert!(extract_rectangles(&scores, &RectangleConfig::walls()).is_empty());
    }

    #[test]
    fn test_empty_scores() {
        let scores = ScoreMap::new(50, 50);
        assert!(extract_rectangles(&scores, &RectangleConfig::default()).is_empty());
    }

    #[test]
    fn test_wall_scores_subtract_railings() {
        let mut maps = vec![ScoreMap::new(5, 5); 8];
        maps[SegmentationLabel::Walls.channel()] = ScoreMap::from_pixel(5, 5, Luma([0.7]));
        maps[SegmentationLabel::Doors.channel()].put_pixel(0, 0, Luma([0.9]));
        maps[SegmentationLabel::Railings.channel()].put_pixel(4, 4, Luma([0.5]));

        let scores = wall_scores(&maps);
        assert_eq!(scores.get_pixel(0, 0).0[0], 0.9);
        assert_eq!(scores.get_pixel(2, 2).0[0], 0.7);
        // Railing dilated over its 3x3 neighbourhood
        assert!((scores.get_pixel(3, 3).0[0] - 0.2).abs() < 1e-6);
        assert_eq!(scores.get_pixel(1, 1).0[0], 0.7);
    }

    #[test]
    fn test_tiles_combine_by_maximum() {
        let mut image = RgbImage::from_pixel(300, 200, PAD_COLOR);
        for x in 0..300 {
            for y in 95..105 {
                image.put_pixel(x, y, image::Rgb([0, 0, 0]));
            }
        }

        let model = BandModel { calls: AtomicUsize::new(0) };
        let predictor = WallPredictor::with_tiling(model, 128, 32).unwrap();
        let maps = predictor.predict_scores(&image).unwrap();

        assert_eq!(maps.len(), 8);
        let walls = &maps[SegmentationLabel::Walls.channel()];
        assert_eq!(walls.dimensions(), (300, 200));
        assert!((0..300).all(|x| walls.get_pixel(x, 100).0[0] == 0.9));
        assert!((0..300).all(|x| walls.get_pixel(x, 10).0[0] == 0.0));
        assert!(predictor.model.calls.load(Ordering::SeqCst) > 1);
    }

    #[test]
    fn test_model_output_is_validated() {
        let predictor = WallPredictor::with_tiling(WrongChannels, 64, 16).unwrap();
        let result = predictor.predict_scores(&RgbImage::new(50, 50));
        assert!(matches!(result, Err(VisionError::Model(_))));
    }

    #[test]
    fn test_invalid_tiling() {
        assert!(matches!(
            WallPredictor::with_tiling(WrongChannels, 64, 64),
            Err(VisionError::Config(_))
        ));
    }
}
