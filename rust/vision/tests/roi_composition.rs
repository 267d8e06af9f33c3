// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use approx::assert_relative_eq;
use floorplan_vision::{
    calculate_statistics, classical_registry, from_geojson, to_geojson, ClassLabel, FloorplanPredictor,
    ModelKind, ModelRegistry, Prediction, Predictor, Result, Roi,
};
use geo::{BoundingRect, MultiPolygon};
use floorplan_geometry::box_polygon;
use image::{Rgb, RgbImage};

/// Returns a box half the size of its input, centred in it
struct CentredBoxModel;

impl Predictor for CentredBoxModel {
    fn predict(&self, image: &RgbImage) -> Result<Prediction> {
        let (w, h) = (image.width() as f64, image.height() as f64);
        let mut prediction = Prediction::new();
        prediction.push(
            ClassLabel::Wall,
            MultiPolygon::new(vec![box_polygon(w / 4.0, h / 4.0, 3.0 * w / 4.0, 3.0 * h / 4.0)]),
        );
        Ok(prediction)
    }
}

fn bounds(shape: &MultiPolygon<f64>) -> (f64, f64, f64, f64) {
    let rect = shape.bounding_rect().unwrap();
    (rect.min().x, rect.min().y, rect.max().x, rect.max().y)
}

fn assert_bounds(shape: &MultiPolygon<f64>, expected: (f64, f64, f64, f64)) {
    let (minx, miny, maxx, maxy) = bounds(shape);
    assert_relative_eq!(minx, expected.0, epsilon = 1e-9);
    assert_relative_eq!(miny, expected.1, epsilon = 1e-9);
    assert_relative_eq!(maxx, expected.2, epsilon = 1e-9);
    assert_relative_eq!(maxy, expected.3, epsilon = 1e-9);
}

#[test]
fn test_canonical_scale_is_identity() {
    let image = RgbImage::new(200, 200);
    let prediction = FloorplanPredictor::default()
        .predict(&CentredBoxModel, &image, &[Roi::new(0, 0, 100, 100)], Some(40.0))
        .unwrap();

    assert_eq!(prediction.len(), 1);
    assert_bounds(&prediction.shapes()[0], (25.0, 25.0, 75.0, 75.0));
}

#[test]
fn test_rescaled_region_maps_back() {
    let image = RgbImage::new(200, 200);
    let prediction = FloorplanPredictor::default()
        .predict(&CentredBoxModel, &image, &[Roi::new(50, 50, 100, 100)], Some(80.0))
        .unwrap();

    assert_bounds(&prediction.shapes()[0], (62.5, 62.5, 87.5, 87.5));
}

#[test]
fn test_regions_are_concatenated_in_order() {
    let image = RgbImage::new(200, 200);
    let prediction = FloorplanPredictor::default()
        .predict(
            &CentredBoxModel,
            &image,
            &[Roi::new(0, 0, 50, 50), Roi::new(50, 50, 100, 100)],
            Some(40.0),
        )
        .unwrap();

    assert_eq!(prediction.len(), 2);
    assert_bounds(&prediction.shapes()[0], (12.5, 12.5, 37.5, 37.5));
    assert_bounds(&prediction.shapes()[1], (62.5, 62.5, 87.5, 87.5));
}

#[test]
fn test_overlapping_regions_are_not_deduplicated() {
    let image = RgbImage::new(100, 100);
    let roi = Roi::new(10, 10, 90, 90);
    let prediction = FloorplanPredictor::default()
        .predict(&CentredBoxModel, &image, &[roi, roi], None)
        .unwrap();

    assert_eq!(prediction.len(), 2);
    assert_eq!(prediction.shapes()[0], prediction.shapes()[1]);
}

#[test]
fn test_registry_prediction_with_explicit_regions() {
    let registry = ModelRegistry::new().with(ModelKind::IconsV2, CentredBoxModel);
    let image = RgbImage::new(200, 200);
    let prediction = FloorplanPredictor::default()
        .predict_with(&registry, ModelKind::IconsV2, &image, &[Roi::new(0, 0, 100, 100)], Some(40.0))
        .unwrap();

    assert_bounds(&prediction.shapes()[0], (25.0, 25.0, 75.0, 75.0));
}

#[test]
fn test_without_regions_the_whole_image_is_used() {
    let registry = ModelRegistry::new().with(ModelKind::Walls, CentredBoxModel);
    let image = RgbImage::new(120, 80);
    let prediction = FloorplanPredictor::default()
        .predict_with(&registry, ModelKind::Walls, &image, &[], None)
        .unwrap();

    assert_bounds(&prediction.shapes()[0], (30.0, 20.0, 90.0, 60.0));
}

/// Three rooms in a row on a white sheet, walls 6 px thick
fn three_rooms() -> RgbImage {
    RgbImage::from_fn(320, 140, |x, y| {
        let outer = (20..300).contains(&x) && (20..120).contains(&y);
        let cell = (26..110).contains(&x) || (116..200).contains(&x) || (206..294).contains(&x);
        let inner = cell && (26..114).contains(&y);
        if outer && !inner {
            Rgb([0, 0, 0])
        } else {
            Rgb([255, 255, 255])
        }
    })
}

#[test]
fn test_classical_spaces_feed_statistics() {
    let registry = classical_registry().unwrap();
    let image = three_rooms();

    let spaces = FloorplanPredictor::default()
        .predict_with(&registry, ModelKind::Spaces, &image, &[], None)
        .unwrap();
    assert_eq!(spaces.len(), 3);

    // Survives the interchange format unchanged
    let restored = from_geojson(&to_geojson(&spaces).unwrap()).unwrap();
    assert_eq!(restored, spaces);

    let stats = calculate_statistics(&restored, 40.0).unwrap();
    assert_eq!(stats.room_count, 3);
    assert_eq!(stats.bathroom_count, 0);
    assert!(stats.room_space > 10.0);
}
