// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mask to polygon conversion by contour tracing

use crate::image_ops::{threshold_scores, ScoreMap};
use crate::mask::Mask;
use floorplan_geometry::{is_valid_polygon, minimum_rotated_rectangle, union_polygons};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use imageproc::contours::{find_contours, Contour};
use tracing::debug;

/// Trace every contour of a mask and union the valid ones
///
/// Hole contours lie inside their outer contour, so the union fills them:
/// a mask with an interior gap comes back as a solid shape. Self-touching
/// or degenerate contours are skipped. Coordinates are pixel centres in the
/// mask's image frame.
pub fn mask_to_shape(mask: &Mask) -> MultiPolygon<f64> {
    if mask.area() == 0 {
        return MultiPolygon::new(Vec::new());
    }

    // One pixel of margin so shapes touching the window edge still close
    let image = mask.to_gray_image(1);
    let (ox, oy) = (mask.x0() - 1, mask.y0() - 1);

    let contours = find_contours::<i32>(&image);
    let total = contours.len();
    let polygons: Vec<Polygon<f64>> = contours
        .iter()
        .filter_map(|contour| contour_polygon(contour, ox, oy))
        .collect();

    if polygons.len() < total {
        debug!(total, valid = polygons.len(), "Discarded invalid contours");
    }

    union_polygons(&polygons)
}

/// Threshold a score map and trace the result
pub fn scores_to_shape(scores: &ScoreMap, threshold: f32) -> MultiPolygon<f64> {
    mask_to_shape(&threshold_scores(scores, threshold))
}

/// Minimum rotated rectangle around a mask's traced shape
pub fn mask_to_rectangle(mask: &Mask) -> Option<Polygon<f64>> {
    minimum_rotated_rectangle(&mask_to_shape(mask))
}

fn contour_polygon(contour: &Contour<i32>, ox: i32, oy: i32) -> Option<Polygon<f64>> {
    let ring: Vec<Coord<f64>> = contour
        .points
        .iter()
        .map(|p| Coord {
            x: (p.x + ox) as f64,
            y: (p.y + oy) as f64,
        })
        .collect();

    let ring = remove_collinear(&ring);
    if ring.len() < 3 {
        return None;
    }

    let polygon = Polygon::new(LineString::from(ring), vec![]);
    is_valid_polygon(&polygon).then_some(polygon)
}

/// Drop vertices lying on the straight line between their neighbours
///
/// Traced contours carry one vertex per boundary pixel; only the turns matter.
fn remove_collinear(contour: &[Coord<f64>]) -> Vec<Coord<f64>> {
    if contour.len() <= 3 {
        return contour.to_vec();
    }

    let n = contour.len();
    let mut result = Vec::with_capacity(n);

    for i in 0..n {
        let prev = contour[(i + n - 1) % n];
        let curr = contour[i];
        let next = contour[(i + 1) % n];

        // Check if current point is collinear with prev and next, same direction
        let cross = (curr.x - prev.x) * (next.y - prev.y) - (curr.y - prev.y) * (next.x - prev.x);
        let forward = (curr.x - prev.x) * (next.x - curr.x) + (curr.y - prev.y) * (next.y - curr.y);

        if cross.abs() > 1e-9 || forward <= 0.0 {
            result.push(curr);
        }
    }

    result
}
