// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 2D Boolean Operations on floorplan shapes
//!
//! This module provides polygon union, difference and intersection using the
//! i_overlay crate. Shapes are `geo::MultiPolygon<f64>` values; every operation
//! returns a new shape and never mutates its inputs.

use crate::segment::segments_intersect;
use geo::{Coord, Line, LineString, MultiPolygon, Polygon};
use i_overlay::core::fill_rule::FillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;

/// Minimum area threshold - rings smaller than this are considered degenerate
const MIN_AREA_THRESHOLD: f64 = 1e-10;

/// i_overlay path: an open ring of points
type Path = Vec<[f64; 2]>;

/// An empty shape
pub fn empty() -> MultiPolygon<f64> {
    MultiPolygon::new(Vec::new())
}

/// Union of any number of shapes into one (possibly multi-part) shape
///
/// Overlapping and touching parts are dissolved; holes are preserved.
pub fn union_all(shapes: &[MultiPolygon<f64>]) -> MultiPolygon<f64> {
    let subject: Vec<Path> = shapes.iter().flat_map(multipolygon_to_paths).collect();
    unary_union(subject)
}

/// Union of single polygons
pub fn union_polygons(polygons: &[Polygon<f64>]) -> MultiPolygon<f64> {
    let subject: Vec<Path> = polygons.iter().flat_map(polygon_to_paths).collect();
    unary_union(subject)
}

/// Perform 2D boolean union: a ∪ b
pub fn union(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    overlay(a, b, OverlayRule::Union)
}

/// Perform 2D boolean difference: a - b
pub fn difference(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    overlay(a, b, OverlayRule::Difference)
}

/// Perform 2D boolean intersection: a ∩ b
pub fn intersection(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    overlay(a, b, OverlayRule::Intersect)
}

/// Check if a polygon is usable as a reconstructed shape
///
/// Every ring needs at least three distinct vertices, a non-zero area and no
/// self-intersections (including touching vertices and folded-back spikes).
pub fn is_valid_polygon(polygon: &Polygon<f64>) -> bool {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .all(|ring| is_simple_ring(&open_ring(ring)))
}

/// Compute the signed area of a 2D ring
/// Positive = counter-clockwise, Negative = clockwise
pub fn compute_signed_area(contour: &[Coord<f64>]) -> f64 {
    if contour.len() < 3 {
        return 0.0;
    }

    let mut area = 0.0;
    let n = contour.len();

    for i in 0..n {
        let j = (i + 1) % n;
        area += contour[i].x * contour[j].y;
        area -= contour[j].x * contour[i].y;
    }

    area * 0.5
}

/// Ensure contour has counter-clockwise winding (positive area)
pub fn ensure_ccw(contour: &[Coord<f64>]) -> Vec<Coord<f64>> {
    if compute_signed_area(contour) < 0.0 {
        contour.iter().rev().cloned().collect()
    } else {
        contour.to_vec()
    }
}

/// Ensure contour has clockwise winding (for holes)
pub fn ensure_cw(contour: &[Coord<f64>]) -> Vec<Coord<f64>> {
    if compute_signed_area(contour) > 0.0 {
        contour.iter().rev().cloned().collect()
    } else {
        contour.to_vec()
    }
}

/// Check if a point is inside a ring using ray casting
pub fn point_in_ring(point: Coord<f64>, ring: &LineString<f64>) -> bool {
    let contour = &ring.0;
    if contour.len() < 3 {
        return false;
    }

    let mut inside = false;
    let n = contour.len();

    let mut j = n - 1;
    for i in 0..n {
        let pi = contour[i];
        let pj = contour[j];

        if ((pi.y > point.y) != (pj.y > point.y))
            && (point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x)
        {
            inside = !inside;
        }
        j = i;
    }

    inside
}

/// Check if a point lies inside a polygon (inside the exterior, outside every hole)
pub fn point_in_polygon(point: Coord<f64>, polygon: &Polygon<f64>) -> bool {
    point_in_ring(point, polygon.exterior())
        && !polygon.interiors().iter().any(|hole| point_in_ring(point, hole))
}

/// Check if a point lies inside any part of a shape
pub fn point_in_shape(point: Coord<f64>, shape: &MultiPolygon<f64>) -> bool {
    shape.0.iter().any(|polygon| point_in_polygon(point, polygon))
}

// ============================================================================
// Internal Helper Functions
// ============================================================================

fn overlay(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>, rule: OverlayRule) -> MultiPolygon<f64> {
    let subject = multipolygon_to_paths(a);
    let clip = multipolygon_to_paths(b);

    if subject.is_empty() && clip.is_empty() {
        return empty();
    }

    // Result is Vec<Vec<Vec<[f64; 2]>>> - Vec of shapes, each shape is Vec of contours
    let result = subject.overlay(&clip, rule, FillRule::NonZero);
    shapes_to_multipolygon(result)
}

fn unary_union(subject: Vec<Path>) -> MultiPolygon<f64> {
    if subject.is_empty() {
        return empty();
    }

    // Consistent winding plus NonZero makes overlapping subject contours dissolve
    let clip: Vec<Path> = Vec::new();
    let result = subject.overlay(&clip, OverlayRule::Union, FillRule::NonZero);
    shapes_to_multipolygon(result)
}

fn multipolygon_to_paths(shape: &MultiPolygon<f64>) -> Vec<Path> {
    shape.0.iter().flat_map(polygon_to_paths).collect()
}

/// Convert a polygon to i_overlay paths: outer ring counter-clockwise, holes clockwise
fn polygon_to_paths(polygon: &Polygon<f64>) -> Vec<Path> {
    let outer = open_ring(polygon.exterior());
    if !has_area(&outer) {
        return Vec::new();
    }

    let mut paths = Vec::with_capacity(1 + polygon.interiors().len());
    paths.push(contour_to_path(&ensure_ccw(&outer)));

    for hole in polygon.interiors() {
        let hole = open_ring(hole);
        if has_area(&hole) {
            paths.push(contour_to_path(&ensure_cw(&hole)));
        }
    }

    paths
}

fn contour_to_path(contour: &[Coord<f64>]) -> Path {
    contour.iter().map(|c| [c.x, c.y]).collect()
}

/// Convert i_overlay result shapes back to a MultiPolygon
///
/// i_overlay returns Vec<Vec<Vec<[f64; 2]>>> where:
/// - Outer Vec: list of shapes
/// - Middle Vec: list of contours per shape (first is outer, rest are holes)
/// - Inner Vec: list of points per contour
fn shapes_to_multipolygon(shapes: Vec<Vec<Path>>) -> MultiPolygon<f64> {
    let polygons = shapes
        .into_iter()
        .filter_map(|shape| {
            let mut contours = shape.into_iter().map(path_to_contour);
            let outer = contours.next().filter(|c| has_area(c))?;
            let holes = contours
                .filter(|c| has_area(c))
                .map(LineString::from)
                .collect();
            Some(Polygon::new(LineString::from(outer), holes))
        })
        .collect();

    MultiPolygon::new(polygons)
}

fn path_to_contour(path: Path) -> Vec<Coord<f64>> {
    path.into_iter().map(|[x, y]| Coord { x, y }).collect()
}

/// Ring coordinates without the closing duplicate
fn open_ring(ring: &LineString<f64>) -> Vec<Coord<f64>> {
    let mut coords = ring.0.clone();
    if coords.len() > 1 && coords.first() == coords.last() {
        coords.pop();
    }
    coords
}

fn has_area(contour: &[Coord<f64>]) -> bool {
    contour.len() >= 3 && compute_signed_area(contour).abs() > MIN_AREA_THRESHOLD
}

fn is_simple_ring(contour: &[Coord<f64>]) -> bool {
    if !has_area(contour) {
        return false;
    }

    let n = contour.len();
    let edges: Vec<Line<f64>> = (0..n)
        .map(|i| Line::new(contour[i], contour[(i + 1) % n]))
        .collect();

    for i in 0..n {
        if edges[i].start == edges[i].end {
            return false;
        }
        for j in (i + 1)..n {
            let adjacent = j == i + 1 || (i == 0 && j == n - 1);
            if adjacent {
                if folds_back(&edges[i], &edges[j], j == i + 1) {
                    return false;
                }
            } else if segments_intersect(&edges[i], &edges[j]) {
                return false;
            }
        }
    }

    true
}

/// Adjacent edges that overlap along a common direction form a zero-width spike
fn folds_back(a: &Line<f64>, b: &Line<f64>, a_then_b: bool) -> bool {
    let (first, second) = if a_then_b { (a, b) } else { (b, a) };
    let shared = first.end;
    let u = (first.start.x - shared.x, first.start.y - shared.y);
    let v = (second.end.x - shared.x, second.end.y - shared.y);
    let cross = u.0 * v.1 - u.1 * v.0;
    let dot = u.0 * v.0 + u.1 * v.1;
    cross.abs() <= MIN_AREA_THRESHOLD && dot > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rectangle::box_polygon;
    use approx::assert_relative_eq;
    use geo::Area;

    fn square(minx: f64, miny: f64, maxx: f64, maxy: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![box_polygon(minx, miny, maxx, maxy)])
    }

    #[test]
    fn test_compute_signed_area_ccw() {
        let contour = vec![
            Coord { x: 0.0, y: 0.0 },
            Coord { x: 1.0, y: 0.0 },
            Coord { x: 1.0, y: 1.0 },
            Coord { x: 0.0, y: 1.0 },
        ];
        assert_relative_eq!(compute_signed_area(&contour), 1.0);
        assert_relative_eq!(compute_signed_area(&ensure_cw(&contour)), -1.0);
    }

    #[test]
    fn test_union_of_overlapping_squares() {
        let result = union_all(&[square(0.0, 0.0, 10.0, 10.0), square(5.0, 0.0, 15.0, 10.0)]);
        assert_eq!(result.0.len(), 1);
        assert_relative_eq!(result.unsigned_area(), 150.0, epsilon = 1e-9);
    }

    #[test]
    fn test_union_keeps_disjoint_parts() {
        let result = union_all(&[square(0.0, 0.0, 10.0, 10.0), square(20.0, 0.0, 30.0, 10.0)]);
        assert_eq!(result.0.len(), 2);
        assert_relative_eq!(result.unsigned_area(), 200.0, epsilon = 1e-9);
    }

    #[test]
    fn test_union_of_nothing_is_empty() {
        assert!(union_all(&[]).0.is_empty());
        assert!(union_polygons(&[]).0.is_empty());
    }

    #[test]
    fn test_difference_creates_hole() {
        let result = difference(&square(0.0, 0.0, 10.0, 10.0), &square(2.0, 2.0, 8.0, 8.0));
        assert_eq!(result.0.len(), 1);
        assert_eq!(result.0[0].interiors().len(), 1);
        assert_relative_eq!(result.unsigned_area(), 64.0, epsilon = 1e-9);
    }

    #[test]
    fn test_intersection() {
        let result = intersection(&square(0.0, 0.0, 10.0, 10.0), &square(5.0, 5.0, 15.0, 15.0));
        assert_relative_eq!(result.unsigned_area(), 25.0, epsilon = 1e-9);
        let disjoint = intersection(&square(0.0, 0.0, 1.0, 1.0), &square(5.0, 5.0, 6.0, 6.0));
        assert!(disjoint.0.is_empty());
    }

    #[test]
    fn test_validity() {
        assert!(is_valid_polygon(&box_polygon(0.0, 0.0, 3.0, 3.0)));

        // Bow-tie
        let bow_tie = Polygon::new(
            LineString::from(vec![(0.0, 0.0), (2.0, 2.0), (2.0, 0.0), (0.0, 2.0)]),
            vec![],
        );
        assert!(!is_valid_polygon(&bow_tie));

        // Two squares touching at a single vertex
        let pinched = Polygon::new(
            LineString::from(vec![
                (0.0, 0.0),
                (1.0, 0.0),
                (1.0, 1.0),
                (2.0, 1.0),
                (2.0, 2.0),
                (1.0, 2.0),
                (1.0, 1.0),
                (0.0, 1.0),
            ]),
            vec![],
        );
        assert!(!is_valid_polygon(&pinched));

        // Degenerate line
        let flat = Polygon::new(LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]), vec![]);
        assert!(!is_valid_polygon(&flat));
    }

    #[test]
    fn test_point_in_polygon_respects_holes() {
        let ring = difference(&square(0.0, 0.0, 10.0, 10.0), &square(2.0, 2.0, 8.0, 8.0));
        assert!(point_in_shape(Coord { x: 1.0, y: 1.0 }, &ring));
        assert!(!point_in_shape(Coord { x: 5.0, y: 5.0 }, &ring));
        assert!(!point_in_shape(Coord { x: 11.0, y: 5.0 }, &ring));
    }
}
