// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Line segment primitives: scaling, projection, intersection and clipping

use crate::bool2d::point_in_shape;
use geo::{Coord, Line, MultiPolygon, Rect};
use nalgebra::Vector2;

/// Epsilon for floating point comparisons on segment parameters
const EPSILON: f64 = 1e-9;

/// Direction vector from start to end
pub fn direction(line: &Line<f64>) -> Vector2<f64> {
    Vector2::new(line.dx(), line.dy())
}

pub fn length(line: &Line<f64>) -> f64 {
    direction(line).norm()
}

pub fn midpoint(line: &Line<f64>) -> Coord<f64> {
    Coord {
        x: (line.start.x + line.end.x) / 2.0,
        y: (line.start.y + line.end.y) / 2.0,
    }
}

/// Scale a segment about its midpoint
pub fn scale_about_center(line: &Line<f64>, factor: f64) -> Line<f64> {
    let center = midpoint(line);
    let half = direction(line) * (factor / 2.0);
    Line::new(
        Coord { x: center.x - half.x, y: center.y - half.y },
        Coord { x: center.x + half.x, y: center.y + half.y },
    )
}

pub fn translate(line: &Line<f64>, offset: Vector2<f64>) -> Line<f64> {
    Line::new(
        Coord { x: line.start.x + offset.x, y: line.start.y + offset.y },
        Coord { x: line.end.x + offset.x, y: line.end.y + offset.y },
    )
}

/// Rotate a segment by 90 degrees about its midpoint
pub fn rotate_quarter_turn(line: &Line<f64>) -> Line<f64> {
    let center = midpoint(line);
    let half = direction(line) / 2.0;
    let normal = Vector2::new(-half.y, half.x);
    Line::new(
        Coord { x: center.x - normal.x, y: center.y - normal.y },
        Coord { x: center.x + normal.x, y: center.y + normal.y },
    )
}

/// Point at parameter `t` in [0, 1]
pub fn point_at(line: &Line<f64>, t: f64) -> Coord<f64> {
    Coord {
        x: line.start.x + line.dx() * t,
        y: line.start.y + line.dy() * t,
    }
}

/// Distance along the segment's direction from its start to the projection of `point`
pub fn project(line: &Line<f64>, point: Coord<f64>) -> f64 {
    let d = direction(line);
    let len = d.norm();
    if len < EPSILON {
        return 0.0;
    }
    Vector2::new(point.x - line.start.x, point.y - line.start.y).dot(&d) / len
}

/// Point on the (infinite) line through the segment at distance `s` from its start
pub fn interpolate(line: &Line<f64>, s: f64) -> Coord<f64> {
    let len = length(line);
    if len < EPSILON {
        return line.start;
    }
    point_at(line, s / len)
}

/// Euclidean distance from a point to the closest point of the segment
pub fn distance_to_point(line: &Line<f64>, point: Coord<f64>) -> f64 {
    let len = length(line);
    let t = if len < EPSILON {
        0.0
    } else {
        (project(line, point) / len).clamp(0.0, 1.0)
    };
    let closest = point_at(line, t);
    Vector2::new(point.x - closest.x, point.y - closest.y).norm()
}

fn cross(o: Coord<f64>, a: Coord<f64>, b: Coord<f64>) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

fn on_segment(p: Coord<f64>, line: &Line<f64>) -> bool {
    p.x >= line.start.x.min(line.end.x) - EPSILON
        && p.x <= line.start.x.max(line.end.x) + EPSILON
        && p.y >= line.start.y.min(line.end.y) - EPSILON
        && p.y <= line.start.y.max(line.end.y) + EPSILON
}

/// Closed-segment intersection test, including touching endpoints and collinear overlap
pub fn segments_intersect(a: &Line<f64>, b: &Line<f64>) -> bool {
    let d1 = cross(b.start, b.end, a.start);
    let d2 = cross(b.start, b.end, a.end);
    let d3 = cross(a.start, a.end, b.start);
    let d4 = cross(a.start, a.end, b.end);

    if ((d1 > EPSILON && d2 < -EPSILON) || (d1 < -EPSILON && d2 > EPSILON))
        && ((d3 > EPSILON && d4 < -EPSILON) || (d3 < -EPSILON && d4 > EPSILON))
    {
        return true;
    }

    (d1.abs() <= EPSILON && on_segment(a.start, b))
        || (d2.abs() <= EPSILON && on_segment(a.end, b))
        || (d3.abs() <= EPSILON && on_segment(b.start, a))
        || (d4.abs() <= EPSILON && on_segment(b.end, a))
}

/// Intersection point of two segments, `None` when they miss or are parallel
pub fn intersection_point(a: &Line<f64>, b: &Line<f64>) -> Option<Coord<f64>> {
    let da = direction(a);
    let db = direction(b);
    let denom = da.x * db.y - da.y * db.x;
    if denom.abs() < EPSILON {
        return None;
    }

    let offset = Vector2::new(b.start.x - a.start.x, b.start.y - a.start.y);
    let t = (offset.x * db.y - offset.y * db.x) / denom;
    let u = (offset.x * da.y - offset.y * da.x) / denom;

    if (-EPSILON..=1.0 + EPSILON).contains(&t) && (-EPSILON..=1.0 + EPSILON).contains(&u) {
        Some(point_at(a, t))
    } else {
        None
    }
}

/// Clip a segment to an axis-aligned rectangle (Liang-Barsky)
pub fn clip_to_rect(line: &Line<f64>, rect: &Rect<f64>) -> Option<Line<f64>> {
    let (min, max) = (rect.min(), rect.max());
    let (dx, dy) = (line.dx(), line.dy());
    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;

    let checks = [
        (-dx, line.start.x - min.x),
        (dx, max.x - line.start.x),
        (-dy, line.start.y - min.y),
        (dy, max.y - line.start.y),
    ];

    for (p, q) in checks {
        if p.abs() < EPSILON {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }

    Some(Line::new(point_at(line, t0), point_at(line, t1)))
}

/// Pieces of a segment lying inside a shape
///
/// Consecutive inside pieces are joined, so a segment crossing a convex
/// polygon yields exactly one piece. Pieces come back ordered from the
/// segment's start.
pub fn clip_to_shape(line: &Line<f64>, shape: &MultiPolygon<f64>) -> Vec<Line<f64>> {
    if length(line) < EPSILON {
        return Vec::new();
    }

    let mut params = vec![0.0, 1.0];
    for polygon in &shape.0 {
        for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
            for edge in ring.lines() {
                collect_crossings(line, &edge, &mut params);
            }
        }
    }

    params.retain(|t| (0.0..=1.0).contains(t));
    params.sort_by(|a, b| a.total_cmp(b));
    params.dedup_by(|a, b| (*a - *b).abs() < EPSILON);

    let mut pieces: Vec<(f64, f64)> = Vec::new();
    for window in params.windows(2) {
        let (t0, t1) = (window[0], window[1]);
        if t1 - t0 < EPSILON || !point_in_shape(point_at(line, (t0 + t1) / 2.0), shape) {
            continue;
        }
        match pieces.last_mut() {
            Some(last) if (last.1 - t0).abs() < EPSILON => last.1 = t1,
            _ => pieces.push((t0, t1)),
        }
    }

    pieces
        .into_iter()
        .map(|(t0, t1)| Line::new(point_at(line, t0), point_at(line, t1)))
        .collect()
}

/// Parameters along `line` where it meets `edge`, including collinear overlaps
fn collect_crossings(line: &Line<f64>, edge: &Line<f64>, params: &mut Vec<f64>) {
    let d = direction(line);
    let e = direction(edge);
    let denom = d.x * e.y - d.y * e.x;
    let offset = Vector2::new(edge.start.x - line.start.x, edge.start.y - line.start.y);

    if denom.abs() < EPSILON {
        // Parallel: only collinear edges contribute, through their endpoints
        if (offset.x * d.y - offset.y * d.x).abs() < EPSILON {
            let len_sq = d.norm_squared();
            for p in [edge.start, edge.end] {
                params.push(Vector2::new(p.x - line.start.x, p.y - line.start.y).dot(&d) / len_sq);
            }
        }
        return;
    }

    let t = (offset.x * e.y - offset.y * e.x) / denom;
    let u = (offset.x * d.y - offset.y * d.x) / denom;
    if (-EPSILON..=1.0 + EPSILON).contains(&u) {
        params.push(t);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rectangle::box_polygon;
    use approx::assert_relative_eq;

    fn line(x1: f64, y1: f64, x2: f64, y2: f64) -> Line<f64> {
        Line::new(Coord { x: x1, y: y1 }, Coord { x: x2, y: y2 })
    }

    #[test]
    fn test_scale_about_center() {
        let scaled = scale_about_center(&line(0.0, 0.0, 10.0, 0.0), 3.0);
        assert_relative_eq!(scaled.start.x, -10.0);
        assert_relative_eq!(scaled.end.x, 20.0);
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let rotated = rotate_quarter_turn(&line(0.0, 0.0, 10.0, 0.0));
        assert_relative_eq!(rotated.start.x, 5.0);
        assert_relative_eq!(rotated.start.y, -5.0);
        assert_relative_eq!(rotated.end.y, 5.0);
    }

    #[test]
    fn test_intersection_point() {
        let p = intersection_point(&line(0.0, 0.0, 10.0, 10.0), &line(0.0, 10.0, 10.0, 0.0));
        let p = p.expect("crossing segments intersect");
        assert_relative_eq!(p.x, 5.0);
        assert_relative_eq!(p.y, 5.0);

        assert!(intersection_point(&line(0.0, 0.0, 1.0, 0.0), &line(0.0, 1.0, 1.0, 1.0)).is_none());
        assert!(intersection_point(&line(0.0, 0.0, 1.0, 1.0), &line(3.0, 0.0, 3.0, 1.0)).is_none());
    }

    #[test]
    fn test_segments_intersect_touching() {
        assert!(segments_intersect(&line(0.0, 0.0, 1.0, 0.0), &line(1.0, 0.0, 1.0, 1.0)));
        assert!(!segments_intersect(&line(0.0, 0.0, 1.0, 0.0), &line(2.0, 0.0, 2.0, 1.0)));
    }

    #[test]
    fn test_clip_to_rect() {
        let rect = Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: 10.0, y: 10.0 });
        let clipped = clip_to_rect(&line(-5.0, 5.0, 15.0, 5.0), &rect).expect("crosses rect");
        assert_relative_eq!(clipped.start.x, 0.0);
        assert_relative_eq!(clipped.end.x, 10.0);
        assert!(clip_to_rect(&line(-5.0, 20.0, 15.0, 20.0), &rect).is_none());
    }

    #[test]
    fn test_clip_to_shape_with_hole() {
        let outer = MultiPolygon::new(vec![box_polygon(0.0, 0.0, 10.0, 10.0)]);
        let hole = MultiPolygon::new(vec![box_polygon(4.0, 2.0, 6.0, 8.0)]);
        let shape = crate::bool2d::difference(&outer, &hole);

        let pieces = clip_to_shape(&line(-5.0, 5.0, 15.0, 5.0), &shape);
        assert_eq!(pieces.len(), 2);
        assert_relative_eq!(pieces[0].start.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(pieces[0].end.x, 4.0, epsilon = 1e-9);
        assert_relative_eq!(pieces[1].start.x, 6.0, epsilon = 1e-9);
        assert_relative_eq!(pieces[1].end.x, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_clip_to_shape_outside() {
        let shape = MultiPolygon::new(vec![box_polygon(0.0, 0.0, 10.0, 10.0)]);
        assert!(clip_to_shape(&line(20.0, 0.0, 20.0, 10.0), &shape).is_empty());
    }

    #[test]
    fn test_distance_to_point() {
        let l = line(0.0, 0.0, 10.0, 0.0);
        assert_relative_eq!(distance_to_point(&l, Coord { x: 5.0, y: 3.0 }), 3.0);
        assert_relative_eq!(distance_to_point(&l, Coord { x: 13.0, y: 4.0 }), 5.0);
    }
}
