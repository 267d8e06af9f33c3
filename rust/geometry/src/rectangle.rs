// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Rectangle construction and analysis
//!
//! Walls, railings and openings all end up as rectangles: a centerline
//! segment buffered by a half width, or the minimum-area rectangle around
//! a traced contour.

use crate::segment::{direction, length, midpoint};
use geo::{Area, Coord, Line, LineString, MinimumRotatedRect, MultiPolygon, Polygon};
use serde::{Deserialize, Serialize};

/// Rectangles thinner than this are treated as degenerate
const MIN_EXTENT: f64 = 1e-9;

/// How a buffered segment ends
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EndCap {
    /// The rectangle stops exactly at the segment endpoints
    #[default]
    Flat,
    /// The rectangle extends past each endpoint by the half width
    Square,
}

/// Axis-aligned box, ring ordered (maxx,miny) → (maxx,maxy) → (minx,maxy) → (minx,miny)
pub fn box_polygon(minx: f64, miny: f64, maxx: f64, maxy: f64) -> Polygon<f64> {
    Polygon::new(
        LineString::from(vec![
            (maxx, miny),
            (maxx, maxy),
            (minx, maxy),
            (minx, miny),
            (maxx, miny),
        ]),
        vec![],
    )
}

/// Buffer a segment into a rectangle of total width `2 * half_width`
///
/// Returns `None` for a zero-length segment or a non-positive width.
pub fn segment_rectangle(line: &Line<f64>, half_width: f64, cap: EndCap) -> Option<Polygon<f64>> {
    let len = length(line);
    if len < MIN_EXTENT || half_width.is_nan() || half_width <= MIN_EXTENT {
        return None;
    }

    let unit = direction(line) / len;
    let normal = (-unit.y * half_width, unit.x * half_width);
    let extension = match cap {
        EndCap::Flat => (0.0, 0.0),
        EndCap::Square => (unit.x * half_width, unit.y * half_width),
    };

    let a = (line.start.x - extension.0, line.start.y - extension.1);
    let b = (line.end.x + extension.0, line.end.y + extension.1);

    Some(Polygon::new(
        LineString::from(vec![
            (a.0 + normal.0, a.1 + normal.1),
            (b.0 + normal.0, b.1 + normal.1),
            (b.0 - normal.0, b.1 - normal.1),
            (a.0 - normal.0, a.1 - normal.1),
            (a.0 + normal.0, a.1 + normal.1),
        ]),
        vec![],
    ))
}

/// The two centerlines of a rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CenterLines {
    /// Joins the midpoints of the two short sides
    pub long: Line<f64>,
    /// Joins the midpoints of the two long sides
    pub short: Line<f64>,
}

/// Compute the long and short centerlines of a (possibly rotated) rectangle
///
/// The shortest side is paired with the side most parallel to it; the
/// remaining two sides give the other axis.
pub fn center_lines(rectangle: &Polygon<f64>) -> Option<CenterLines> {
    let mut sides: Vec<Line<f64>> = rectangle.exterior().lines().collect();
    if sides.len() != 4 {
        return None;
    }
    sides.sort_by(|a, b| length(a).total_cmp(&length(b)));

    let shortest = sides.remove(0);
    let shortest_dir = direction(&shortest);
    let parallel_idx = sides
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| {
            parallelism(&shortest_dir, &direction(a))
                .total_cmp(&parallelism(&shortest_dir, &direction(b)))
        })
        .map(|(idx, _)| idx)?;
    let opposite = sides.remove(parallel_idx);

    Some(CenterLines {
        long: Line::new(midpoint(&shortest), midpoint(&opposite)),
        short: Line::new(midpoint(&sides[0]), midpoint(&sides[1])),
    })
}

fn parallelism(a: &nalgebra::Vector2<f64>, b: &nalgebra::Vector2<f64>) -> f64 {
    let denom = a.norm() * b.norm();
    if denom < MIN_EXTENT {
        0.0
    } else {
        (a.dot(b) / denom).abs()
    }
}

/// Smallest-area rectangle of any orientation enclosing a shape
///
/// Returns `None` when the shape is empty or collapses to a line or point.
pub fn minimum_rotated_rectangle(shape: &MultiPolygon<f64>) -> Option<Polygon<f64>> {
    if shape.0.is_empty() {
        return None;
    }
    shape
        .minimum_rotated_rect()
        .filter(|rect| rect.unsigned_area() > MIN_EXTENT)
}

/// Centroid of a rectangle's corners
pub fn rectangle_center(rectangle: &Polygon<f64>) -> Coord<f64> {
    let corners: Vec<Coord<f64>> = rectangle.exterior().0.iter().take(4).copied().collect();
    let n = corners.len().max(1) as f64;
    Coord {
        x: corners.iter().map(|c| c.x).sum::<f64>() / n,
        y: corners.iter().map(|c| c.y).sum::<f64>() / n,
    }
}
