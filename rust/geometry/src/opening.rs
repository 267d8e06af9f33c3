// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Opening alignment: snapping doors and windows into their host wall

use crate::rectangle::{
    center_lines, minimum_rotated_rectangle, rectangle_center, segment_rectangle, CenterLines,
    EndCap,
};
use crate::segment::{
    clip_to_shape, direction, distance_to_point, length, midpoint, rotate_quarter_turn,
    scale_about_center, translate,
};
use geo::{Centroid, Coord, Intersects, Line, MultiPolygon, Polygon};

/// Cross sections are stretched by this factor so they span the full wall thickness
const CROSS_SECTION_SCALE: f64 = 5.0;

/// Rebuild an opening as a rectangle spanning the local width of `wall`
///
/// Cross sections through both short ends of the opening's minimum rotated
/// rectangle are intersected with the wall. The midpoints of the two wall
/// crossings become the new center axis, and the wall thickness measured
/// across the middle of that axis becomes the rectangle width.
///
/// Returns `None` when the opening does not cross the wall at either end.
pub fn align_opening_to_wall(opening: &Polygon<f64>, wall: &Polygon<f64>) -> Option<Polygon<f64>> {
    let opening_shape = MultiPolygon::new(vec![opening.clone()]);
    let rectangle = minimum_rotated_rectangle(&opening_shape)?;
    let CenterLines { long, short } = center_lines(&rectangle)?;

    let target = opening
        .centroid()
        .map(|p| p.0)
        .unwrap_or_else(|| rectangle_center(&rectangle));
    let wall_shape = MultiPolygon::new(vec![wall.clone()]);

    let cross_section = scale_about_center(&short, CROSS_SECTION_SCALE);
    let half_long = direction(&long) / 2.0;
    let left = nearest_piece(
        clip_to_shape(&translate(&cross_section, -half_long), &wall_shape),
        target,
    )?;
    let right = nearest_piece(
        clip_to_shape(&translate(&cross_section, half_long), &wall_shape),
        target,
    )?;

    let axis = Line::new(midpoint(&left), midpoint(&right));
    let normal = rotate_quarter_turn(&axis);
    let thickness: f64 = clip_to_shape(&normal, &wall_shape).iter().map(length).sum();

    segment_rectangle(&axis, thickness / 2.0, EndCap::Flat)
}

/// Align every opening against every wall it intersects
///
/// Pairs that do not produce a rectangle are dropped.
pub fn align_openings(openings: &[Polygon<f64>], walls: &[Polygon<f64>]) -> Vec<Polygon<f64>> {
    openings
        .iter()
        .flat_map(|opening| {
            walls
                .iter()
                .filter(move |wall| opening.intersects(*wall))
                .filter_map(move |wall| align_opening_to_wall(opening, wall))
        })
        .collect()
}

fn nearest_piece(pieces: Vec<Line<f64>>, target: Coord<f64>) -> Option<Line<f64>> {
    pieces
        .into_iter()
        .min_by(|a, b| distance_to_point(a, target).total_cmp(&distance_to_point(b, target)))
}
