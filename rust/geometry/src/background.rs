// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Background derivation: the part of the image not covered by any shape

use crate::bool2d::{difference, union_all, union_polygons};
use crate::error::{Error, Result};
use crate::offset::buffer;
use crate::rectangle::box_polygon;
use geo::{MultiPolygon, Polygon};

/// Default gap-closing distance in pixels
pub const DEFAULT_CLOSING_DISTANCE: f64 = 40.0;

/// Compute the background polygons of a `width` × `height` image
///
/// All shapes are unioned, grown and shrunk again by `closing_distance` to
/// seal small gaps between neighbours, reduced to their exterior shells and
/// subtracted from the image frame.
pub fn derive_background(
    shapes: &[MultiPolygon<f64>],
    width: f64,
    height: f64,
    closing_distance: f64,
) -> Result<Vec<Polygon<f64>>> {
    if !(width > 0.0 && height > 0.0) {
        return Err(Error::InvalidParameter(format!(
            "image frame must be non-empty, got {}x{}",
            width, height
        )));
    }

    let frame = MultiPolygon::new(vec![box_polygon(0.0, 0.0, width, height)]);
    let footprint = union_all(shapes);
    if footprint.0.is_empty() {
        return Ok(frame.0);
    }

    let closed = buffer(&buffer(&footprint, closing_distance), -closing_distance);
    let shells: Vec<Polygon<f64>> = closed
        .0
        .iter()
        .map(|polygon| Polygon::new(polygon.exterior().clone(), vec![]))
        .collect();

    Ok(difference(&frame, &union_polygons(&shells)).0)
}
