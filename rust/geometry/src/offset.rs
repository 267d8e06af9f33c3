// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polygon buffering (outward and inward offsetting) with mitre joins

use geo::MultiPolygon;
use geo_clipper::{Clipper, EndType, JoinType};

/// Mitre limit as a multiple of the offset distance
const MITRE_LIMIT: f64 = 5.0;

/// Fixed-point scale used by Clipper: 1/1000 pixel precision
const CLIPPER_FACTOR: f64 = 1000.0;

/// Offset every ring of a shape by `distance` pixels
///
/// Positive distances grow the shape, negative distances shrink it. Corners
/// are mitred, so axis-aligned shapes stay axis-aligned.
pub fn buffer(shape: &MultiPolygon<f64>, distance: f64) -> MultiPolygon<f64> {
    if shape.0.is_empty() || distance == 0.0 {
        return shape.clone();
    }
    shape.offset(
        distance,
        JoinType::Miter(MITRE_LIMIT),
        EndType::ClosedPolygon,
        CLIPPER_FACTOR,
    )
}
