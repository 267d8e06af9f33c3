// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Floorplan Geometry
//!
//! Vector geometry used to turn raster detections into clean floorplan
//! shapes. Booleans run on i_overlay, buffering on geo-clipper, and all
//! shapes are `geo` types in pixel coordinates.

pub mod background;
pub mod bool2d;
pub mod error;
pub mod offset;
pub mod opening;
pub mod rectangle;
pub mod segment;
pub mod transform;

// Re-export geo types for convenience
pub use geo::{Coord, Line, LineString, MultiPolygon, Polygon, Rect};

pub use background::{derive_background, DEFAULT_CLOSING_DISTANCE};
pub use bool2d::{difference, intersection, is_valid_polygon, union, union_all, union_polygons};
pub use error::{Error, Result};
pub use offset::buffer;
pub use opening::{align_opening_to_wall, align_openings};
pub use rectangle::{box_polygon, center_lines, minimum_rotated_rectangle, segment_rectangle, CenterLines, EndCap};
pub use transform::FrameTransform;
