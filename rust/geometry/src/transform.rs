// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Frame transforms between a cropped, rescaled region and the source image

use crate::error::{Error, Result};
use geo::{Coord, MapCoords, MultiPolygon};

/// Scale about the origin, then translate
///
/// Maps coordinates predicted inside a resized crop back to the frame of
/// the image the crop was taken from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTransform {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl FrameTransform {
    pub fn new(scale: f64, offset_x: f64, offset_y: f64) -> Self {
        Self {
            scale,
            offset_x,
            offset_y,
        }
    }

    /// Transform for a crop at `(offset_x, offset_y)` that was resized from
    /// `source_ppm` to `target_ppm` pixels per meter
    pub fn for_region(offset_x: f64, offset_y: f64, source_ppm: f64, target_ppm: f64) -> Result<Self> {
        if !(source_ppm > 0.0 && target_ppm > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "pixels per meter must be positive, got {} -> {}",
                source_ppm, target_ppm
            )));
        }
        Ok(Self::new(source_ppm / target_ppm, offset_x, offset_y))
    }

    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0)
    }

    #[inline]
    pub fn apply_coord(&self, coord: Coord<f64>) -> Coord<f64> {
        Coord {
            x: coord.x * self.scale + self.offset_x,
            y: coord.y * self.scale + self.offset_y,
        }
    }

    /// Transform a shape into a new shape
    pub fn apply(&self, shape: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        let transform = *self;
        shape.map_coords(|coord| transform.apply_coord(coord))
    }
}

impl Default for FrameTransform {
    fn default() -> Self {
        Self::identity()
    }
}
