// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Overlapping tile layout for large images

use crate::error::{Result, VisionError};

/// One tile of an image, bounds are `[x1, x2) × [y1, y2)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub row: u32,
    pub col: u32,
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl Tile {
    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }

    pub fn bounds(&self) -> (u32, u32, u32, u32) {
        (self.x1, self.y1, self.x2, self.y2)
    }
}

/// Tile origins along one axis
///
/// Origins step by `stride`; a new tile is only started while the previous
/// one stops short of the edge, so no trailing sliver already covered by
/// its neighbour is emitted.
fn axis_origins(extent: u32, tile_size: u32, stride: u32) -> Vec<u32> {
    if extent == 0 {
        return Vec::new();
    }

    let mut origins = vec![0];
    let mut origin = 0u32;
    while origin + tile_size < extent {
        origin += stride;
        origins.push(origin);
    }
    origins
}

/// Lay out tiles over a `width` × `height` image in row-major order
///
/// Adjacent tiles overlap by `tile_size - stride` pixels. Tiles at the right
/// and bottom edges are clamped to the image rather than padded.
pub fn generate_tiles(width: u32, height: u32, tile_size: u32, stride: u32) -> Result<Vec<Tile>> {
    if tile_size == 0 || stride == 0 || stride > tile_size {
        return Err(VisionError::Config(format!(
            "invalid tiling: tile size {} with stride {}",
            tile_size, stride
        )));
    }

    let xs = axis_origins(width, tile_size, stride);
    let ys = axis_origins(height, tile_size, stride);

    let mut tiles = Vec::with_capacity(xs.len() * ys.len());
    for (row, &y1) in ys.iter().enumerate() {
        for (col, &x1) in xs.iter().enumerate() {
            tiles.push(Tile {
                row: row as u32,
                col: col as u32,
                x1,
                y1,
                x2: (x1 + tile_size).min(width),
                y2: (y1 + tile_size).min(height),
            });
        }
    }
    Ok(tiles)
}

/// Bounds `(x1, y1, x2, y2)` of every tile, row-major
pub fn tile_bounds(width: u32, height: u32, tile_size: u32, stride: u32) -> Result<Vec<(u32, u32, u32, u32)>> {
    Ok(generate_tiles(width, height, tile_size, stride)?
        .iter()
        .map(Tile::bounds)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_exact_cover(width: u32, height: u32, tile_size: u32, stride: u32) {
        let tiles = generate_tiles(width, height, tile_size, stride).unwrap();
        let mut covered = vec![false; (width * height) as usize];
        for tile in &tiles {
            assert!(tile.x2 <= width && tile.y2 <= height, "tile {:?} exceeds image", tile);
            assert!(tile.width() > 0 && tile.height() > 0);
            assert_eq!(tile.x1, tile.col * stride);
            assert_eq!(tile.y1, tile.row * stride);
            for y in tile.y1..tile.y2 {
                for x in tile.x1..tile.x2 {
                    covered[(y * width + x) as usize] = true;
                }
            }
        }
        assert!(
            covered.iter().all(|&c| c),
            "{}x{} tile {} stride {} leaves a gap",
            width,
            height,
            tile_size,
            stride
        );
    }

    #[test]
    fn test_tiles_cover_image() {
        for &(w, h) in &[(37, 53), (64, 64), (100, 41), (129, 200)] {
            for tile_size in [8u32, 16, 31] {
                for stride in 1..=tile_size {
                    if tile_size <= w.min(h) {
                        assert_exact_cover(w, h, tile_size, stride);
                    }
                }
            }
        }
    }

    #[test]
    fn test_row_major_order() {
        let tiles = generate_tiles(30, 20, 10, 10).unwrap();
        let order: Vec<(u32, u32)> = tiles.iter().map(|t| (t.row, t.col)).collect();
        assert_eq!(order, vec![(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2)]);
    }

    #[test]
    fn test_single_tile_for_small_image() {
        let bounds = tile_bounds(300, 200, 1024, 896).unwrap();
        assert_eq!(bounds, vec![(0, 0, 300, 200)]);
    }

    #[test]
    fn test_covered_sliver_is_skipped() {
        // A third column at x=800 would only repeat pixels the second tile already saw
        let bounds = tile_bounds(900, 512, 512, 400).unwrap();
        assert_eq!(bounds, vec![(0, 0, 512, 512), (400, 0, 900, 512)]);
    }

    #[test]
    fn test_edge_tile_is_clamped() {
        let bounds = tile_bounds(1000, 100, 512, 412).unwrap();
        assert_eq!(bounds.last(), Some(&(824, 0, 1000, 100)));
    }

    #[test]
    fn test_invalid_stride() {
        assert!(generate_tiles(100, 100, 10, 0).is_err());
        assert!(generate_tiles(100, 100, 10, 11).is_err());
    }

    #[test]
    fn test_empty_image() {
        assert!(generate_tiles(0, 100, 10, 5).unwrap().is_empty());
    }
}
