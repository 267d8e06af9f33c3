// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Medial axis support: Euclidean distance transform and skeleton thinning

use crate::mask::Mask;
use image::{GrayImage, Luma};
use imageproc::distance_transform::euclidean_squared_distance_transform;

/// Euclidean distance from every pixel to the nearest background pixel
///
/// Row-major, same size as the mask window. Background pixels are 0;
/// pixels beyond the window are not considered background.
pub fn distance_transform(mask: &Mask) -> Vec<f32> {
    // Background becomes the non-zero seed set
    let seeds = GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
        if mask.get(x, y) {
            Luma([0])
        } else {
            Luma([255])
        }
    });

    euclidean_squared_distance_transform(&seeds)
        .into_raw()
        .into_iter()
        .map(|sq| sq.sqrt() as f32)
        .collect()
}

/// Thin a mask to one-pixel-wide lines (Zhang-Suen)
pub fn skeletonize(mask: &Mask) -> Mask {
    let mut skeleton = mask.clone();
    let (w, h) = (mask.width(), mask.height());
    let mut to_clear: Vec<(u32, u32)> = Vec::new();

    loop {
        let mut changed = false;

        for pass in 0..2 {
            to_clear.clear();
            for y in 0..h {
                for x in 0..w {
                    if skeleton.get(x, y) && removable(&skeleton, x, y, pass) {
                        to_clear.push((x, y));
                    }
                }
            }
            for &(x, y) in &to_clear {
                skeleton.set(x, y, false);
            }
            changed |= !to_clear.is_empty();
        }

        if !changed {
            break;
        }
    }

    skeleton
}

fn removable(mask: &Mask, x: u32, y: u32, pass: usize) -> bool {
    let at = |dx: i64, dy: i64| -> bool {
        let (nx, ny) = (x as i64 + dx, y as i64 + dy);
        nx >= 0 && ny >= 0 && mask.get(nx as u32, ny as u32)
    };

    // p2..p9, clockwise from north
    let p = [
        at(0, -1),
        at(1, -1),
        at(1, 0),
        at(1, 1),
        at(0, 1),
        at(-1, 1),
        at(-1, 0),
        at(-1, -1),
    ];

    let neighbours = p.iter().filter(|&&b| b).count();
    if !(2..=6).contains(&neighbours) {
        return false;
    }

    let transitions = (0..8).filter(|&i| !p[i] && p[(i + 1) % 8]).count();
    if transitions != 1 {
        return false;
    }

    let (p2, p4, p6, p8) = (p[0], p[2], p[4], p[6]);
    if pass == 0 {
        !(p2 && p4 && p6) && !(p4 && p6 && p8)
    } else {
        !(p2 && p4 && p8) && !(p2 && p6 && p8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_distance_transform_bar() {
        // Horizontal bar 7 px thick inside a 40x15 frame
        let mask = Mask::from_fn(0, 0, 40, 15, |x, y| (4..11).contains(&y) && (2..38).contains(&x));
        let dist = distance_transform(&mask);
        let at = |x: usize, y: usize| dist[y * 40 + x];

        assert_eq!(at(0, 0), 0.0);
        assert_relative_eq!(at(20, 7), 4.0);
        assert_relative_eq!(at(20, 4), 1.0);
        assert_relative_eq!(at(2, 7), 1.0);
    }

    #[test]
    fn test_distance_transform_diagonal() {
        let mut mask = Mask::from_fn(0, 0, 5, 5, |_, _| true);
        mask.set(0, 0, false);
        let dist = distance_transform(&mask);
        assert_relative_eq!(dist[3 * 5 + 4], 5.0);
    }

    #[test]
    fn test_distance_transform_nearest_of_two_holes() {
        // Background at (2, 2) and (17, 9) in a 20x12 window
        let mut mask = Mask::from_fn(0, 0, 20, 12, |_, _| true);
        mask.set(2, 2, false);
        mask.set(17, 9, false);
        let dist = distance_transform(&mask);
        let at = |x: usize, y: usize| dist[y * 20 + x];

        assert_eq!(at(2, 2), 0.0);
        assert_eq!(at(17, 9), 0.0);
        assert_relative_eq!(at(5, 6), 5.0);
        assert_relative_eq!(at(14, 5), 5.0);
        assert_relative_eq!(at(19, 0), (4.0f32 + 81.0).sqrt());
    }

    #[test]
    fn test_skeleton_of_bar_is_thin_line() {
        let mask = Mask::from_fn(0, 0, 40, 15, |x, y| (4..11).contains(&y) && (2..38).contains(&x));
        let skeleton = skeletonize(&mask);

        assert!(skeleton.area() > 20);
        for x in 8..32 {
            let column = (0..15).filter(|&y| skeleton.get(x, y)).count();
            assert_eq!(column, 1, "column {} has {} skeleton pixels", x, column);
        }
        assert!(skeleton.get(20, 7));
    }

    #[test]
    fn test_skeleton_keeps_thin_lines() {
        let line = Mask::from_fn(0, 0, 20, 5, |x, y| y == 2 && (3..17).contains(&x));
        assert_eq!(skeletonize(&line), line);
    }
}
