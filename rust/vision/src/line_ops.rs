// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Line detection and processing operations

use crate::mask::Mask;
use floorplan_geometry::segment::{clip_to_rect, intersection_point, length, scale_about_center};
use geo::{Coord, Line, Rect};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Fixed-point precision used while walking a candidate line
const SHIFT: i64 = 16;

/// Seed for the voting order; constant so detections are reproducible
const VOTE_ORDER_SEED: u64 = 0x9E37_79B9_7F4A_7C15;

/// Probabilistic Hough transform settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoughParams {
    /// Accumulator votes needed before a line is traced
    pub threshold: i32,
    /// Minimum extent along either axis for an accepted segment
    pub min_line_length: i64,
    /// Largest run of empty pixels bridged while tracing
    pub max_line_gap: i64,
    /// Number of evenly spaced angles over [0, π)
    pub angle_count: u32,
}

impl HoughParams {
    pub fn thetas(&self) -> Vec<f64> {
        (0..self.angle_count)
            .map(|i| i as f64 * PI / self.angle_count as f64)
            .collect()
    }
}

impl Default for HoughParams {
    fn default() -> Self {
        Self {
            threshold: 10,
            min_line_length: 10,
            max_line_gap: 5,
            angle_count: 32,
        }
    }
}

/// Detect line segments with the progressive probabilistic Hough transform
///
/// Pixels vote in a fixed pseudo-random order. As soon as one accumulator
/// bin reaches the threshold, the line through the current pixel is traced
/// in both directions across gaps of at most `max_line_gap`; its pixels are
/// removed from the image and, for accepted segments, their votes withdrawn.
pub fn probabilistic_hough(skeleton: &Mask, params: &HoughParams) -> Vec<Line<f64>> {
    let (w, h) = (skeleton.width() as i64, skeleton.height() as i64);
    let thetas = params.thetas();
    if w == 0 || h == 0 || thetas.is_empty() {
        return Vec::new();
    }

    let cos_table: Vec<f64> = thetas.iter().map(|t| t.cos()).collect();
    let sin_table: Vec<f64> = thetas.iter().map(|t| t.sin()).collect();
    let num_thetas = thetas.len();

    let max_distance = 2 * ((w * w + h * h) as f64).sqrt().ceil() as i64;
    let offset = max_distance / 2;
    let mut accumulator = vec![0i32; (max_distance as usize + 1) * num_thetas];
    let bin = |x: i64, y: i64, j: usize| -> usize {
        let rho = (cos_table[j] * x as f64 + sin_table[j] * y as f64).round() as i64 + offset;
        rho as usize * num_thetas + j
    };

    let mut mask = skeleton.clone();
    let mut points: Vec<(i64, i64)> = Vec::new();
    for y in 0..h {
        for x in 0..w {
            if mask.get(x as u32, y as u32) {
                points.push((x, y));
            }
        }
    }
    shuffle(&mut points, VOTE_ORDER_SEED);

    let in_bounds = |x: i64, y: i64| x >= 0 && x < w && y >= 0 && y < h;
    let mut lines = Vec::new();

    for (x, y) in points {
        if !mask.get(x as u32, y as u32) {
            continue;
        }

        // Vote and remember the strongest angle
        let mut max_value = params.threshold - 1;
        let mut max_theta = None;
        for j in 0..num_thetas {
            let idx = bin(x, y, j);
            accumulator[idx] += 1;
            if accumulator[idx] > max_value {
                max_value = accumulator[idx];
                max_theta = Some(j);
            }
        }
        let Some(j) = max_theta else {
            continue;
        };

        // Walk direction along the line, one full pixel on the major axis
        let a = -sin_table[j];
        let b = cos_table[j];
        let xflag = a.abs() > b.abs();
        let (x0, y0, dx0, dy0) = if xflag {
            let dx0 = if a > 0.0 { 1 } else { -1 };
            let dy0 = (b * (1i64 << SHIFT) as f64 / a.abs()).round() as i64;
            (x, (y << SHIFT) + (1 << (SHIFT - 1)), dx0, dy0)
        } else {
            let dy0 = if b > 0.0 { 1 } else { -1 };
            let dx0 = (a * (1i64 << SHIFT) as f64 / b.abs()).round() as i64;
            ((x << SHIFT) + (1 << (SHIFT - 1)), y, dx0, dy0)
        };
        let to_pixel = |px: i64, py: i64| {
            if xflag {
                (px, py >> SHIFT)
            } else {
                (px >> SHIFT, py)
            }
        };

        // Pass 1: find both ends, bridging short gaps
        let mut line_end = [(x, y); 2];
        for (k, end) in line_end.iter_mut().enumerate() {
            let (dx, dy) = if k == 0 { (dx0, dy0) } else { (-dx0, -dy0) };
            let (mut px, mut py) = (x0, y0);
            let mut gap = 0;
            loop {
                let (x1, y1) = to_pixel(px, py);
                if !in_bounds(x1, y1) {
                    break;
                }
                gap += 1;
                if mask.get(x1 as u32, y1 as u32) {
                    gap = 0;
                    *end = (x1, y1);
                } else if gap > params.max_line_gap {
                    break;
                }
                px += dx;
                py += dy;
            }
        }

        let good_line = (line_end[1].0 - line_end[0].0).abs() >= params.min_line_length
            || (line_end[1].1 - line_end[0].1).abs() >= params.min_line_length;

        // Pass 2: clear the traced pixels, withdrawing votes of accepted lines
        for (k, end) in line_end.iter().enumerate() {
            let (dx, dy) = if k == 0 { (dx0, dy0) } else { (-dx0, -dy0) };
            let (mut px, mut py) = (x0, y0);
            loop {
                let (x1, y1) = to_pixel(px, py);
                if !in_bounds(x1, y1) {
                    break;
                }
                if mask.get(x1 as u32, y1 as u32) {
                    if good_line {
                        for jj in 0..num_thetas {
                            accumulator[bin(x1, y1, jj)] -= 1;
                        }
                    }
                    mask.set(x1 as u32, y1 as u32, false);
                }
                if (x1, y1) == *end {
                    break;
                }
                px += dx;
                py += dy;
            }
        }

        if good_line {
            lines.push(Line::new(
                Coord { x: line_end[0].0 as f64, y: line_end[0].1 as f64 },
                Coord { x: line_end[1].0 as f64, y: line_end[1].1 as f64 },
            ));
        }
    }

    lines
}

/// Fisher-Yates shuffle driven by xorshift64
fn shuffle<T>(items: &mut [T], seed: u64) {
    let mut state = seed.max(1);
    for i in (1..items.len()).rev() {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        let j = (state % (i as u64 + 1)) as usize;
        items.swap(i, j);
    }
}

/// Intersections of segment pairs, each segment first stretched by
/// `corner_scale_distance` (half at each end)
pub fn find_corners(segments: &[Line<f64>], corner_scale_distance: f64) -> Vec<Coord<f64>> {
    let extended: Vec<Line<f64>> = segments
        .iter()
        .map(|segment| {
            let len = length(segment);
            if len > 0.0 {
                scale_about_center(segment, 1.0 + corner_scale_distance / len)
            } else {
                *segment
            }
        })
        .collect();

    let mut corners = Vec::new();
    for (i, a) in extended.iter().enumerate() {
        for b in &extended[i + 1..] {
            if let Some(corner) = intersection_point(a, b) {
                corners.push(corner);
            }
        }
    }
    corners
}

/// Extend a segment across the whole frame and clip it to the frame
pub fn extend_across(segment: &Line<f64>, frame: &Rect<f64>) -> Option<Line<f64>> {
    let len = length(segment);
    if len <= 0.0 {
        return None;
    }
    let reach = frame.width().hypot(frame.height());
    let stretched = scale_about_center(segment, 1.0 + 2.0 * reach / len);
    clip_to_rect(&stretched, frame)
}

/// Sample a row-major value grid along a segment
///
/// `ceil(length + 1)` evenly spaced samples including both endpoints,
/// bilinearly interpolated, with coordinates clamped to the grid.
pub fn profile_line(values: &[f32], width: u32, height: u32, start: Coord<f64>, end: Coord<f64>) -> Vec<f64> {
    if width == 0 || height == 0 {
        return Vec::new();
    }
    let len = (end.x - start.x).hypot(end.y - start.y);
    let count = (len + 1.0).ceil().max(1.0) as usize;

    (0..count)
        .map(|i| {
            let t = if count > 1 { i as f64 / (count - 1) as f64 } else { 0.0 };
            let x = start.x + (end.x - start.x) * t;
            let y = start.y + (end.y - start.y) * t;
            sample_bilinear(values, width, height, x, y)
        })
        .collect()
}

fn sample_bilinear(values: &[f32], width: u32, height: u32, x: f64, y: f64) -> f64 {
    let x = x.clamp(0.0, (width - 1) as f64);
    let y = y.clamp(0.0, (height - 1) as f64);
    let (x0, y0) = (x.floor() as u32, y.floor() as u32);
    let (x1, y1) = ((x0 + 1).min(width - 1), (y0 + 1).min(height - 1));
    let (fx, fy) = (x - x0 as f64, y - y0 as f64);

    let at = |px: u32, py: u32| values[(py * width + px) as usize] as f64;
    let top = at(x0, y0) * (1.0 - fx) + at(x1, y0) * fx;
    let bottom = at(x0, y1) * (1.0 - fx) + at(x1, y1) * fx;
    top * (1.0 - fy) + bottom * fy
}

/// Percentile with linear interpolation between closest ranks
///
/// Returns 0 for an empty slice.
pub fn percentile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = (q / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}
