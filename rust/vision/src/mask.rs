// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Compact binary masks
//!
//! A mask stores only its bounding window plus an offset into the image it
//! belongs to, so thousands of instances on a large plan cost memory in
//! proportion to their own extent rather than the image area.

use image::{GrayImage, Luma};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    x0: i32,
    y0: i32,
    width: u32,
    height: u32,
    data: Vec<bool>,
}

impl Mask {
    /// All-background mask covering `width` × `height` pixels at `(x0, y0)`
    pub fn new(x0: i32, y0: i32, width: u32, height: u32) -> Self {
        Self {
            x0,
            y0,
            width,
            height,
            data: vec![false; (width as usize) * (height as usize)],
        }
    }

    /// Build a mask by evaluating `f` at every local pixel
    pub fn from_fn<F>(x0: i32, y0: i32, width: u32, height: u32, f: F) -> Self
    where
        F: Fn(u32, u32) -> bool,
    {
        let mut mask = Self::new(x0, y0, width, height);
        for y in 0..height {
            for x in 0..width {
                mask.data[(y * width + x) as usize] = f(x, y);
            }
        }
        mask
    }

    /// Non-zero pixels of a greyscale image become foreground
    pub fn from_gray(image: &GrayImage, x0: i32, y0: i32) -> Self {
        Self::from_fn(x0, y0, image.width(), image.height(), |x, y| {
            image.get_pixel(x, y).0[0] > 0
        })
    }

    pub fn x0(&self) -> i32 {
        self.x0
    }

    pub fn y0(&self) -> i32 {
        self.y0
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Value at local coordinates
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.data[(y * self.width + x) as usize]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: bool) {
        if x < self.width && y < self.height {
            self.data[(y * self.width + x) as usize] = value;
        }
    }

    /// Value at image coordinates; outside the window is background
    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        let lx = x - self.x0;
        let ly = y - self.y0;
        lx >= 0 && ly >= 0 && self.get(lx as u32, ly as u32)
    }

    /// Number of foreground pixels
    pub fn area(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    /// Image-coordinate window `(x0, y0, x1, y1)`, exclusive end
    pub fn window(&self) -> (i32, i32, i32, i32) {
        (
            self.x0,
            self.y0,
            self.x0 + self.width as i32,
            self.y0 + self.height as i32,
        )
    }

    /// Same pixels shifted by `(dx, dy)`
    pub fn translated(&self, dx: i32, dy: i32) -> Mask {
        Mask {
            x0: self.x0 + dx,
            y0: self.y0 + dy,
            ..self.clone()
        }
    }

    /// Number of pixels set in both masks
    pub fn intersection_area(&self, other: &Mask) -> usize {
        let (ax0, ay0, ax1, ay1) = self.window();
        let (bx0, by0, bx1, by1) = other.window();
        let (x0, y0) = (ax0.max(bx0), ay0.max(by0));
        let (x1, y1) = (ax1.min(bx1), ay1.min(by1));

        let mut count = 0;
        for y in y0..y1 {
            for x in x0..x1 {
                if self.contains(x, y) && other.contains(x, y) {
                    count += 1;
                }
            }
        }
        count
    }

    /// Pixel-wise union over the combined window
    pub fn union(&self, other: &Mask) -> Mask {
        let (ax0, ay0, ax1, ay1) = self.window();
        let (bx0, by0, bx1, by1) = other.window();
        let (x0, y0) = (ax0.min(bx0), ay0.min(by0));
        let (x1, y1) = (ax1.max(bx1), ay1.max(by1));

        Mask::from_fn(x0, y0, (x1 - x0) as u32, (y1 - y0) as u32, |x, y| {
            let gx = x0 + x as i32;
            let gy = y0 + y as i32;
            self.contains(gx, gy) || other.contains(gx, gy)
        })
    }

    /// Restrict to the image-coordinate window `[x0, x1) × [y0, y1)`
    pub fn clipped(&self, x0: i32, y0: i32, x1: i32, y1: i32) -> Mask {
        let (mx0, my0, mx1, my1) = self.window();
        let (cx0, cy0) = (mx0.max(x0), my0.max(y0));
        let (cx1, cy1) = (mx1.min(x1).max(cx0), my1.min(y1).max(cy0));

        Mask::from_fn(cx0, cy0, (cx1 - cx0) as u32, (cy1 - cy0) as u32, |x, y| {
            self.contains(cx0 + x as i32, cy0 + y as i32)
        })
    }

    /// Shrink the window to the foreground extent
    pub fn trimmed(&self) -> Mask {
        match self.foreground_bounds() {
            Some((x0, y0, x1, y1)) => self.clipped(x0, y0, x1, y1),
            None => Mask::new(self.x0, self.y0, 0, 0),
        }
    }

    /// Image-coordinate extent of the foreground, exclusive end
    pub fn foreground_bounds(&self) -> Option<(i32, i32, i32, i32)> {
        let mut bounds: Option<(i32, i32, i32, i32)> = None;
        for y in 0..self.height {
            for x in 0..self.width {
                if !self.get(x, y) {
                    continue;
                }
                let (gx, gy) = (self.x0 + x as i32, self.y0 + y as i32);
                bounds = Some(match bounds {
                    None => (gx, gy, gx + 1, gy + 1),
                    Some((a, b, c, d)) => (a.min(gx), b.min(gy), c.max(gx + 1), d.max(gy + 1)),
                });
            }
        }
        bounds
    }

    /// Render as a 0/255 greyscale image with `margin` background pixels on each side
    pub fn to_gray_image(&self, margin: u32) -> GrayImage {
        let mut image = GrayImage::new(self.width + 2 * margin, self.height + 2 * margin);
        for y in 0..self.height {
            for x in 0..self.width {
                if self.get(x, y) {
                    image.put_pixel(x + margin, y + margin, Luma([255]));
                }
            }
        }
        image
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(x0: i32, y0: i32, w: u32, h: u32) -> Mask {
        Mask::from_fn(x0, y0, w, h, |_, _| true)
    }

    #[test]
    fn test_area_and_contains() {
        let mask = block(10, 20, 3, 2);
        assert_eq!(mask.area(), 6);
        assert!(mask.contains(10, 20));
        assert!(mask.contains(12, 21));
        assert!(!mask.contains(13, 21));
        assert!(!mask.contains(9, 20));
    }

    #[test]
    fn test_union_and_intersection() {
        let a = block(0, 0, 4, 4);
        let b = block(2, 2, 4, 4);
        assert_eq!(a.intersection_area(&b), 4);

        let union = a.union(&b);
        assert_eq!(union.area(), 28);
        assert_eq!(union.window(), (0, 0, 6, 6));
    }

    #[test]
    fn test_disjoint_intersection_is_zero() {
        assert_eq!(block(0, 0, 2, 2).intersection_area(&block(5, 5, 2, 2)), 0);
    }

    #[test]
    fn test_clip_and_trim() {
        let mut mask = Mask::new(0, 0, 10, 10);
        mask.set(3, 4, true);
        mask.set(5, 6, true);

        let trimmed = mask.trimmed();
        assert_eq!(trimmed.window(), (3, 4, 6, 7));
        assert_eq!(trimmed.area(), 2);

        let clipped = mask.clipped(4, 0, 10, 10);
        assert_eq!(clipped.area(), 1);
        assert_eq!(mask.clipped(20, 20, 30, 30).area(), 0);
    }

    #[test]
    fn test_translate() {
        let moved = block(0, 0, 2, 2).translated(-5, 7);
        assert_eq!(moved.window(), (-5, 7, -3, 9));
        assert!(moved.contains(-4, 8));
    }
}
