// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Image processing operations for floorplan recognition

use crate::error::{Result, VisionError};
use crate::mask::Mask;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, ImageBuffer, Luma, Rgb, RgbImage};

/// Per-pixel class score in [0, 1]
pub type ScoreMap = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Fill colour for padding tiles out to full size
pub const PAD_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// Decode an uploaded image into the three-channel greyscale form models expect
pub fn decode_image(bytes: &[u8]) -> Result<RgbImage> {
    let decoded =
        image::load_from_memory(bytes).map_err(|e| VisionError::InputImage(e.to_string()))?;
    Ok(DynamicImage::ImageLuma8(decoded.to_luma8()).to_rgb8())
}

/// Greyscale copy replicated back to three channels
pub fn to_greyscale_rgb(image: &RgbImage) -> RgbImage {
    DynamicImage::ImageLuma8(imageops::grayscale(image)).to_rgb8()
}

/// Copy out the `width` × `height` window at `(x, y)`, clamped to the image
pub fn crop(image: &RgbImage, x: u32, y: u32, width: u32, height: u32) -> RgbImage {
    imageops::crop_imm(image, x, y, width, height).to_image()
}

/// Resize to exactly `width` × `height`
pub fn resize(image: &RgbImage, width: u32, height: u32) -> RgbImage {
    if image.dimensions() == (width, height) {
        return image.clone();
    }
    imageops::resize(image, width, height, FilterType::CatmullRom)
}

/// Centre `image` on a `width` × `height` canvas filled with `fill`
///
/// Returns the canvas and the offset of the original image on it. Images
/// already at least as large as the canvas are returned unchanged.
pub fn pad_centered(image: &RgbImage, width: u32, height: u32, fill: Rgb<u8>) -> (RgbImage, (u32, u32)) {
    let (w, h) = image.dimensions();
    if w >= width && h >= height {
        return (image.clone(), (0, 0));
    }

    let (target_w, target_h) = (width.max(w), height.max(h));
    let offset = ((target_w - w) / 2, (target_h - h) / 2);
    let mut canvas = RgbImage::from_pixel(target_w, target_h, fill);
    imageops::replace(&mut canvas, image, offset.0 as i64, offset.1 as i64);
    (canvas, offset)
}

/// Foreground where the score is strictly above `threshold`
pub fn threshold_scores(scores: &ScoreMap, threshold: f32) -> Mask {
    Mask::from_fn(0, 0, scores.width(), scores.height(), |x, y| {
        scores.get_pixel(x, y).0[0] > threshold
    })
}

/// Grey-level dilation with a 3x3 square structuring element
pub fn dilate_scores(scores: &ScoreMap) -> ScoreMap {
    let (w, h) = scores.dimensions();
    ScoreMap::from_fn(w, h, |x, y| {
        let mut value = f32::MIN;
        for ny in y.saturating_sub(1)..=(y + 1).min(h - 1) {
            for nx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
                value = value.max(scores.get_pixel(nx, ny).0[0]);
            }
        }
        Luma([value])
    })
}

/// Element-wise maximum of `source` into `target` at `(x, y)`
pub fn max_into(target: &mut ScoreMap, source: &ScoreMap, x: u32, y: u32) {
    for (sx, sy, pixel) in source.enumerate_pixels() {
        let (tx, ty) = (x + sx, y + sy);
        if tx < target.width() && ty < target.height() {
            let current = target.get_pixel_mut(tx, ty);
            current.0[0] = current.0[0].max(pixel.0[0]);
        }
    }
}

/// Copy out a window of a score map
pub fn crop_scores(scores: &ScoreMap, x: u32, y: u32, width: u32, height: u32) -> ScoreMap {
    imageops::crop_imm(scores, x, y, width, height).to_image()
}

/// Morphological dilation - expands white regions
pub fn dilate(image: &GrayImage, radius: u8) -> GrayImage {
    imageproc::morphology::dilate(image, imageproc::distance_transform::Norm::LInf, radius)
}

/// Morphological erosion - shrinks white regions
pub fn erode(image: &GrayImage, radius: u8) -> GrayImage {
    imageproc::morphology::erode(image, imageproc::distance_transform::Norm::LInf, radius)
}

/// Morphological closing (dilate then erode) - fills small gaps
pub fn morphological_close(image: &GrayImage, radius: u8) -> GrayImage {
    let dilated = dilate(image, radius);
    erode(&dilated, radius)
}

/// Morphological opening (erode then dilate) - removes thin strokes and specks
pub fn morphological_open(image: &GrayImage, radius: u8) -> GrayImage {
    let eroded = erode(image, radius);
    dilate(&eroded, radius)
}

/// Invert a binary image
pub fn invert(image: &GrayImage) -> GrayImage {
    let mut result = image.clone();
    for pixel in result.pixels_mut() {
        pixel.0[0] = 255 - pixel.0[0];
    }
    result
}

/// Simple threshold - pixels below `threshold_value` (ink) become white, the rest black
pub fn ink_mask(image: &GrayImage, threshold_value: u8) -> GrayImage {
    let mut result = GrayImage::new(image.width(), image.height());

    for (x, y, pixel) in image.enumerate_pixels() {
        let value = if pixel.0[0] < threshold_value { 255 } else { 0 };
        result.put_pixel(x, y, Luma([value]));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode_image(b"definitely not an image").unwrap_err();
        assert!(matches!(err, VisionError::InputImage(_)));
    }

    #[test]
    fn test_decode_produces_grey_rgb() {
        let source = RgbImage::from_pixel(3, 2, Rgb([200, 10, 10]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(source)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();

        let decoded = decode_image(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (3, 2));
        let p = decoded.get_pixel(1, 1).0;
        assert_eq!(p[0], p[1]);
        assert_eq!(p[1], p[2]);
    }

    #[test]
    fn test_pad_centered() {
        let image = RgbImage::from_pixel(2, 2, Rgb([0, 0, 0]));
        let (padded, offset) = pad_centered(&image, 6, 5, PAD_COLOR);
        assert_eq!(padded.dimensions(), (6, 5));
        assert_eq!(offset, (2, 1));
        assert_eq!(padded.get_pixel(2, 1).0, [0, 0, 0]);
        assert_eq!(padded.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(padded.get_pixel(4, 1).0, [255, 255, 255]);
    }

    #[test]
    fn test_dilate_scores() {
        let mut scores = ScoreMap::new(5, 5);
        scores.put_pixel(2, 2, Luma([0.8]));
        let dilated = dilate_scores(&scores);
        assert_eq!(dilated.get_pixel(1, 1).0[0], 0.8);
        assert_eq!(dilated.get_pixel(3, 3).0[0], 0.8);
        assert_eq!(dilated.get_pixel(0, 0).0[0], 0.0);
    }

    #[test]
    fn test_max_into() {
        let mut target = ScoreMap::from_pixel(4, 4, Luma([0.5]));
        let source = ScoreMap::from_pixel(2, 2, Luma([0.7]));
        max_into(&mut target, &source, 3, 3);
        assert_eq!(target.get_pixel(3, 3).0[0], 0.7);
        assert_eq!(target.get_pixel(2, 2).0[0], 0.5);
    }

    #[test]
    fn test_threshold_scores_is_strict() {
        let scores = ScoreMap::from_fn(3, 1, |x, _| Luma([x as f32 * 0.5]));
        let mask = threshold_scores(&scores, 0.5);
        assert!(!mask.get(0, 0));
        assert!(!mask.get(1, 0));
        assert!(mask.get(2, 0));
    }
}
