// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! SVG rendering of labeled shapes over the image frame

use crate::types::Prediction;
use geo::{LineString, MultiPolygon};

pub const FILL_OPACITY: f64 = 0.7;

/// Render shapes as filled paths in a `width` × `height` viewBox
///
/// Each shape becomes one path of all its rings, filled with the label
/// colour under the even-odd rule so holes stay open.
pub fn to_svg(prediction: &Prediction, width: u32, height: u32) -> String {
    let mut svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">\n"
    );

    for (label, shape) in prediction.iter() {
        let data = path_data(shape);
        if data.is_empty() {
            continue;
        }
        let [r, g, b] = label.color();
        svg.push_str(&format!(
            "  <path class=\"{}\" d=\"{}\" fill=\"rgb({},{},{})\" fill-opacity=\"{}\" fill-rule=\"evenodd\"/>\n",
            label.name(),
            data,
            r,
            g,
            b,
            FILL_OPACITY
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

fn path_data(shape: &MultiPolygon<f64>) -> String {
    shape
        .0
        .iter()
        .flat_map(|polygon| std::iter::once(polygon.exterior()).chain(polygon.interiors()))
        .filter_map(ring_data)
        .collect::<Vec<_>>()
        .join(" ")
}

fn ring_data(ring: &LineString<f64>) -> Option<String> {
    let mut coords = ring.coords();
    let first = coords.next()?;
    let mut data = format!("M{} {}", round(first.x), round(first.y));
    for c in coords {
        data.push_str(&format!(" L{} {}", round(c.x), round(c.y)));
    }
    data.push_str(" Z");
    Some(data)
}

/// Two decimals are well below a pixel
fn round(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
