// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Request types for the API.

use super::ResultFormat;
use crate::error::ApiError;
use floorplan_vision::Roi;
use serde::Deserialize;

/// Query for `GET /api/images/upload-url`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadUrlQuery {
    #[serde(default)]
    pub content_type: Option<String>,
}

/// Parameters of a prediction submission.
///
/// Region bounds arrive as repeated `minx`/`miny`/`maxx`/`maxy` query
/// parameters, so they are collected from the raw pairs rather than
/// through a derived deserializer.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionParams {
    pub image_name: String,
    pub pixels_per_meter: Option<f64>,
    pub rois: Vec<Roi>,
}

impl PredictionParams {
    pub fn from_pairs(pairs: &[(String, String)]) -> Result<Self, ApiError> {
        let mut image_name = None;
        let mut pixels_per_meter = None;
        let (mut minx, mut miny, mut maxx, mut maxy) = (Vec::new(), Vec::new(), Vec::new(), Vec::new());

        for (key, value) in pairs {
            match key.as_str() {
                "image_name" => image_name = Some(value.clone()),
                "pixels_per_meter" => {
                    let ppm = parse_number(key, value)?;
                    if ppm <= 0.0 {
                        return Err(ApiError::BadRequest(format!(
                            "pixels_per_meter must be positive, got {}",
                            ppm
                        )));
                    }
                    pixels_per_meter = Some(ppm);
                }
                "minx" => minx.push(parse_bound(key, value)?),
                "miny" => miny.push(parse_bound(key, value)?),
                "maxx" => maxx.push(parse_bound(key, value)?),
                "maxy" => maxy.push(parse_bound(key, value)?),
                _ => {}
            }
        }

        let image_name = image_name
            .filter(|name| !name.is_empty())
            .ok_or_else(|| ApiError::BadRequest("image_name is required".into()))?;

        let count = minx.len();
        if miny.len() != count || maxx.len() != count || maxy.len() != count {
            return Err(ApiError::BadRequest(format!(
                "Region bounds must come in complete sets: {} minx, {} miny, {} maxx, {} maxy",
                minx.len(),
                miny.len(),
                maxx.len(),
                maxy.len()
            )));
        }

        let rois = (0..count)
            .map(|i| Roi::new(minx[i], miny[i], maxx[i], maxy[i]))
            .collect();

        Ok(Self {
            image_name,
            pixels_per_meter,
            rois,
        })
    }
}

fn parse_number(key: &str, value: &str) -> Result<f64, ApiError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ApiError::BadRequest(format!("{} is not a number: {:?}", key, value)))
}

/// Region bounds are truncated to whole pixels; negatives clamp to zero.
fn parse_bound(key: &str, value: &str) -> Result<u32, ApiError> {
    let v = parse_number(key, value)?;
    Ok(v.max(0.0).min(u32::MAX as f64) as u32)
}

/// Body of the statistics and background endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskSetRequest {
    pub task_ids: Vec<String>,
    #[serde(default)]
    pub pixels_per_meter: Option<f64>,
}

/// Query for `POST /api/retrieve-background`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackgroundQuery {
    #[serde(default)]
    pub format: Option<ResultFormat>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_repeated_regions() {
        let params = PredictionParams::from_pairs(&pairs(&[
            ("image_name", "plan"),
            ("minx", "0"),
            ("miny", "0"),
            ("maxx", "50"),
            ("maxy", "50"),
            ("minx", "50.9"),
            ("miny", "50"),
            ("maxx", "100"),
            ("maxy", "100"),
            ("pixels_per_meter", "80"),
        ]))
        .unwrap();

        assert_eq!(params.image_name, "plan");
        assert_eq!(params.pixels_per_meter, Some(80.0));
        assert_eq!(params.rois, vec![Roi::new(0, 0, 50, 50), Roi::new(50, 50, 100, 100)]);
    }

    #[test]
    fn test_no_regions() {
        let params = PredictionParams::from_pairs(&pairs(&[("image_name", "plan")])).unwrap();
        assert!(params.rois.is_empty());
        assert!(params.pixels_per_meter.is_none());
    }

    #[test]
    fn test_incomplete_region() {
        let result = PredictionParams::from_pairs(&pairs(&[
            ("image_name", "plan"),
            ("minx", "0"),
            ("miny", "0"),
            ("maxx", "50"),
        ]));
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_missing_image_name() {
        let result = PredictionParams::from_pairs(&pairs(&[("pixels_per_meter", "40")]));
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_non_positive_scale() {
        let result = PredictionParams::from_pairs(&pairs(&[("image_name", "plan"), ("pixels_per_meter", "0")]));
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }
}
