// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Icon (fixture, door and window symbol) prediction

use crate::contour::mask_to_rectangle;
use crate::error::{Result, VisionError};
use crate::predictor::Predictor;
use crate::tiled::{InstanceModel, TiledConfig, TiledPredictor};
use crate::types::{ClassLabel, Prediction};
use geo::MultiPolygon;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Class layout, confidence thresholds and tiling of one icon model
///
/// `classes[i]` is the label of model class index `i`; `None` marks a class
/// the model was trained on but which has no label here (stairs, elevator).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IconModelConfig {
    pub classes: Vec<Option<ClassLabel>>,
    pub default_threshold: f32,
    #[serde(default)]
    pub thresholds: BTreeMap<ClassLabel, f32>,
    pub tiling: TiledConfig,
}

impl IconModelConfig {
    pub fn v1() -> Self {
        Self {
            classes: vec![
                Some(ClassLabel::Toilet),
                Some(ClassLabel::Bathtub),
                Some(ClassLabel::Sink),
                Some(ClassLabel::Shower),
            ],
            default_threshold: 0.9,
            thresholds: BTreeMap::new(),
            tiling: TiledConfig {
                tile_size: 800,
                max_instance_size: 100,
                merge_threshold: 0.8,
            },
        }
    }

    pub fn v2() -> Self {
        Self {
            classes: vec![
                Some(ClassLabel::Toilet),
                Some(ClassLabel::Bathtub),
                Some(ClassLabel::Sink),
                Some(ClassLabel::Shower),
                None,
                None,
                Some(ClassLabel::Window),
                Some(ClassLabel::Door),
            ],
            default_threshold: 0.9,
            thresholds: BTreeMap::from([(ClassLabel::Window, 0.5), (ClassLabel::Door, 0.5)]),
            tiling: TiledConfig {
                tile_size: 1024,
                max_instance_size: 400,
                merge_threshold: 0.4,
            },
        }
    }

    pub fn threshold(&self, label: ClassLabel) -> f32 {
        self.thresholds.get(&label).copied().unwrap_or(self.default_threshold)
    }

    /// Label for a model class index
    ///
    /// `Ok(None)` for classes without a label; an index outside the class
    /// list is a model error.
    pub fn label(&self, class_index: usize) -> Result<Option<ClassLabel>> {
        self.classes.get(class_index).copied().ok_or_else(|| {
            VisionError::Model(format!(
                "class index {} outside the {} icon classes",
                class_index,
                self.classes.len()
            ))
        })
    }
}

/// Tiled icon detection reduced to minimum rotated rectangles
#[derive(Debug)]
pub struct IconPredictor<M> {
    tiled: TiledPredictor<M>,
    config: IconModelConfig,
}

impl<M: InstanceModel> IconPredictor<M> {
    pub fn new(model: M, config: IconModelConfig) -> Result<Self> {
        let tiled = TiledPredictor::new(model, config.tiling)?;
        Ok(Self { tiled, config })
    }

    pub fn config(&self) -> &IconModelConfig {
        &self.config
    }
}

impl<M: InstanceModel> Predictor for IconPredictor<M> {
    fn predict(&self, image: &RgbImage) -> Result<Prediction> {
        let instances = self.tiled.predict(image)?;
        let total = instances.len();

        let mut prediction = Prediction::new();
        for instance in instances {
            let Some(label) = self.config.label(instance.class_index)? else {
                continue;
            };
            if instance.score < self.config.threshold(label) {
                continue;
            }
            if let Some(rectangle) = mask_to_rectangle(&instance.mask) {
                prediction.push(label, MultiPolygon::new(vec![rectangle]));
            }
        }

        debug!(total, kept = prediction.len(), "Icons predicted");
        Ok(prediction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::Mask;
    use crate::tiled::Instance;
    use crate::types::BoundingBox;
    use geo::{Area, BoundingRect};

    /// Emits fixed instances in tile coordinates, regardless of the tile
    struct FixedModel {
        instances: Vec<Instance>,
    }

    impl InstanceModel for FixedModel {
        fn predict_instances(&self, _tile: &RgbImage) -> Result<Vec<Instance>> {
            Ok(self.instances.clone())
        }
    }

    fn block(x0: i32, y0: i32, side: u32, class_index: usize, score: f32) -> Instance {
        Instance {
            mask: Mask::from_fn(x0, y0, side, side, |_, _| true),
            bbox: BoundingBox::new(x0 as f64, y0 as f64, (x0 + side as i32) as f64, (y0 + side as i32) as f64),
            class_index,
            score,
        }
    }

    fn small_config(classes: Vec<Option<ClassLabel>>) -> IconModelConfig {
        IconModelConfig {
            classes,
            default_threshold: 0.9,
            thresholds: BTreeMap::from([(ClassLabel::Door, 0.5)]),
            tiling: TiledConfig {
                tile_size: 64,
                max_instance_size: 20,
                merge_threshold: 0.5,
            },
        }
    }

    #[test]
    fn test_presets() {
        let v1 = IconModelConfig::v1();
        assert_eq!(v1.classes.len(), 4);
        assert_eq!(v1.threshold(ClassLabel::Sink), 0.9);
        assert_eq!(v1.tiling.stride(), 700);

        let v2 = IconModelConfig::v2();
        assert_eq!(v2.classes.len(), 8);
        assert_eq!(v2.label(4).unwrap(), None);
        assert_eq!(v2.label(7).unwrap(), Some(ClassLabel::Door));
        assert_eq!(v2.threshold(ClassLabel::Window), 0.5);
        assert_eq!(v2.threshold(ClassLabel::Toilet), 0.9);
        assert!(v2.tiling.validate().is_ok());
    }

    #[test]
    fn test_unknown_class_index() {
        assert!(matches!(IconModelConfig::v1().label(4), Err(VisionError::Model(_))));
    }

    #[test]
    fn test_score_filter_and_rectangles() {
        let model = FixedModel {
            instances: vec![
                block(10, 10, 8, 0, 0.95),
                block(30, 10, 8, 0, 0.6),
                block(10, 30, 8, 1, 0.6),
                block(30, 30, 8, 2, 0.99),
            ],
        };
        let config = small_config(vec![Some(ClassLabel::Toilet), Some(ClassLabel::Door), None]);
        let predictor = IconPredictor::new(model, config).unwrap();
        let prediction = predictor.predict(&RgbImage::new(64, 64)).unwrap();

        assert_eq!(prediction.labels(), &[ClassLabel::Toilet, ClassLabel::Door]);
        for shape in prediction.shapes() {
            assert!(shape.unsigned_area() > 0.0);
        }
        let toilet = prediction.shapes()[0].bounding_rect().unwrap();
        assert!(toilet.min().x >= 10.0 - 1e-9 && toilet.max().x <= 18.0 + 1e-9);
    }

    #[test]
    fn test_invalid_tiling_is_config_error() {
        let mut config = IconModelConfig::v1();
        config.tiling.max_instance_size = 500;
        let model = FixedModel { instances: Vec::new() };
        assert!(matches!(IconPredictor::new(model, config), Err(VisionError::Config(_))));
    }
}
