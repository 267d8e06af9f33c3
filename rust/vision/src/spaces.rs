// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Space (room) prediction

use crate::contour::mask_to_shape;
use crate::error::Result;
use crate::predictor::Predictor;
use crate::tiled::{InstanceModel, TiledConfig, TiledPredictor};
use crate::types::{ClassLabel, Prediction};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpaceConfig {
    pub tiling: TiledConfig,
}

impl Default for SpaceConfig {
    fn default() -> Self {
        Self {
            tiling: TiledConfig {
                tile_size: 1024,
                max_instance_size: 100,
                merge_threshold: 0.1,
            },
        }
    }
}

/// Tiled space instances traced into polygons
///
/// Every merged instance becomes one SPACE shape regardless of its class.
/// Tracing closes interior holes, so a room around a courtyard comes back
/// solid.
#[derive(Debug)]
pub struct SpacePredictor<M> {
    tiled: TiledPredictor<M>,
}

impl<M: InstanceModel> SpacePredictor<M> {
    pub fn new(model: M, config: SpaceConfig) -> Result<Self> {
        Ok(Self {
            tiled: TiledPredictor::new(model, config.tiling)?,
        })
    }
}

impl<M: InstanceModel> Predictor for SpacePredictor<M> {
    fn predict(&self, image: &RgbImage) -> Result<Prediction> {
        let instances = self.tiled.predict(image)?;
        let total = instances.len();

        let mut prediction = Prediction::new();
        for instance in &instances {
            prediction.push(ClassLabel::Space, mask_to_shape(&instance.mask));
        }

        debug!(total, kept = prediction.len(), "Spaces predicted");
        Ok(prediction)
    }
}
