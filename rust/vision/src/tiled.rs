// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tiled instance inference
//!
//! Large plans are cut into overlapping tiles, an instance model runs on
//! each tile independently, instances cut off by a tile edge are dropped,
//! and the survivors are moved into image coordinates and merged across
//! tile overlaps.
//!
//! The merge is greedy: candidate pairs are visited once, highest overlap
//! first with ties broken by instance index, and the result depends on that
//! order. It is not a globally optimal clustering.

use crate::error::{Result, VisionError};
use crate::image_ops::{crop, pad_centered, PAD_COLOR};
use crate::mask::Mask;
use crate::tiling::{generate_tiles, Tile};
use crate::types::BoundingBox;
use image::RgbImage;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One detected object occurrence
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    pub mask: Mask,
    pub bbox: BoundingBox,
    pub class_index: usize,
    pub score: f32,
}

impl Instance {
    pub fn translated(&self, dx: i32, dy: i32) -> Instance {
        Instance {
            mask: self.mask.translated(dx, dy),
            bbox: self.bbox.translated(dx as f64, dy as f64),
            ..self.clone()
        }
    }

    /// Fold `other` into this instance, keeping this instance's class and score
    pub fn absorb(&mut self, other: &Instance) {
        self.mask = self.mask.union(&other.mask);
        self.bbox = self.bbox.union(&other.bbox);
    }
}

/// A per-tile instance segmentation model
///
/// Implementations must be safe to call from several threads at once; the
/// coordinator runs tiles in parallel against one shared model.
pub trait InstanceModel: Send + Sync {
    /// Detect instances on one tile, in tile-local pixel coordinates
    fn predict_instances(&self, tile: &RgbImage) -> Result<Vec<Instance>>;
}

impl<M: InstanceModel + ?Sized> InstanceModel for Box<M> {
    fn predict_instances(&self, tile: &RgbImage) -> Result<Vec<Instance>> {
        (**self).predict_instances(tile)
    }
}

/// Tile layout and merge settings for an instance model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TiledConfig {
    /// Side length of the square tiles the model sees
    pub tile_size: u32,
    /// Largest expected instance extent in pixels, also the tile overlap
    pub max_instance_size: u32,
    /// Minimum overlap ratio for two same-class instances to merge
    pub merge_threshold: f64,
}

impl TiledConfig {
    pub fn stride(&self) -> u32 {
        self.tile_size.saturating_sub(self.max_instance_size)
    }

    /// An instance must fit inside one tile's core, so the stride has to be
    /// at least the instance size.
    pub fn validate(&self) -> Result<()> {
        if self.tile_size == 0 {
            return Err(VisionError::Config("tile size must be positive".to_string()));
        }
        if self.stride() < self.max_instance_size || self.stride() == 0 {
            return Err(VisionError::Config(format!(
                "stride {} (tile {} - max instance {}) must be at least the max instance size",
                self.stride(),
                self.tile_size,
                self.max_instance_size
            )));
        }
        Ok(())
    }
}

/// Runs an instance model tile by tile and reconciles the results
#[derive(Debug)]
pub struct TiledPredictor<M> {
    model: M,
    config: TiledConfig,
}

impl<M: InstanceModel> TiledPredictor<M> {
    /// Fails with a configuration error when the stride is smaller than the
    /// largest instance
    pub fn new(model: M, config: TiledConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { model, config })
    }

    pub fn config(&self) -> &TiledConfig {
        &self.config
    }

    /// Instances in image coordinates after border filtering and merging
    pub fn predict(&self, image: &RgbImage) -> Result<Vec<Instance>> {
        let (width, height) = image.dimensions();
        let tiles = generate_tiles(width, height, self.config.tile_size, self.config.stride())?;

        let per_tile = tiles
            .par_iter()
            .map(|tile| self.predict_tile(image, tile))
            .collect::<Result<Vec<_>>>()?;

        let instances: Vec<Instance> = per_tile.into_iter().flatten().collect();
        let found = instances.len();
        let outcome = merge_instances(instances, self.config.merge_threshold);

        debug!(
            tiles = tiles.len(),
            found,
            merges = outcome.merges,
            kept = outcome.instances.len(),
            "Tiled inference complete"
        );

        Ok(outcome.instances)
    }

    fn predict_tile(&self, image: &RgbImage, tile: &Tile) -> Result<Vec<Instance>> {
        let size = self.config.tile_size;
        let region = crop(image, tile.x1, tile.y1, tile.width(), tile.height());
        let (padded, (pad_x, pad_y)) = pad_centered(&region, size, size, PAD_COLOR);

        let raw = self.model.predict_instances(&padded)?;
        let total = raw.len();

        let kept: Vec<Instance> = raw
            .into_iter()
            .map(|instance| instance.translated(-(pad_x as i32), -(pad_y as i32)))
            .filter(|instance| inside_tile(&instance.bbox, tile.width(), tile.height()))
            .map(|mut instance| {
                instance.mask = instance
                    .mask
                    .clipped(0, 0, tile.width() as i32, tile.height() as i32);
                instance.translated(tile.x1 as i32, tile.y1 as i32)
            })
            .collect();

        debug!(
            row = tile.row,
            col = tile.col,
            total,
            kept = kept.len(),
            "Tile inferred"
        );

        Ok(kept)
    }
}

/// Border filter: the box must not touch any edge of the tile
///
/// Matches integer pixel semantics: the minimum corner is truncated and
/// the maximum corner rounded up before comparing.
pub fn inside_tile(bbox: &BoundingBox, tile_width: u32, tile_height: u32) -> bool {
    (bbox.xmin as i64) > 0
        && (bbox.ymin as i64) > 0
        && (bbox.xmax.ceil() as i64) < tile_width as i64
        && (bbox.ymax.ceil() as i64) < tile_height as i64
}

/// Fraction of `b` already covered by `a`: `1 - (|a ∪ b| - |a|) / |b|`
///
/// `None` when `b` is empty.
pub fn overlap_ratio(a: &Mask, b: &Mask) -> Option<f64> {
    let b_area = b.area();
    if b_area == 0 {
        return None;
    }
    Some(a.intersection_area(b) as f64 / b_area as f64)
}

/// A pair of same-class instances eligible for merging
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergeCandidate {
    /// Index of the instance that survives
    pub keep: usize,
    /// Index of the instance folded into `keep`
    pub absorb: usize,
    pub overlap: f64,
}

/// All ordered same-class pairs with overlap above `threshold`
///
/// Sorted by descending overlap, ties broken by `(keep, absorb)` ascending.
pub fn merge_candidates(instances: &[Instance], threshold: f64) -> Vec<MergeCandidate> {
    let mut candidates = Vec::new();

    for (i, a) in instances.iter().enumerate() {
        for (j, b) in instances.iter().enumerate() {
            if i == j || a.class_index != b.class_index || !windows_touch(&a.mask, &b.mask) {
                continue;
            }
            if let Some(overlap) = overlap_ratio(&a.mask, &b.mask) {
                if overlap > threshold {
                    candidates.push(MergeCandidate {
                        keep: i,
                        absorb: j,
                        overlap,
                    });
                }
            }
        }
    }

    candidates.sort_by(|a, b| {
        b.overlap
            .total_cmp(&a.overlap)
            .then(a.keep.cmp(&b.keep))
            .then(a.absorb.cmp(&b.absorb))
    });
    candidates
}

/// Result of a greedy merge
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub instances: Vec<Instance>,
    pub merges: usize,
}

/// Greedily merge overlapping same-class instances
///
/// Instances live in an arena with a liveness flag. Each candidate pair is
/// visited once in order; when both ends are still live, `absorb` is folded
/// into `keep` and tombstoned, which also retires every later pair that
/// mentions it. Survivors keep their original relative order.
pub fn merge_instances(instances: Vec<Instance>, threshold: f64) -> MergeOutcome {
    let candidates = merge_candidates(&instances, threshold);
    let mut arena = instances;
    let mut live = vec![true; arena.len()];
    let mut merges = 0;

    for candidate in candidates {
        if !live[candidate.keep] || !live[candidate.absorb] {
            continue;
        }
        let absorbed = arena[candidate.absorb].clone();
        arena[candidate.keep].absorb(&absorbed);
        live[candidate.absorb] = false;
        merges += 1;
    }

    let instances = arena
        .into_iter()
        .zip(live)
        .filter_map(|(instance, alive)| alive.then_some(instance))
        .collect();

    MergeOutcome { instances, merges }
}

fn windows_touch(a: &Mask, b: &Mask) -> bool {
    let (ax0, ay0, ax1, ay1) = a.window();
    let (bx0, by0, bx1, by1) = b.window();
    ax0 < bx1 && bx0 < ax1 && ay0 < by1 && by0 < ay1
}
