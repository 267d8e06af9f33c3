// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Predictor capability and the process-wide model registry

use crate::error::{Result, VisionError};
use crate::types::Prediction;
use image::RgbImage;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, OnceLock};
use tracing::info;

/// Anything that turns an image into labeled shapes in its pixel frame
pub trait Predictor: Send + Sync {
    fn predict(&self, image: &RgbImage) -> Result<Prediction>;
}

impl<P: Predictor + ?Sized> Predictor for Box<P> {
    fn predict(&self, image: &RgbImage) -> Result<Prediction> {
        (**self).predict(image)
    }
}

impl<P: Predictor + ?Sized> Predictor for Arc<P> {
    fn predict(&self, image: &RgbImage) -> Result<Prediction> {
        (**self).predict(image)
    }
}

/// The closed set of model families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Roi,
    IconsV1,
    IconsV2,
    Walls,
    Spaces,
}

impl ModelKind {
    pub const ALL: [ModelKind; 5] = [
        ModelKind::Roi,
        ModelKind::IconsV1,
        ModelKind::IconsV2,
        ModelKind::Walls,
        ModelKind::Spaces,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            ModelKind::Roi => "roi",
            ModelKind::IconsV1 => "icons_v1",
            ModelKind::IconsV2 => "icons_v2",
            ModelKind::Walls => "walls",
            ModelKind::Spaces => "spaces",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.tag())
    }
}

impl FromStr for ModelKind {
    type Err = VisionError;

    fn from_str(s: &str) -> Result<Self> {
        ModelKind::ALL
            .into_iter()
            .find(|kind| kind.tag() == s)
            .ok_or_else(|| VisionError::UnknownModel(s.to_string()))
    }
}

/// Predictors keyed by model family, built once at startup
#[derive(Default, Clone)]
pub struct ModelRegistry {
    models: FxHashMap<ModelKind, Arc<dyn Predictor>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style registration
    pub fn with<P: Predictor + 'static>(mut self, kind: ModelKind, predictor: P) -> Self {
        self.register(kind, Arc::new(predictor));
        self
    }

    /// Register or replace the predictor for `kind`
    pub fn register(&mut self, kind: ModelKind, predictor: Arc<dyn Predictor>) {
        self.models.insert(kind, predictor);
    }

    pub fn get(&self, kind: ModelKind) -> Result<Arc<dyn Predictor>> {
        self.models
            .get(&kind)
            .cloned()
            .ok_or_else(|| VisionError::UnknownModel(kind.to_string()))
    }

    pub fn contains(&self, kind: ModelKind) -> bool {
        self.models.contains_key(&kind)
    }

    /// Registered kinds in declaration order
    pub fn kinds(&self) -> Vec<ModelKind> {
        let mut kinds: Vec<ModelKind> = self.models.keys().copied().collect();
        kinds.sort();
        kinds
    }
}

impl fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRegistry").field("kinds", &self.kinds()).finish()
    }
}

/// Process-wide registry with an explicit one-time initialization
///
/// Concurrent callers of [`ModelStore::initialize`] block on the same lock;
/// exactly one runs the loader and everyone gets its registry.
#[derive(Debug, Default)]
pub struct ModelStore {
    registry: OnceLock<Arc<ModelRegistry>>,
    init_lock: Mutex<()>,
}

impl ModelStore {
    pub const fn new() -> Self {
        Self {
            registry: OnceLock::new(),
            init_lock: Mutex::new(()),
        }
    }

    /// Run `loader` unless the registry already exists
    ///
    /// A failing loader leaves the store uninitialized so a later call can
    /// retry.
    pub fn initialize<F>(&self, loader: F) -> Result<Arc<ModelRegistry>>
    where
        F: FnOnce() -> Result<ModelRegistry>,
    {
        if let Some(registry) = self.registry.get() {
            return Ok(Arc::clone(registry));
        }

        let _guard = self.init_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(registry) = self.registry.get() {
            return Ok(Arc::clone(registry));
        }

        let registry = Arc::new(loader()?);
        info!(kinds = ?registry.kinds(), "Model registry initialized");
        Ok(Arc::clone(self.registry.get_or_init(|| registry)))
    }

    pub fn is_initialized(&self) -> bool {
        self.registry.get().is_some()
    }

    pub fn get(&self) -> Option<Arc<ModelRegistry>> {
        self.registry.get().cloned()
    }
}
