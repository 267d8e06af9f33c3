// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lazily loaded model registry shared by all jobs.

use floorplan_vision::{ModelKind, ModelRegistry, ModelStore};
use std::sync::Arc;

/// Builds the model registry; called at most once per successful load.
pub type RegistryLoader = Arc<dyn Fn() -> floorplan_vision::Result<ModelRegistry> + Send + Sync>;

/// Model registry behind a one-time initialization.
pub struct Models {
    store: ModelStore,
    loader: RegistryLoader,
}

impl Models {
    pub fn new(loader: RegistryLoader) -> Self {
        Self {
            store: ModelStore::new(),
            loader,
        }
    }

    /// Models backed by the classical backends shipped with the vision crate.
    pub fn classical() -> Self {
        Self::new(Arc::new(floorplan_vision::classical_registry))
    }

    /// The registry, loading it first if needed. Blocks while loading.
    pub fn registry(&self) -> floorplan_vision::Result<Arc<ModelRegistry>> {
        self.store.initialize(|| (self.loader)())
    }

    pub fn is_loaded(&self) -> bool {
        self.store.is_initialized()
    }

    /// Kinds of the loaded registry; empty until it is loaded.
    pub fn loaded_kinds(&self) -> Vec<ModelKind> {
        self.store.get().map(|registry| registry.kinds()).unwrap_or_default()
    }
}

impl std::fmt::Debug for Models {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Models").field("store", &self.store).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_loads_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let models = Models::new(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(ModelRegistry::new())
        }));

        assert!(!models.is_loaded());
        models.registry().unwrap();
        models.registry().unwrap();
        assert!(models.is_loaded());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_classical_kinds() {
        let models = Models::classical();
        assert!(models.loaded_kinds().is_empty());
        models.registry().unwrap();
        assert_eq!(
            models.loaded_kinds(),
            vec![ModelKind::Roi, ModelKind::Walls, ModelKind::Spaces]
        );
    }
}
