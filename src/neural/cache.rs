//! Model acquisition cache
//!
//! Memoizes loaded speech models by variant. The first request for a variant
//! fetches its snapshot and loads it; later requests get the same handle
//! without touching the network or the filesystem. Each variant has its own
//! slot lock, so concurrent first requests for one variant fetch and load it
//! exactly once while other variants proceed independently.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::Settings;
use crate::error::Result;
use crate::neural::bridge::{BridgeLoader, ModelLoader};
use crate::neural::gpu::select_precision;
use crate::neural::hub::{fetch_variant, ArtifactSource, HubSource};
use crate::neural::model::{ModelVariant, Precision, SpeechModel};

type Slot = Arc<Mutex<Option<Arc<dyn SpeechModel>>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panic inside a loader leaves the slot empty, which is a valid state
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Cache of loaded speech models, passed explicitly to every node call
pub struct ModelCache {
    models_dir: PathBuf,
    source: Box<dyn ArtifactSource>,
    loader: Box<dyn ModelLoader>,
    precision: Precision,
    slots: Mutex<HashMap<ModelVariant, Slot>>,
}

impl ModelCache {
    /// Cache backed by the model hub and the inference bridge
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self::new(
            settings.models_dir.clone(),
            Box::new(HubSource::new(settings)?),
            Box::new(BridgeLoader::new(settings)),
            select_precision(),
        ))
    }

    pub fn new(
        models_dir: PathBuf,
        source: Box<dyn ArtifactSource>,
        loader: Box<dyn ModelLoader>,
        precision: Precision,
    ) -> Self {
        Self {
            models_dir,
            source,
            loader,
            precision,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    fn slot(&self, variant: ModelVariant) -> Slot {
        Arc::clone(lock(&self.slots).entry(variant).or_default())
    }

    /// Return the loaded model for `variant`, fetching and loading it first
    /// if this is the first successful request for it.
    ///
    /// A failed fetch or load leaves nothing cached, so the next call starts
    /// over.
    pub fn acquire(&self, variant: ModelVariant) -> Result<Arc<dyn SpeechModel>> {
        let slot = self.slot(variant);
        let mut loaded = lock(&slot);
        if let Some(model) = loaded.as_ref() {
            return Ok(Arc::clone(model));
        }

        let dir = self.prefetch(variant)?;
        tracing::info!("Loading {} from local path: {}", variant.repo_id(), dir.display());
        let model = self.loader.load(variant, &dir, self.precision)?;

        *loaded = Some(Arc::clone(&model));
        Ok(model)
    }

    /// Fetch the snapshot for `variant` without loading it
    pub fn prefetch(&self, variant: ModelVariant) -> Result<PathBuf> {
        fetch_variant(self.source.as_ref(), &self.models_dir, variant)
    }

    pub fn is_loaded(&self, variant: ModelVariant) -> bool {
        let slot = self.slot(variant);
        let loaded = lock(&slot);
        loaded.is_some()
    }

    /// Variants with a live handle, in declaration order
    pub fn loaded_variants(&self) -> Vec<ModelVariant> {
        ModelVariant::ALL
            .into_iter()
            .filter(|v| self.is_loaded(*v))
            .collect()
    }
}
