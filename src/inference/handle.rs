// ModelHandle - owned, lazily loaded classifier shared by request handlers
//
// Lifecycle:
// 1. Created with a loader closure (nothing is read yet)
// 2. First `get` (or an explicit `load` at startup) runs the loader once
// 3. Concurrent requests clone the current `Arc` under a read lock
// 4. `reload` runs the loader again and swaps the model atomically; a failed
//    reload keeps serving the previous model

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use once_cell::sync::OnceCell;

use super::classifier::{CentroidClassifier, GenreClassifier};
use crate::error::InferenceError;

pub type SharedClassifier = Arc<dyn GenreClassifier>;

type Loader = Box<dyn Fn() -> Result<SharedClassifier, InferenceError> + Send + Sync>;

pub struct ModelHandle {
    loader: Loader,
    model: OnceCell<RwLock<SharedClassifier>>,
}

impl ModelHandle {
    /// Handle that loads its model with `loader` on first use
    pub fn new<F>(loader: F) -> Self
    where
        F: Fn() -> Result<SharedClassifier, InferenceError> + Send + Sync + 'static,
    {
        Self {
            loader: Box::new(loader),
            model: OnceCell::new(),
        }
    }

    /// Handle backed by a `CentroidClassifier` JSON file
    pub fn from_path(path: PathBuf) -> Self {
        Self::new(move || {
            let model = CentroidClassifier::load(&path)?;
            tracing::info!(
                "[ModelHandle] Loaded {} class model from {}",
                model.labels.len(),
                path.display()
            );
            Ok(Arc::new(model) as SharedClassifier)
        })
    }

    /// Handle around an already constructed model; reload returns the same model
    pub fn preloaded(model: SharedClassifier) -> Self {
        let handle = Self::new({
            let model = Arc::clone(&model);
            move || Ok(Arc::clone(&model))
        });
        let _ = handle.model.set(RwLock::new(model));
        handle
    }

    /// Handle with no model source; every `get` fails with `ModelNotLoaded`
    pub fn unavailable() -> Self {
        Self::new(|| Err(InferenceError::ModelNotLoaded))
    }

    pub fn is_loaded(&self) -> bool {
        self.model.get().is_some()
    }

    /// Load eagerly (process start); a no-op when already loaded
    pub fn load(&self) -> Result<(), InferenceError> {
        self.get().map(|_| ())
    }

    /// Current model, loading it on first use
    pub fn get(&self) -> Result<SharedClassifier, InferenceError> {
        let slot = self
            .model
            .get_or_try_init(|| (self.loader)().map(RwLock::new))?;
        let guard = slot.read().map_err(|_| InferenceError::Model {
            details: "model lock poisoned".to_string(),
        })?;
        Ok(Arc::clone(&guard))
    }

    /// Re-run the loader and swap in the new model
    pub fn reload(&self) -> Result<(), InferenceError> {
        let fresh = (self.loader)()?;
        match self.model.get() {
            Some(slot) => {
                let mut guard = slot.write().map_err(|_| InferenceError::Model {
                    details: "model lock poisoned".to_string(),
                })?;
                *guard = fresh;
            }
            None => {
                if let Err(lock) = self.model.set(RwLock::new(fresh)) {
                    // Lost a race with a concurrent first load; overwrite it
                    let fresh = lock.into_inner().map_err(|_| InferenceError::Model {
                        details: "model lock poisoned".to_string(),
                    })?;
                    if let Some(slot) = self.model.get() {
                        let mut guard = slot.write().map_err(|_| InferenceError::Model {
                            details: "model lock poisoned".to_string(),
                        })?;
                        *guard = fresh;
                    }
                }
            }
        }
        tracing::info!("[ModelHandle] Model reloaded");
        Ok(())
    }
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
