use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use psum_core::error::AppError;
use serde::Serialize;
use tracing::{debug, info};

use super::index::{build_example_index, ExampleIndex, ExampleIndexStatus};
use crate::embeddings::Embedder;

#[derive(Debug, Clone, Serialize)]
pub struct ExampleCacheStatus {
    pub ready: bool,
    pub manifest_path: String,
    pub index: Option<ExampleIndexStatus>,
}

/// Builds the example index at most once and shares it until [`ExampleCache::invalidate`].
///
/// The corpus is static configuration, so the cached index is handed out as a read-only
/// `Arc` to any number of concurrent summarizations.
#[derive(Debug)]
pub struct ExampleCache {
    manifest_path: PathBuf,
    model: String,
    slot: RwLock<Option<Arc<ExampleIndex>>>,
}

impl ExampleCache {
    pub fn new(manifest_path: impl Into<PathBuf>, model: impl Into<String>) -> Self {
        Self {
            manifest_path: manifest_path.into(),
            model: model.into(),
            slot: RwLock::new(None),
        }
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    pub fn get_or_build(&self, embedder: &dyn Embedder) -> Result<Arc<ExampleIndex>, AppError> {
        {
            let slot = self.slot.read().unwrap_or_else(|p| p.into_inner());
            if let Some(index) = slot.as_ref() {
                debug!("example index cache hit");
                return Ok(Arc::clone(index));
            }
        }

        let mut slot = self.slot.write().unwrap_or_else(|p| p.into_inner());
        // Another caller may have finished the build while we waited for the write lock.
        if let Some(index) = slot.as_ref() {
            return Ok(Arc::clone(index));
        }
        let index = Arc::new(build_example_index(&self.manifest_path, embedder, &self.model)?);
        *slot = Some(Arc::clone(&index));
        Ok(index)
    }

    /// Drop the cached index; the next `get_or_build` re-reads and re-embeds the corpus.
    pub fn invalidate(&self) {
        let mut slot = self.slot.write().unwrap_or_else(|p| p.into_inner());
        if slot.take().is_some() {
            info!(manifest = %self.manifest_path.display(), "example index invalidated");
        }
    }

    pub fn is_ready(&self) -> bool {
        self.slot.read().unwrap_or_else(|p| p.into_inner()).is_some()
    }

    pub fn status(&self) -> ExampleCacheStatus {
        let slot = self.slot.read().unwrap_or_else(|p| p.into_inner());
        ExampleCacheStatus {
            ready: slot.is_some(),
            manifest_path: self.manifest_path.display().to_string(),
            index: slot.as_ref().map(|i| i.status().clone()),
        }
    }
}
