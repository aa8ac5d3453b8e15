use std::path::Path;

use psum_core::corpus::{load_labeled_examples, load_manifest};
use psum_core::domain::LabeledExample;
use psum_core::error::AppError;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::embeddings::Embedder;
use crate::retrieve::similarity;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExampleIndexStatus {
    pub model: String,
    pub dims: Option<u32>,
    pub example_count: u32,
    pub skipped: Vec<String>,
    pub manifest_sha256: String,
}

#[derive(Debug, Clone)]
pub struct IndexedExample {
    pub example: LabeledExample,
    pub vector: Vec<f32>,
    pub norm: f32,
}

/// In-memory nearest-neighbour index over the labeled example corpus. Read-only once built.
#[derive(Debug, Clone)]
pub struct ExampleIndex {
    entries: Vec<IndexedExample>,
    status: ExampleIndexStatus,
}

impl ExampleIndex {
    pub fn status(&self) -> &ExampleIndexStatus {
        &self.status
    }

    /// Embedding model used for every stored vector. Queries must use the same one.
    pub fn model(&self) -> &str {
        &self.status.model
    }

    pub fn dims(&self) -> Option<u32> {
        self.status.dims
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[IndexedExample] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn build_example_index(
    manifest_path: &Path,
    embedder: &dyn Embedder,
    model: &str,
) -> Result<ExampleIndex, AppError> {
    let loaded = load_manifest(manifest_path)?;
    let examples = load_labeled_examples(&loaded.manifest, &loaded.base_dir);

    let mut dims: Option<u32> = None;
    let mut entries: Vec<IndexedExample> = Vec::with_capacity(examples.examples.len());

    for example in examples.examples {
        let vector = embedder.embed(model, &example.content).map_err(|e| {
            AppError::new("AI_EMBEDDINGS_FAILED", "Failed to embed example")
                .with_details(format!("source={}; err={}", example.source, e))
                .with_retryable(e.retryable)
        })?;
        let this_dims = vector.len() as u32;
        match dims {
            Some(d) if d != this_dims => {
                return Err(AppError::new(
                    "AI_INDEX_BUILD_FAILED",
                    "Embedding dimension mismatch across examples",
                )
                .with_details(format!(
                    "expected={}; got={}; source={}",
                    d, this_dims, example.source
                )));
            }
            Some(_) => {}
            None => dims = Some(this_dims),
        }
        let norm = similarity::l2_norm(&vector);
        entries.push(IndexedExample {
            example,
            vector,
            norm,
        });
    }

    let status = ExampleIndexStatus {
        model: model.to_string(),
        dims,
        example_count: entries.len() as u32,
        skipped: examples.skipped,
        manifest_sha256: loaded.sha256,
    };
    info!(
        manifest = %manifest_path.display(),
        examples = status.example_count,
        skipped = status.skipped.len(),
        model,
        "example index built"
    );

    Ok(ExampleIndex { entries, status })
}
