use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::domain::{Label, LabeledExample};
use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ManifestEntry {
    pub formatted_file_path: String,
    #[serde(default)]
    pub comments: Vec<String>,
}

/// Label -> reviewed example files. Any key other than `Good` or `Bad` is rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ExampleCorpusManifest {
    #[serde(rename = "Good", default)]
    pub good: Vec<ManifestEntry>,
    #[serde(rename = "Bad", default)]
    pub bad: Vec<ManifestEntry>,
}

impl ExampleCorpusManifest {
    /// Entries in build order: every `Good` entry, then every `Bad` entry, each in file order.
    pub fn entries(&self) -> impl Iterator<Item = (Label, &ManifestEntry)> {
        self.good
            .iter()
            .map(|e| (Label::Good, e))
            .chain(self.bad.iter().map(|e| (Label::Bad, e)))
    }

    pub fn len(&self) -> usize {
        self.good.len() + self.bad.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone)]
pub struct LoadedManifest {
    pub manifest: ExampleCorpusManifest,
    pub base_dir: PathBuf,
    pub sha256: String,
}

#[derive(Debug, Clone, Default)]
pub struct LoadedExamples {
    pub examples: Vec<LabeledExample>,
    pub skipped: Vec<String>,
}

pub fn load_manifest(path: &Path) -> Result<LoadedManifest, AppError> {
    let bytes = fs::read(path).map_err(|e| {
        AppError::new("CORPUS_MANIFEST_INVALID", "Failed to read example corpus manifest")
            .with_details(format!("path={}; err={}", path.display(), e))
    })?;
    let manifest: ExampleCorpusManifest = serde_json::from_slice(&bytes).map_err(|e| {
        AppError::new("CORPUS_MANIFEST_INVALID", "Failed to decode example corpus manifest")
            .with_details(format!("path={}; err={}", path.display(), e))
    })?;
    let base_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    Ok(LoadedManifest {
        manifest,
        base_dir,
        sha256: manifest_fingerprint(&bytes),
    })
}

pub fn manifest_fingerprint(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Read every referenced example file. Missing, unreadable or blank files are skipped with a
/// warning; this never fails.
pub fn load_labeled_examples(manifest: &ExampleCorpusManifest, base_dir: &Path) -> LoadedExamples {
    let mut out = LoadedExamples::default();

    for (label, entry) in manifest.entries() {
        let path = resolve_entry_path(base_dir, &entry.formatted_file_path);
        debug!(label = label.as_str(), path = %path.display(), "loading example");

        if !path.is_file() {
            warn!(label = label.as_str(), path = %path.display(), "example file not found; skipping");
            out.skipped.push(entry.formatted_file_path.clone());
            continue;
        }

        let content = match fs::read_to_string(&path) {
            Ok(raw) => raw.trim().to_string(),
            Err(e) => {
                warn!(path = %path.display(), err = %e, "example file unreadable; skipping");
                out.skipped.push(entry.formatted_file_path.clone());
                continue;
            }
        };
        if content.is_empty() {
            warn!(path = %path.display(), "example file is blank; skipping");
            out.skipped.push(entry.formatted_file_path.clone());
            continue;
        }

        let content_sha256 = hex::encode(Sha256::digest(content.as_bytes()));
        out.examples.push(LabeledExample {
            content,
            label,
            comments: entry.comments.clone(),
            source: entry.formatted_file_path.clone(),
            content_sha256,
        });
    }

    out
}

fn resolve_entry_path(base_dir: &Path, raw: &str) -> PathBuf {
    let p = Path::new(raw);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}
