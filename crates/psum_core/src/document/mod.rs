use std::fs;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::AppError;

/// Extracts plain text from an input document.
pub trait DocumentReader: Send + Sync {
    fn read(&self, path: &Path) -> Result<String, AppError>;
}

/// Reads PDFs through `pdf-extract`; any other extension is treated as UTF-8 text.
#[derive(Debug, Clone, Default)]
pub struct FileDocumentReader;

impl DocumentReader for FileDocumentReader {
    fn read(&self, path: &Path) -> Result<String, AppError> {
        if !path.is_file() {
            return Err(AppError::new("DOC_NOT_FOUND", "Input document not found")
                .with_details(format!("path={}", path.display())));
        }

        let text = if is_pdf(path) {
            extract_pdf_text(path)?
        } else {
            fs::read_to_string(path).map_err(|e| {
                AppError::new("DOC_READ_FAILED", "Failed to read input document")
                    .with_details(format!("path={}; err={}", path.display(), e))
                    .with_retryable(true)
            })?
        };

        if text.trim().is_empty() {
            return Err(AppError::new("DOC_EMPTY", "Input document contains no extractable text")
                .with_details(format!("path={}", path.display())));
        }
        debug!(path = %path.display(), chars = text.chars().count(), "document text extracted");
        Ok(text)
    }
}

pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

fn extract_pdf_text(path: &Path) -> Result<String, AppError> {
    // pdf-extract panics on some malformed inputs instead of returning an error.
    let result = panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text(path)));
    match result {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(AppError::new("DOC_READ_FAILED", "Failed to extract text from PDF")
            .with_details(format!("path={}; err={}", path.display(), e))),
        Err(_) => Err(AppError::new("DOC_READ_FAILED", "Failed to extract text from PDF")
            .with_details(format!("path={}; err=extractor panicked on malformed input", path.display()))),
    }
}

/// Persist `content` at `path`, replacing any existing file, and hand the content back.
///
/// Parent directories are created as needed. Each call writes its own uniquely named temp file
/// next to the target and renames it into place, so concurrent writers never mix bytes and
/// readers never observe a half-written output.
pub fn write_output(path: &Path, content: &str) -> Result<String, AppError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| {
        AppError::new("OUTPUT_WRITE_FAILED", "Failed to create output directory")
            .with_details(format!("path={}; err={}", parent.display(), e))
            .with_retryable(true)
    })?;

    let write_failed = |e: std::io::Error| {
        AppError::new("OUTPUT_WRITE_FAILED", "Failed to write output")
            .with_details(format!("path={}; err={}", path.display(), e))
            .with_retryable(true)
    };
    let mut tmp = NamedTempFile::new_in(parent).map_err(write_failed)?;
    tmp.write_all(content.as_bytes()).map_err(write_failed)?;
    tmp.flush().map_err(write_failed)?;
    tmp.persist(path).map_err(|e| {
        AppError::new("OUTPUT_WRITE_FAILED", "Failed to finalize output write")
            .with_details(format!("dest={}; err={}", path.display(), e.error))
            .with_retryable(true)
    })?;

    info!(path = %path.display(), bytes = content.len(), "output written");
    Ok(content.to_string())
}

pub fn read_output(path: &Path) -> Result<String, AppError> {
    fs::read_to_string(path).map_err(|e| {
        AppError::new("OUTPUT_READ_FAILED", "Failed to read persisted output")
            .with_details(format!("path={}; err={}", path.display(), e))
    })
}

/// Remove the output file if present. Missing files are not an error.
pub fn remove_output(path: &Path) -> Result<(), AppError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(AppError::new("OUTPUT_WRITE_FAILED", "Failed to remove output")
            .with_details(format!("path={}; err={}", path.display(), e))),
    }
}
