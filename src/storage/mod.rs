// src/storage/mod.rs
use std::fs;
use std::path::{Path, PathBuf};

use crate::extractors::section::ParseResult;
use crate::utils::error::StorageError;

pub struct StorageManager {
    base_dir: PathBuf,
}

impl StorageManager {
    /// Creates a new StorageManager with the specified base directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self, StorageError> {
        let base_path = base_dir.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(StorageError::IoError)?;
        }

        Ok(Self { base_dir: base_path })
    }

    /// `<base_dir>/<document_id>/`, created on demand.
    pub fn document_dir(&self, document_id: &str) -> Result<PathBuf, StorageError> {
        let target_dir = self.base_dir.join(sanitize(document_id));
        if !target_dir.exists() {
            fs::create_dir_all(&target_dir).map_err(StorageError::IoError)?;
        }
        Ok(target_dir)
    }

    /// Writes the extracted content to `<document_id>/<section_id>.txt`.
    /// Returns `None` without touching the disk when nothing was found.
    pub fn save_result(
        &self,
        document_id: &str,
        result: &ParseResult,
    ) -> Result<Option<PathBuf>, StorageError> {
        if !result.found {
            return Ok(None);
        }

        let file_path = self
            .document_dir(document_id)?
            .join(format!("{}.txt", sanitize(&result.section_id)));
        fs::write(&file_path, result.content.as_bytes()).map_err(StorageError::IoError)?;

        tracing::info!("Saved section to {}", file_path.display());
        Ok(Some(file_path))
    }

    /// Saves metadata about the result in JSON format, found or not.
    pub fn save_result_metadata(
        &self,
        document_id: &str,
        result: &ParseResult,
    ) -> Result<PathBuf, StorageError> {
        let file_path = self
            .document_dir(document_id)?
            .join(format!("{}_meta.json", sanitize(&result.section_id)));

        let metadata = serde_json::json!({
            "document_id": document_id,
            "section_id": result.section_id,
            "found": result.found,
            "mode": result.mode,
            "content_length": result.content_length,
            "matched_labels": result.matched_labels,
            "errors": result.errors,
            "warnings": result.warnings,
            "extracted_at": chrono::Utc::now().to_rfc3339(),
        });

        let metadata_str = serde_json::to_string_pretty(&metadata)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        fs::write(&file_path, metadata_str).map_err(StorageError::IoError)?;

        tracing::info!("Saved metadata to {}", file_path.display());
        Ok(file_path)
    }
}

// Keeps ids usable as path components.
fn sanitize(id: &str) -> String {
    let cleaned: String = id
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' { c } else { '_' })
        .collect();
    match cleaned.trim_matches('.') {
        "" => "_".to_string(),
        rest => rest.to_string(),
    }
}
