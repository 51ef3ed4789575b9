// src/source/models.rs
use std::path::{Path, PathBuf};

/// Where the raw document bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    Path(PathBuf),
    Url(String),
}

impl DocumentSource {
    /// Reads a CLI argument: anything starting with `http://` or `https://` is a URL.
    pub fn parse(input: &str) -> Self {
        let lower = input.trim().to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            DocumentSource::Url(input.trim().to_string())
        } else {
            DocumentSource::Path(PathBuf::from(input))
        }
    }

    /// File name used for format detection, e.g. `analiz.html`.
    pub fn file_name(&self) -> String {
        match self {
            DocumentSource::Path(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            DocumentSource::Url(url) => {
                let path = url.split(['?', '#']).next().unwrap_or_default();
                path.rsplit('/').next().unwrap_or_default().to_string()
            }
        }
    }

    /// Default document id: the file name without its extension.
    pub fn document_id(&self) -> String {
        let name = self.file_name();
        let stem = Path::new(&name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        if stem.is_empty() {
            "document".to_string()
        } else {
            stem
        }
    }

    pub fn display(&self) -> String {
        match self {
            DocumentSource::Path(path) => path.display().to_string(),
            DocumentSource::Url(url) => url.clone(),
        }
    }
}

/// Raw bytes of a loaded document together with the name used for format detection.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub name: String,
    pub bytes: Vec<u8>,
}
