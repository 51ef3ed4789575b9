// src/utils/error.rs
use thiserror::Error;

// Define specific error types for different parts of the application
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error), // Automatically convert reqwest errors

    #[error("HTTP error {status} for {url}")]
    Http { status: reqwest::StatusCode, url: String },

    #[error("Could not read document {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Document is empty: {0}")]
    Empty(String),
}

/// Failure of the markup-to-tree conversion. Always fatal for the document.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Document is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("XML parsing error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("JSON tree parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Conversion produced no content ({converter})")]
    NoContent { converter: String },
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Invalid section definition '{section}': {reason}")]
    Invalid { section: String, reason: String },

    #[error("Unknown section id: {0}")]
    UnknownSection(String),

    #[error("Catalog parsing error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Could not read catalog {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Section definition rejected: {0}")]
    InvalidSection(#[from] CatalogError),

    #[error("Unexpected failure while extracting '{section}': {message}")]
    Unexpected { section: String, message: String },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("Loading document failed: {0}")]
    Source(#[from] SourceError),

    #[error("Conversion failed: {0}")]
    Conversion(#[from] ConvertError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
