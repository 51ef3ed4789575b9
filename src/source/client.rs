// src/source/client.rs
use reqwest::header;

use crate::source::models::{DocumentSource, LoadedDocument};
use crate::utils::error::SourceError;

const SOURCE_USER_AGENT: &str = "brd_extractor/0.1 (requirements document extraction)";

/// Creates a reqwest client for fetching documents.
fn build_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(SOURCE_USER_AGENT)
        .build()
}

async fn download(url: &str) -> Result<Vec<u8>, SourceError> {
    let client = build_client()?;

    tracing::info!("Downloading document from: {}", url);
    tracing::debug!("Using User-Agent: {}", SOURCE_USER_AGENT);

    let response = client
        .get(url)
        .header(header::ACCEPT, "text/html,application/xhtml+xml,application/xml,application/json,*/*")
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        tracing::error!("HTTP error status: {} for URL: {}", status, url);
        return Err(SourceError::Http {
            status,
            url: url.to_string(),
        });
    }

    let body = response.bytes().await?;
    tracing::debug!("Downloaded {} bytes from {}", body.len(), url);
    Ok(body.to_vec())
}

/// Loads the raw bytes of `source`. An empty document is an error.
pub async fn load_document(source: &DocumentSource) -> Result<LoadedDocument, SourceError> {
    let bytes = match source {
        DocumentSource::Url(url) => download(url).await?,
        DocumentSource::Path(path) => {
            tracing::info!("Reading document from: {}", path.display());
            tokio::fs::read(path).await.map_err(|source| SourceError::Read {
                path: path.display().to_string(),
                source,
            })?
        }
    };

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(SourceError::Empty(source.display()));
    }

    Ok(LoadedDocument {
        name: source.file_name(),
        bytes,
    })
}
