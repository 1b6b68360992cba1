use anyhow::{anyhow, Result};
use offsearch_core::persist::{load_snapshot, IndexPaths};
use offsearch_core::SearchEngine;
use reqwest::{Client, Url};
use std::path::PathBuf;
use std::time::Duration;

/// Where the index comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexSource {
    /// Index data file served over http(s).
    Remote(Url),
    /// Index data file on the local filesystem.
    File(PathBuf),
    /// Snapshot directory written by the indexer.
    Snapshot(PathBuf),
}

impl IndexSource {
    /// http(s) and file URLs are recognised, anything else is a local path.
    pub fn from_url(source: &str) -> Result<Self> {
        match Url::parse(source) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(IndexSource::Remote(url)),
            Ok(url) if url.scheme() == "file" => url
                .to_file_path()
                .map(IndexSource::File)
                .map_err(|_| anyhow!("invalid file URL: {source}")),
            _ => Ok(IndexSource::File(PathBuf::from(source))),
        }
    }

    pub async fn load(&self, timeout: Duration) -> Result<SearchEngine> {
        let bytes = match self {
            IndexSource::Remote(url) => {
                let client = Client::builder().timeout(timeout).build()?;
                fetch(&client, url.clone()).await?
            }
            IndexSource::File(path) => tokio::fs::read(path).await?,
            IndexSource::Snapshot(dir) => {
                let dir = dir.clone();
                let (engine, meta) = tokio::task::spawn_blocking(move || load_snapshot(&IndexPaths::new(dir))).await??;
                tracing::info!(num_docs = meta.num_docs, created_at = %meta.created_at, "loaded index snapshot");
                return Ok(engine);
            }
        };
        // analysis is CPU bound, keep it off the async workers
        let (engine, report) = tokio::task::spawn_blocking(move || SearchEngine::from_json(&bytes)).await??;
        for skipped in &report.skipped {
            tracing::warn!(position = skipped.position, reason = %skipped.reason, "document left out of index");
        }
        Ok(engine)
    }
}

impl std::fmt::Display for IndexSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexSource::Remote(url) => write!(f, "{url}"),
            IndexSource::File(path) | IndexSource::Snapshot(path) => write!(f, "{}", path.display()),
        }
    }
}

async fn fetch(client: &Client, url: Url) -> Result<Vec<u8>> {
    let resp = client.get(url).send().await?.error_for_status()?;
    Ok(resp.bytes().await?.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_source_kinds() {
        assert!(matches!(IndexSource::from_url("https://example.com/index.json").unwrap(), IndexSource::Remote(_)));
        assert_eq!(
            IndexSource::from_url("file:///srv/site/index.json").unwrap(),
            IndexSource::File(PathBuf::from("/srv/site/index.json"))
        );
        assert_eq!(
            IndexSource::from_url("public/offline-search-index.json").unwrap(),
            IndexSource::File(PathBuf::from("public/offline-search-index.json"))
        );
    }
}
