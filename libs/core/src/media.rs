//! Image source resolution and the on-disk media cache.
//!
//! Remote image sources are fetched once and reused from a cache
//! directory; local paths are checked for existence and passed through.
//! Resolution failures are surfaced as [`MediaError`] and treated as
//! non-fatal by the builder, which drops the offending image.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::config::MediaConfig;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("media source not found: {uri}")]
    Missing { uri: String },
    #[error("failed to fetch {uri}: {reason}")]
    Fetch { uri: String, reason: String },
    #[error("cache write for {uri} failed")]
    Io {
        uri: String,
        #[source]
        cause: std::io::Error,
    },
}

/// Maps an image source string to a local file the host can display.
#[async_trait]
pub trait MediaResolver: Send + Sync {
    async fn resolve(&self, source: &str, force_refresh: bool) -> Result<PathBuf, MediaError>;
}

/// Returns every source verbatim as a path. For content whose sources
/// are already local files, and for tests.
pub struct PassthroughResolver;

#[async_trait]
impl MediaResolver for PassthroughResolver {
    async fn resolve(&self, source: &str, _force_refresh: bool) -> Result<PathBuf, MediaError> {
        Ok(PathBuf::from(source))
    }
}

/// Transport used by [`MediaCache`] to pull remote bytes. Injected so
/// tests can serve canned responses without a network.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> anyhow::Result<Vec<u8>>;
}

pub struct HttpFetcher {
    http: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: std::time::Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self { http }
    }
}

#[async_trait]
impl MediaFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> anyhow::Result<Vec<u8>> {
        let resp = self.http.get(url.clone()).send().await?.error_for_status()?;
        Ok(resp.bytes().await?.to_vec())
    }
}

enum SourceKind {
    Local(PathBuf),
    Unc(String),
    Remote(Url),
}

fn classify(source: &str) -> SourceKind {
    if source.starts_with("\\\\") {
        return SourceKind::Unc(source.to_string());
    }
    if let Ok(url) = Url::parse(source) {
        if matches!(url.scheme(), "http" | "https") {
            return SourceKind::Remote(url);
        }
        if url.scheme() == "file" {
            if let Ok(path) = url.to_file_path() {
                return SourceKind::Local(path);
            }
        }
    }
    SourceKind::Local(PathBuf::from(source))
}

/// Normalized cache file name for a source: a short content hash of the
/// full source plus its sanitized final path segment, so distinct
/// sources never collide and the name stays recognizable.
fn cache_file_name(source: &str) -> String {
    let digest = Sha256::digest(source.as_bytes());
    let prefix = hex::encode(&digest[..6]);
    let segment = source
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(source)
        .split(['?', '#'])
        .next()
        .unwrap_or("");
    let safe: String = segment
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .take(64)
        .collect();
    if safe.is_empty() {
        prefix
    } else {
        format!("{prefix}-{safe}")
    }
}

/// Caching resolver backed by a directory of downloaded files.
///
/// Cache hits skip the network entirely; `force_refresh` re-downloads.
/// Writes go through a temp file and an atomic rename, so concurrent
/// resolutions of the same source settle on a complete file.
pub struct MediaCache {
    dir: PathBuf,
    fetcher: Arc<dyn MediaFetcher>,
}

impl MediaCache {
    pub fn new(cfg: &MediaConfig) -> Self {
        Self {
            dir: cfg.cache_dir.clone(),
            fetcher: Arc::new(HttpFetcher::new(cfg.http_timeout)),
        }
    }

    pub fn with_fetcher(cfg: &MediaConfig, fetcher: Arc<dyn MediaFetcher>) -> Self {
        Self {
            dir: cfg.cache_dir.clone(),
            fetcher,
        }
    }

    fn cache_path(&self, source: &str) -> PathBuf {
        self.dir.join(cache_file_name(source))
    }

    fn store(&self, source: &str, bytes: &[u8], dest: &Path) -> Result<(), MediaError> {
        let io_err = |cause| MediaError::Io {
            uri: source.to_string(),
            cause,
        };
        fs::create_dir_all(&self.dir).map_err(io_err)?;
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(io_err)?;
        tmp.write_all(bytes).map_err(io_err)?;
        tmp.persist(dest).map_err(|e| io_err(e.error))?;
        Ok(())
    }
}

#[async_trait]
impl MediaResolver for MediaCache {
    async fn resolve(&self, source: &str, force_refresh: bool) -> Result<PathBuf, MediaError> {
        match classify(source) {
            SourceKind::Local(path) => {
                if path.exists() {
                    Ok(path)
                } else {
                    Err(MediaError::Missing { uri: source.into() })
                }
            }
            SourceKind::Unc(raw) => {
                let dest = self.cache_path(&raw);
                if !force_refresh && dest.exists() {
                    debug!(source = %raw, "media cache hit");
                    return Ok(dest);
                }
                let bytes = fs::read(&raw).map_err(|_| MediaError::Missing { uri: raw.clone() })?;
                self.store(&raw, &bytes, &dest)?;
                Ok(dest)
            }
            SourceKind::Remote(url) => {
                let dest = self.cache_path(source);
                if !force_refresh && dest.exists() {
                    debug!(source, "media cache hit");
                    return Ok(dest);
                }
                let bytes =
                    self.fetcher
                        .fetch(&url)
                        .await
                        .map_err(|e| MediaError::Fetch {
                            uri: source.into(),
                            reason: e.to_string(),
                        })?;
                self.store(source, &bytes, &dest)?;
                debug!(source, path = %dest.display(), "media cached");
                Ok(dest)
            }
        }
    }
}
