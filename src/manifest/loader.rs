//! Manifest sources and the on-disk cache.

use anyhow::Context;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

use super::Manifest;
use crate::error::{ActorError, Result};
use crate::transport::Transport;

/// Where the manifest comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestSource {
    Url(String),
    File(PathBuf),
}

impl ManifestSource {
    /// Classify a `--manifest` value.
    pub fn parse(raw: &str) -> Self {
        let lower = raw.trim().to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            ManifestSource::Url(raw.trim().to_string())
        } else {
            ManifestSource::File(PathBuf::from(raw.trim()))
        }
    }

    fn describe(&self) -> String {
        match self {
            ManifestSource::Url(url) => url.clone(),
            ManifestSource::File(path) => path.display().to_string(),
        }
    }
}

/// Loads the manifest, keeping a copy of the last good remote document.
pub struct ManifestLoader {
    cache_dir: PathBuf,
}

impl ManifestLoader {
    /// A loader caching under the user's cache directory.
    pub fn new() -> Self {
        let cache_dir = dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("actor");
        Self { cache_dir }
    }

    /// A loader with a custom cache directory.
    pub fn with_cache_dir(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Cache file for the manifest fetched from `url`.
    pub fn cache_path(&self, url: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        let hash = hex::encode(hasher.finalize());
        self.cache_dir.join(format!("manifest-{}.json", &hash[..16]))
    }

    /// Read and validate the manifest.
    ///
    /// A remote source that cannot be fetched or parsed falls back to the
    /// cached copy. Local files are never cached.
    pub fn load(&self, source: &ManifestSource, transport: &dyn Transport) -> Result<Manifest> {
        match source {
            ManifestSource::File(path) => {
                let text = read_file(path).map_err(|e| ActorError::ManifestFetch {
                    source_desc: source.describe(),
                    message: format!("{:#}", e),
                })?;
                Manifest::from_json(&text)
            }
            ManifestSource::Url(url) => {
                let fetched = transport
                    .download_string(url)
                    .map_err(|e| ActorError::ManifestFetch {
                        source_desc: url.clone(),
                        message: format!("{:#}", e),
                    })
                    .and_then(|text| Manifest::from_json(&text).map(|m| (m, text)));

                match fetched {
                    Ok((manifest, text)) => {
                        if let Err(e) = self.save_cache(url, &text) {
                            tracing::debug!("Could not cache manifest: {:#}", e);
                        }
                        Ok(manifest)
                    }
                    Err(err) => {
                        tracing::warn!("{}", err);
                        self.load_cached(url).ok_or(err)
                    }
                }
            }
        }
    }

    fn load_cached(&self, url: &str) -> Option<Manifest> {
        let path = self.cache_path(url);
        let text = fs::read_to_string(&path).ok()?;
        match Manifest::from_json(&text) {
            Ok(manifest) => {
                tracing::warn!("Using cached manifest from {}", path.display());
                Some(manifest)
            }
            Err(e) => {
                tracing::debug!("Ignoring cached manifest: {}", e);
                None
            }
        }
    }

    fn save_cache(&self, url: &str, text: &str) -> anyhow::Result<()> {
        fs::create_dir_all(&self.cache_dir)
            .with_context(|| format!("Failed to create {}", self.cache_dir.display()))?;
        fs::write(self.cache_path(url), text)?;
        Ok(())
    }
}

impl Default for ManifestLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn read_file(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}
