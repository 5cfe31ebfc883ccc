//! "Latest release" indirection for GitHub-hosted components.

use serde::Deserialize;
use thiserror::Error;

/// Why a download URL could not be resolved.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("'{0}' is not a release asset index")]
    InvalidAssetIndex(String),

    #[error("release listing request failed: {0}")]
    Request(String),

    #[error("release listing is not valid JSON: {0}")]
    Parse(String),

    #[error("release has {available} assets, index {index} requested")]
    AssetOutOfRange { index: usize, available: usize },
}

/// The parts of a release listing we read.
#[derive(Debug, Deserialize)]
pub struct Release {
    #[serde(default)]
    pub tag_name: Option<String>,
    pub assets: Vec<Asset>,
}

#[derive(Debug, Deserialize)]
pub struct Asset {
    #[serde(default)]
    pub name: Option<String>,
    pub browser_download_url: String,
}

/// Pick the download URL of asset `index` from a release listing body.
pub fn select_asset(listing: &str, index: usize) -> Result<String, ResolveError> {
    let release: Release =
        serde_json::from_str(listing).map_err(|e| ResolveError::Parse(e.to_string()))?;
    let available = release.assets.len();
    release
        .assets
        .into_iter()
        .nth(index)
        .map(|asset| asset.browser_download_url)
        .ok_or(ResolveError::AssetOutOfRange { index, available })
}
