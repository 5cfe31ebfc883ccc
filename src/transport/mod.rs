//! Download-source resolution and artifact transfer.
//!
//! - [`Transport`] is the seam the pipeline talks to
//! - [`HttpTransport`] is the `reqwest` implementation
//! - Progress flows through [`DownloadObserver`]; completion is reported
//!   once per download in both blocking and background mode

pub mod background;
pub mod github;
pub mod http;
pub mod progress;

pub use background::{DownloadEvent, DownloadHandle};
pub use github::ResolveError;
pub use http::{scratch_path, DownloadMode, HttpTransport, USER_AGENT};
pub use progress::{DownloadObserver, DownloadOutcome, DownloadResult};

use std::path::Path;

use crate::manifest::Component;

/// Network access used by the pipeline.
pub trait Transport {
    /// GET `url` as text. Fails on any non-success status.
    fn download_string(&self, url: &str) -> anyhow::Result<String>;

    /// The URL to download `component` from.
    ///
    /// GitHub components are looked up in their release listing. On failure
    /// `on_error` is called and `None` is returned.
    fn resolve_download_url(
        &self,
        component: &Component,
        legacy_os: bool,
        on_error: &mut dyn FnMut(&Component, &ResolveError),
    ) -> Option<String>;

    /// Stream `url` into `destination`.
    ///
    /// `observer.on_complete` fires exactly once with the returned result.
    fn download(
        &self,
        url: &str,
        destination: &Path,
        observer: &mut dyn DownloadObserver,
    ) -> DownloadResult;
}
