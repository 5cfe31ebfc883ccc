//! HTTP transport backed by a blocking `reqwest` client.

use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use super::background::{DownloadEvent, DownloadHandle};
use super::github::{self, ResolveError};
use super::progress::{DownloadObserver, DownloadResult, ProgressTracker};
use super::Transport;
use crate::manifest::Component;

/// User agent sent with every request. Release APIs reject anonymous clients.
pub const USER_AGENT: &str = concat!("actor/", env!("CARGO_PKG_VERSION"));

const CHUNK_SIZE: usize = 64 * 1024;

/// How [`Transport::download`] waits for file transfers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DownloadMode {
    /// Transfer on the calling thread.
    #[default]
    Blocking,
    /// Transfer on a worker thread and relay its events.
    Background,
}

/// Fetches manifests, release listings and artifacts over HTTP(S).
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    text_timeout: Duration,
    mode: DownloadMode,
}

impl HttpTransport {
    /// Create a transport with a 30-second connect timeout.
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Create a transport with a custom connect and text-request timeout.
    ///
    /// File downloads have no overall cap; large artifacts on slow links
    /// would otherwise never finish.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(timeout)
            .timeout(None::<Duration>)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            text_timeout: timeout,
            mode: DownloadMode::Blocking,
        })
    }

    /// Select how file downloads are driven.
    pub fn with_mode(mut self, mode: DownloadMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> DownloadMode {
        self.mode
    }

    pub fn text_timeout(&self) -> Duration {
        self.text_timeout
    }

    /// Start a download on a worker thread.
    pub fn download_in_background(&self, url: &str, destination: &Path) -> DownloadHandle {
        let (tx, rx) = mpsc::channel();
        let cancelled = Arc::new(AtomicBool::new(false));

        let client = self.client.clone();
        let url = url.to_string();
        let dest = destination.to_path_buf();
        let flag = Arc::clone(&cancelled);

        let worker = thread::spawn(move || {
            let progress_tx = tx.clone();
            let result = transfer(&client, &url, &dest, &flag, &mut |percent| {
                let _ = progress_tx.send(DownloadEvent::Progress(percent));
            });
            let _ = tx.send(DownloadEvent::Completed(result));
        });

        DownloadHandle::new(rx, cancelled, worker, destination.to_path_buf())
    }
}

impl Transport for HttpTransport {
    fn download_string(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .timeout(self.text_timeout)
            .send()
            .with_context(|| format!("Failed to fetch {}", url))?;

        if !response.status().is_success() {
            bail!("HTTP {} fetching {}", response.status(), url);
        }

        response
            .text()
            .with_context(|| format!("Failed to read response from {}", url))
    }

    fn resolve_download_url(
        &self,
        component: &Component,
        legacy_os: bool,
        on_error: &mut dyn FnMut(&Component, &ResolveError),
    ) -> Option<String> {
        if !component.is_from_github {
            return Some(component.url.clone());
        }

        let resolved = component
            .asset_index(legacy_os)
            .ok_or_else(|| {
                ResolveError::InvalidAssetIndex(
                    component.effective_install_arguments(legacy_os).to_string(),
                )
            })
            .and_then(|index| {
                let listing = self
                    .download_string(&component.url)
                    .map_err(|e| ResolveError::Request(format!("{:#}", e)))?;
                github::select_asset(&listing, index)
            });

        match resolved {
            Ok(url) => {
                tracing::debug!("Resolved {} to {}", component.name, url);
                Some(url)
            }
            Err(e) => {
                on_error(component, &e);
                None
            }
        }
    }

    fn download(
        &self,
        url: &str,
        destination: &Path,
        observer: &mut dyn DownloadObserver,
    ) -> DownloadResult {
        match self.mode {
            DownloadMode::Background => self.download_in_background(url, destination).wait(observer),
            DownloadMode::Blocking => {
                let never = AtomicBool::new(false);
                let result = transfer(&self.client, url, destination, &never, &mut |percent| {
                    observer.on_progress(percent)
                });
                observer.on_complete(&result);
                result
            }
        }
    }
}

/// Stream `url` into `destination`, reporting percentages to `progress`.
///
/// A partially written file is removed on failure.
fn transfer(
    client: &Client,
    url: &str,
    destination: &Path,
    cancelled: &AtomicBool,
    progress: &mut dyn FnMut(u8),
) -> DownloadResult {
    match stream_to_file(client, url, destination, cancelled, progress) {
        Ok(()) => DownloadResult::success(destination),
        Err(e) => {
            tracing::warn!("Download of {} failed: {:#}", url, e);
            if destination.exists() {
                let _ = fs::remove_file(destination);
            }
            DownloadResult::fail(destination)
        }
    }
}

fn stream_to_file(
    client: &Client,
    url: &str,
    destination: &Path,
    cancelled: &AtomicBool,
    progress: &mut dyn FnMut(u8),
) -> Result<()> {
    let mut response = client
        .get(url)
        .send()
        .with_context(|| format!("Failed to fetch {}", url))?;

    if !response.status().is_success() {
        bail!("HTTP {} fetching {}", response.status(), url);
    }

    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let file = File::create(destination)
        .with_context(|| format!("Failed to create {}", destination.display()))?;
    let mut writer = BufWriter::new(file);

    let mut tracker = ProgressTracker::new(response.content_length());
    let mut buffer = vec![0u8; CHUNK_SIZE];

    loop {
        if cancelled.load(Ordering::SeqCst) {
            bail!("Download cancelled");
        }
        let read = response
            .read(&mut buffer)
            .with_context(|| format!("Failed reading body of {}", url))?;
        if read == 0 {
            break;
        }
        writer.write_all(&buffer[..read])?;
        if let Some(percent) = tracker.advance(read as u64) {
            progress(percent);
        }
    }

    writer.flush()?;
    if let Some(percent) = tracker.finish() {
        progress(percent);
    }
    Ok(())
}

/// Default destination of an artifact inside the scratch directory.
pub fn scratch_path(scratch_dir: &Path, component: &Component) -> PathBuf {
    scratch_dir.join(component.file_name.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::progress::tests::RecordingObserver;
    use httpmock::prelude::*;
    use tempfile::TempDir;

    fn github_component(url: String, args: &str, win7: &str) -> Component {
        serde_json::from_value(serde_json::json!({
            "installOrder": 1,
            "url": url,
            "fileName": "plugin.zip",
            "name": "Plugin",
            "version": "1.0",
            "isFromGitHub": true,
            "installArguments": args,
            "win7InstallArguments": win7,
        }))
        .unwrap()
    }

    const LISTING: &str = r#"{"assets":[
        {"browser_download_url":"https://x/a.zip"},
        {"browser_download_url":"https://x/b.zip"}
    ]}"#;

    #[test]
    fn user_agent_is_not_empty() {
        assert!(USER_AGENT.starts_with("actor/"));
        assert!(USER_AGENT.len() > "actor/".len());
    }

    #[test]
    fn default_timeout_is_30_seconds() {
        let transport = HttpTransport::new().unwrap();
        assert_eq!(transport.text_timeout(), Duration::from_secs(30));
        assert_eq!(transport.mode(), DownloadMode::Blocking);
    }

    #[test]
    fn download_string_sends_user_agent() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/components.json")
                .header("user-agent", USER_AGENT);
            then.status(200).body("[]");
        });

        let transport = HttpTransport::new().unwrap();
        let body = transport
            .download_string(&server.url("/components.json"))
            .unwrap();

        mock.assert();
        assert_eq!(body, "[]");
    }

    #[test]
    fn download_string_fails_on_error_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/missing");
            then.status(404);
        });

        let transport = HttpTransport::new().unwrap();
        let err = transport
            .download_string(&server.url("/missing"))
            .unwrap_err();
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn direct_url_is_returned_unchanged() {
        let transport = HttpTransport::new().unwrap();
        let mut component = github_component("https://example.com/act.zip".into(), "", "");
        component.is_from_github = false;

        let resolved = transport.resolve_download_url(&component, false, &mut |_, _| {
            panic!("no error expected")
        });
        assert_eq!(resolved.as_deref(), Some("https://example.com/act.zip"));
    }

    #[test]
    fn github_asset_zero_resolves_to_first_asset() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/repos/o/r/releases/latest");
            then.status(200)
                .header("content-type", "application/json")
                .body(LISTING);
        });

        let transport = HttpTransport::new().unwrap();
        let component = github_component(server.url("/repos/o/r/releases/latest"), "0", "");
        let resolved = transport.resolve_download_url(&component, false, &mut |_, e| {
            panic!("unexpected error: {e}")
        });

        mock.assert();
        assert_eq!(resolved.as_deref(), Some("https://x/a.zip"));
    }

    #[test]
    fn legacy_os_uses_win7_index() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/latest");
            then.status(200).body(LISTING);
        });

        let transport = HttpTransport::new().unwrap();
        let component = github_component(server.url("/latest"), "0", "1");

        let modern = transport.resolve_download_url(&component, false, &mut |_, _| {});
        let legacy = transport.resolve_download_url(&component, true, &mut |_, _| {});
        assert_eq!(modern.as_deref(), Some("https://x/a.zip"));
        assert_eq!(legacy.as_deref(), Some("https://x/b.zip"));
    }

    #[test]
    fn resolution_failure_reports_through_callback() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/latest");
            then.status(403).body("rate limited");
        });

        let transport = HttpTransport::new().unwrap();
        let component = github_component(server.url("/latest"), "0", "");
        let mut errors = Vec::new();
        let resolved = transport.resolve_download_url(&component, false, &mut |c, e| {
            errors.push((c.name.clone(), e.to_string()))
        });

        assert_eq!(resolved, None);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0, "Plugin");
        assert!(errors[0].1.contains("403"));
    }

    #[test]
    fn bad_asset_index_fails_without_request() {
        let transport = HttpTransport::new().unwrap();
        let component = github_component("http://127.0.0.1:9/never".into(), "latest", "");
        let mut called = 0;
        let resolved = transport.resolve_download_url(&component, false, &mut |_, e| {
            assert!(matches!(e, ResolveError::InvalidAssetIndex(_)));
            called += 1;
        });
        assert_eq!(resolved, None);
        assert_eq!(called, 1);
    }

    fn body() -> Vec<u8> {
        (0..300_000u32).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn blocking_download_writes_file_and_reports_progress() {
        let server = MockServer::start();
        let payload = body();
        server.mock(|when, then| {
            when.method(GET).path("/a.zip");
            then.status(200).body(payload.clone());
        });

        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("download").join("a.zip");
        let transport = HttpTransport::new().unwrap();
        let mut observer = RecordingObserver::default();

        let result = transport.download(&server.url("/a.zip"), &dest, &mut observer);

        assert!(result.is_success());
        assert_eq!(result.file, dest);
        assert_eq!(fs::read(&dest).unwrap(), payload);
        observer.assert_well_formed();
        assert_eq!(observer.progress.last(), Some(&100));
    }

    #[test]
    fn background_download_matches_blocking_guarantees() {
        let server = MockServer::start();
        let payload = body();
        server.mock(|when, then| {
            when.method(GET).path("/a.zip");
            then.status(200).body(payload.clone());
        });

        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("a.zip");
        let transport = HttpTransport::new()
            .unwrap()
            .with_mode(DownloadMode::Background);
        let mut observer = RecordingObserver::default();

        let result = transport.download(&server.url("/a.zip"), &dest, &mut observer);

        assert!(result.is_success());
        assert_eq!(fs::read(&dest).unwrap(), payload);
        observer.assert_well_formed();
        assert_eq!(observer.completions[0], result);
    }

    #[test]
    fn error_status_fails_and_leaves_no_file() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/a.zip");
            then.status(500);
        });

        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("a.zip");
        let transport = HttpTransport::new().unwrap();
        let mut observer = RecordingObserver::default();

        let result = transport.download(&server.url("/a.zip"), &dest, &mut observer);

        assert!(!result.is_success());
        assert!(!dest.exists());
        observer.assert_well_formed();
    }

    #[test]
    fn cancelled_background_download_fails() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/slow.zip");
            then.status(200)
                .delay(Duration::from_millis(500))
                .body(body());
        });

        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("slow.zip");
        let transport = HttpTransport::new().unwrap();

        let handle = transport.download_in_background(&server.url("/slow.zip"), &dest);
        handle.cancel();
        let mut observer = RecordingObserver::default();
        let result = handle.wait(&mut observer);

        assert!(!result.is_success());
        assert!(!dest.exists());
        observer.assert_well_formed();
    }

    #[test]
    fn scratch_path_uses_file_name() {
        let component = github_component("u".into(), "0", "");
        assert_eq!(
            scratch_path(Path::new("/tmp/download"), &component),
            Path::new("/tmp/download/plugin.zip")
        );
    }
}
