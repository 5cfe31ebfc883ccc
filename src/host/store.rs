//! The host configuration file on disk.

use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};

use super::xml::{self, PluginEntry, DEFAULT_DOCUMENT};
use super::{HostConfiguration, MergeOutcome};
use crate::error::{ActorError, Result};
use crate::transport::Transport;

/// Location of the host configuration under the roaming profile.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| {
        dir.join("Advanced Combat Tracker")
            .join("Config")
            .join("Advanced Combat Tracker.config.xml")
    })
}

/// Reads and rewrites the host's XML configuration file.
pub struct XmlHostConfig<'t> {
    path: PathBuf,
    transport: &'t dyn Transport,
}

impl<'t> XmlHostConfig<'t> {
    pub fn new(path: impl Into<PathBuf>, transport: &'t dyn Transport) -> Self {
        Self {
            path: path.into(),
            transport,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<String> {
        if !self.path.exists() {
            return Ok(DEFAULT_DOCUMENT.to_string());
        }
        fs::read_to_string(&self.path).map_err(|e| self.error(e))
    }

    fn write(&self, document: &str) -> Result<()> {
        write_file(&self.path, document).map_err(|e| self.error(e))
    }

    fn error(&self, e: impl std::fmt::Display) -> ActorError {
        ActorError::HostConfig {
            path: self.path.clone(),
            message: e.to_string(),
        }
    }
}

impl HostConfiguration for XmlHostConfig<'_> {
    fn register_plugin(&mut self, path: &Path, enabled: bool) -> Result<()> {
        let entry = PluginEntry::new(path.display().to_string(), enabled);
        let document = self.read()?;
        let updated =
            xml::register_plugins(&document, &[entry]).map_err(|e| self.error(format!("{:#}", e)))?;
        if updated != document || !self.path.exists() {
            self.write(&updated)?;
        }
        tracing::debug!("Registered plugin {}", path.display());
        Ok(())
    }

    fn merge_configuration(
        &mut self,
        url: &str,
        destination: &Path,
        overwrite: bool,
    ) -> Result<MergeOutcome> {
        if destination.exists() && !overwrite {
            tracing::debug!("Keeping existing {}", destination.display());
            return Ok(MergeOutcome::Kept);
        }

        let content = self
            .transport
            .download_string(url)
            .map_err(|e| ActorError::HostConfig {
                path: destination.to_path_buf(),
                message: format!("{:#}", e),
            })?;
        write_file(destination, &content).map_err(|e| ActorError::HostConfig {
            path: destination.to_path_buf(),
            message: format!("{:#}", e),
        })?;
        Ok(MergeOutcome::Written)
    }
}

fn write_file(path: &Path, content: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::Component;
    use crate::transport::{DownloadObserver, DownloadResult, ResolveError};
    use std::cell::RefCell;
    use tempfile::TempDir;

    #[derive(Default)]
    struct TextServer {
        requests: RefCell<Vec<String>>,
    }

    impl Transport for TextServer {
        fn download_string(&self, url: &str) -> anyhow::Result<String> {
            self.requests.borrow_mut().push(url.to_string());
            if url.contains("missing") {
                anyhow::bail!("HTTP 404 fetching {}", url);
            }
            Ok(format!("<Settings source=\"{}\"/>", url))
        }

        fn resolve_download_url(
            &self,
            component: &Component,
            _legacy_os: bool,
            _on_error: &mut dyn FnMut(&Component, &ResolveError),
        ) -> Option<String> {
            Some(component.url.clone())
        }

        fn download(
            &self,
            _url: &str,
            destination: &Path,
            observer: &mut dyn DownloadObserver,
        ) -> DownloadResult {
            let result = DownloadResult::fail(destination);
            observer.on_complete(&result);
            result
        }
    }

    #[test]
    fn register_creates_missing_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("Config").join("act.config.xml");
        let server = TextServer::default();
        let mut host = XmlHostConfig::new(&path, &server);

        host.register_plugin(Path::new("C:\\ACT\\plugin\\Foo\\Foo.dll"), true)
            .unwrap();

        let plugins = xml::list_plugins(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(plugins, vec![PluginEntry::new("C:\\ACT\\plugin\\Foo\\Foo.dll", true)]);
    }

    #[test]
    fn register_keeps_existing_entries() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("act.config.xml");
        fs::write(
            &path,
            r#"<Config><ActPlugins><Plugin Enabled="true" Path="C:\old.dll"/></ActPlugins></Config>"#,
        )
        .unwrap();
        let server = TextServer::default();
        let mut host = XmlHostConfig::new(&path, &server);

        host.register_plugin(Path::new("C:\\new.dll"), true).unwrap();
        host.register_plugin(Path::new("C:\\NEW.dll"), true).unwrap();

        let plugins = xml::list_plugins(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(plugins.len(), 2);
    }

    #[test]
    fn merge_writes_new_destination() {
        let temp = TempDir::new().unwrap();
        let server = TextServer::default();
        let mut host = XmlHostConfig::new(temp.path().join("host.xml"), &server);
        let dest = temp.path().join("Config").join("plugin.xml");

        let outcome = host
            .merge_configuration("https://x/plugin.xml", &dest, false)
            .unwrap();

        assert_eq!(outcome, MergeOutcome::Written);
        assert_eq!(
            fs::read_to_string(&dest).unwrap(),
            "<Settings source=\"https://x/plugin.xml\"/>"
        );
    }

    #[test]
    fn merge_keeps_existing_without_overwrite() {
        let temp = TempDir::new().unwrap();
        let server = TextServer::default();
        let mut host = XmlHostConfig::new(temp.path().join("host.xml"), &server);
        let dest = temp.path().join("plugin.xml");
        fs::write(&dest, "mine").unwrap();

        let outcome = host
            .merge_configuration("https://x/plugin.xml", &dest, false)
            .unwrap();

        assert_eq!(outcome, MergeOutcome::Kept);
        assert_eq!(fs::read_to_string(&dest).unwrap(), "mine");
        assert!(server.requests.borrow().is_empty());
    }

    #[test]
    fn merge_overwrites_when_allowed() {
        let temp = TempDir::new().unwrap();
        let server = TextServer::default();
        let mut host = XmlHostConfig::new(temp.path().join("host.xml"), &server);
        let dest = temp.path().join("plugin.xml");
        fs::write(&dest, "mine").unwrap();

        let outcome = host
            .merge_configuration("https://x/plugin.xml", &dest, true)
            .unwrap();

        assert_eq!(outcome, MergeOutcome::Written);
        assert_ne!(fs::read_to_string(&dest).unwrap(), "mine");
    }

    #[test]
    fn merge_download_failure_is_host_config_error() {
        let temp = TempDir::new().unwrap();
        let server = TextServer::default();
        let mut host = XmlHostConfig::new(temp.path().join("host.xml"), &server);

        let err = host
            .merge_configuration("https://x/missing.xml", &temp.path().join("a.xml"), true)
            .unwrap_err();
        assert!(matches!(err, ActorError::HostConfig { .. }));
    }

    #[test]
    fn default_path_ends_with_host_file_name() {
        if let Some(path) = default_config_path() {
            assert!(path.ends_with("Advanced Combat Tracker/Config/Advanced Combat Tracker.config.xml"));
        }
    }
}
