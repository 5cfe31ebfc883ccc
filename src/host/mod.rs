//! The host application's configuration store.
//!
//! Plugins are registered as `Plugin` elements in the host's XML
//! configuration. Plugin configuration files are downloaded and written to
//! their destinations, which may name an environment variable or a path
//! relative to the host install directory.

pub mod store;
pub mod xml;

pub use store::{default_config_path, XmlHostConfig};
pub use xml::PluginEntry;

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::paths;

/// What happened to one configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Written,
    /// The destination existed and overwriting was declined.
    Kept,
}

/// Writes plugin registrations and configuration files.
pub trait HostConfiguration {
    /// Register `path` as a plugin; an existing entry is updated in place.
    fn register_plugin(&mut self, path: &Path, enabled: bool) -> Result<()>;

    /// Download `url` into `destination` unless it exists and `overwrite`
    /// is false.
    fn merge_configuration(
        &mut self,
        url: &str,
        destination: &Path,
        overwrite: bool,
    ) -> Result<MergeOutcome>;

    /// Whether writing `destination` would replace a file.
    fn configuration_exists(&self, destination: &Path) -> bool {
        destination.exists()
    }
}

/// Resolve a configuration destination from the manifest.
///
/// A leading `%` expands environment variables, a leading separator is
/// relative to `install_root`, anything else is used as given. Returns
/// `None` for a root-relative destination when no root is known.
pub fn resolve_destination<F>(raw: &str, install_root: Option<&Path>, lookup: F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = raw.trim();
    if raw.starts_with('%') {
        Some(paths::to_native_path(&paths::expand_env_vars(raw, lookup)))
    } else if paths::is_root_relative(raw) {
        install_root.map(|root| paths::join_relative(root, raw))
    } else {
        Some(paths::to_native_path(raw))
    }
}
