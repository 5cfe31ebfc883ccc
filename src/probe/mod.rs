//! Installed-version detection.
//!
//! A component is up to date when the version found at its `versionCheck`
//! location is exactly equal to the manifest version. Probing never fails:
//! problems are handed to a callback and the component counts as not
//! installed.

pub mod system;

pub use system::{detect_legacy_os, OsProbe, SystemProbe};

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::manifest::{Component, VersionCheck};
use crate::paths;

/// Result of probing one component.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionStatus {
    pub up_to_date: bool,
    /// The matching version, or empty when not up to date.
    pub installed_version: String,
}

impl VersionStatus {
    fn not_installed() -> Self {
        Self::default()
    }
}

/// Why a version could not be read.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("registry value {key};{value} unreadable: {message}")]
    Registry {
        key: String,
        value: String,
        message: String,
    },

    #[error("no product version for {}: {message}", path.display())]
    FileVersion { path: PathBuf, message: String },
}

/// Version probing as seen by the pipeline.
pub trait VersionProbe {
    fn probe(
        &self,
        component: &Component,
        install_root: Option<&Path>,
        on_error: &mut dyn FnMut(&Component, &ProbeError),
    ) -> VersionStatus;
}

/// Probes versions through a [`SystemProbe`].
#[derive(Debug, Default)]
pub struct VersionProber<S> {
    system: S,
}

impl<S: SystemProbe> VersionProber<S> {
    pub fn new(system: S) -> Self {
        Self { system }
    }

    /// Probe without an error callback.
    pub fn check(&self, component: &Component, install_root: Option<&Path>) -> VersionStatus {
        self.probe(component, install_root, &mut |_, _| {})
    }

    /// Where a file-form version check points for this component.
    pub fn resolve_path(&self, component: &Component, raw: &str, install_root: Option<&Path>) -> PathBuf {
        let expanded = if raw.starts_with('%') {
            paths::expand_env_vars(raw, |name| self.system.env_var(name))
        } else {
            raw.to_string()
        };

        match install_root {
            Some(root) if !component.is_prerequisite && !paths::is_absolute_spec(&expanded) => {
                paths::join_relative(root, &expanded)
            }
            _ => PathBuf::from(expanded),
        }
    }

    fn read(&self, component: &Component, install_root: Option<&Path>) -> Result<String, ProbeError> {
        match component.version_check() {
            VersionCheck::Registry { key, value } => self
                .system
                .registry_value(&key, &value)
                .map_err(|e| ProbeError::Registry {
                    key,
                    value,
                    message: format!("{:#}", e),
                }),
            VersionCheck::Environment(raw) | VersionCheck::Path(raw) => {
                let path = self.resolve_path(component, &raw, install_root);
                self.system
                    .product_version(&path)
                    .map_err(|e| ProbeError::FileVersion {
                        path,
                        message: format!("{:#}", e),
                    })
            }
        }
    }
}

impl<S: SystemProbe> VersionProbe for VersionProber<S> {
    fn probe(
        &self,
        component: &Component,
        install_root: Option<&Path>,
        on_error: &mut dyn FnMut(&Component, &ProbeError),
    ) -> VersionStatus {
        match self.read(component, install_root) {
            Ok(found) if !found.trim().is_empty() && found == component.version => VersionStatus {
                up_to_date: true,
                installed_version: found,
            },
            Ok(found) => {
                tracing::debug!(
                    "{}: found version '{}', need '{}'",
                    component.name,
                    found,
                    component.version
                );
                VersionStatus::not_installed()
            }
            Err(e) => {
                tracing::debug!("{}: {}", component.name, e);
                on_error(component, &e);
                VersionStatus::not_installed()
            }
        }
    }
}
