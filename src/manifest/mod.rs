//! Component manifest loading and ordering.
//!
//! The manifest is a JSON array of [`Component`] records. It is loaded once
//! per run and never mutated afterwards.
//!
//! # Modules
//!
//! - [`component`] - The component record and its version-check forms
//! - [`loader`] - Reading the manifest from disk or HTTP, with a cached copy

pub mod component;
pub mod loader;

pub use component::{Component, ComponentType, VersionCheck};
pub use loader::{ManifestLoader, ManifestSource};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{ActorError, Result};

/// The ordered list of components for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    components: Vec<Component>,
}

/// Components split into the two phases of a run, each in install order.
#[derive(Debug)]
pub struct InstallPlan<'a> {
    /// Installed first, subject to the prerequisite opt-in.
    pub prerequisites: Vec<&'a Component>,
    /// The host application and its plugins.
    pub main: Vec<&'a Component>,
}

impl InstallPlan<'_> {
    /// Total number of components in the plan.
    pub fn len(&self) -> usize {
        self.prerequisites.len() + self.main.len()
    }

    /// Whether the plan has no components.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Manifest {
    /// Build a manifest from components, validating invariants.
    pub fn new(components: Vec<Component>) -> Result<Self> {
        let manifest = Self { components };
        manifest.validate()?;
        Ok(manifest)
    }

    /// Parse and validate a manifest document.
    pub fn from_json(json: &str) -> Result<Self> {
        let components: Vec<Component> =
            serde_json::from_str(json).map_err(|e| ActorError::ManifestParse {
                message: e.to_string(),
            })?;
        Self::new(components)
    }

    /// Serialize back to the manifest JSON format.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| ActorError::ManifestParse {
            message: e.to_string(),
        })
    }

    /// Components in manifest order.
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Look up a component by name, ignoring case.
    pub fn get(&self, name: &str) -> Option<&Component> {
        self.components
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Partition into prerequisites and main components.
    ///
    /// Each partition is sorted by `installOrder`; the sort is stable, so
    /// ties keep manifest order.
    pub fn install_plan(&self) -> InstallPlan<'_> {
        let (mut prerequisites, mut main): (Vec<&Component>, Vec<&Component>) =
            self.components.iter().partition(|c| c.is_prerequisite);
        prerequisites.sort_by_key(|c| c.install_order);
        main.sort_by_key(|c| c.install_order);
        InstallPlan {
            prerequisites,
            main,
        }
    }

    /// Check the invariants the pipeline relies on.
    pub fn validate(&self) -> Result<()> {
        let mut file_names = HashSet::new();

        for component in &self.components {
            if component.name.trim().is_empty() {
                return Err(invalid("component with an empty name"));
            }

            let file_name = component.file_name.trim();
            if file_name.is_empty() {
                return Err(invalid(format!("'{}' has an empty fileName", component.name)));
            }
            if file_name.contains(['/', '\\']) || file_name == "." || file_name == ".." {
                return Err(invalid(format!(
                    "'{}' fileName '{}' must be a bare file name",
                    component.name, component.file_name
                )));
            }
            if !file_names.insert(file_name.to_ascii_lowercase()) {
                return Err(invalid(format!(
                    "duplicate fileName '{}' (component '{}')",
                    component.file_name, component.name
                )));
            }

            if component.is_prerequisite && component.component_type == ComponentType::Archive {
                return Err(invalid(format!(
                    "prerequisite '{}' must be an installer, not an archive",
                    component.name
                )));
            }

            if component.is_from_github {
                for legacy_os in [false, true] {
                    if component.asset_index(legacy_os).is_none() {
                        return Err(invalid(format!(
                            "'{}' is a GitHub component but '{}' is not an asset index",
                            component.name,
                            component.effective_install_arguments(legacy_os)
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> ActorError {
    ActorError::ManifestValidation {
        message: message.into(),
    }
}
