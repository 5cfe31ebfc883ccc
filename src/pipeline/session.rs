//! Per-run state shared by the pipeline steps.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::manifest::Component;
use crate::ui::{Prompt, UserInterface};

/// How optional questions are answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InstallPolicy {
    /// Install every skippable component and overwrite configurations.
    InstallAll,
    /// Skip every skippable component and keep existing configurations.
    InstallNone,
    /// Ask through the UI.
    #[default]
    Prompt,
}

/// State of one installer run.
#[derive(Debug)]
pub struct Session {
    install_root: Option<PathBuf>,
    scratch_dir: PathBuf,
    legacy_os: bool,
    policy: InstallPolicy,
    overwrite: Option<bool>,
    prerequisites: Option<bool>,
    registrations: Vec<PathBuf>,
}

impl Session {
    pub fn new(scratch_dir: impl Into<PathBuf>, policy: InstallPolicy) -> Self {
        Self {
            install_root: None,
            scratch_dir: scratch_dir.into(),
            legacy_os: false,
            policy,
            overwrite: None,
            prerequisites: None,
            registrations: Vec::new(),
        }
    }

    pub fn with_install_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.install_root = Some(root.into());
        self
    }

    pub fn with_legacy_os(mut self, legacy_os: bool) -> Self {
        self.legacy_os = legacy_os;
        self
    }

    pub fn install_root(&self) -> Option<&Path> {
        self.install_root.as_deref()
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    pub fn legacy_os(&self) -> bool {
        self.legacy_os
    }

    pub fn policy(&self) -> InstallPolicy {
        self.policy
    }

    /// Whether a skippable component should be installed.
    pub fn wants_component(
        &self,
        component: &Component,
        ui: &mut dyn UserInterface,
    ) -> Result<bool> {
        match self.policy {
            InstallPolicy::InstallAll => Ok(true),
            InstallPolicy::InstallNone => Ok(false),
            InstallPolicy::Prompt => {
                let prompt = Prompt::confirm(
                    &format!("component:{}", component.name),
                    format!("Install {} {}?", component.name, component.version),
                    true,
                );
                Ok(ui.prompt(&prompt)?.as_bool().unwrap_or(true))
            }
        }
    }

    /// Whether prerequisites should be installed. Asked at most once.
    pub fn wants_prerequisites(&mut self, ui: &mut dyn UserInterface) -> Result<bool> {
        if let Some(answer) = self.prerequisites {
            return Ok(answer);
        }
        let answer = match self.policy {
            InstallPolicy::InstallAll => true,
            InstallPolicy::InstallNone => false,
            InstallPolicy::Prompt => {
                let prompt = Prompt::confirm(
                    "prerequisites",
                    "Install the required system components first?",
                    true,
                );
                ui.prompt(&prompt)?.as_bool().unwrap_or(true)
            }
        };
        self.prerequisites = Some(answer);
        Ok(answer)
    }

    /// Whether existing configuration files may be replaced. Asked at most once.
    pub fn overwrite_configurations(&mut self, ui: &mut dyn UserInterface) -> Result<bool> {
        if let Some(answer) = self.overwrite {
            return Ok(answer);
        }
        let answer = match self.policy {
            InstallPolicy::InstallAll => true,
            InstallPolicy::InstallNone => false,
            InstallPolicy::Prompt => {
                let prompt = Prompt::confirm(
                    "overwrite_configurations",
                    "Some plugin configuration files already exist. Overwrite them?",
                    false,
                );
                ui.prompt(&prompt)?.as_bool().unwrap_or(false)
            }
        };
        self.overwrite = Some(answer);
        Ok(answer)
    }

    pub fn record_registration(&mut self, path: PathBuf) {
        self.registrations.push(path);
    }

    /// Every plugin library registered during this run.
    pub fn registrations(&self) -> &[PathBuf] {
        &self.registrations
    }
}
