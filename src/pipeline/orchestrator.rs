//! Drives every component through probe, download, install and
//! post-install.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ActorError, Result};
use crate::executor::Executor;
use crate::host::{self, HostConfiguration, MergeOutcome};
use crate::manifest::{Component, ComponentType, Manifest};
use crate::paths;
use crate::probe::{ProbeError, VersionProbe};
use crate::transport::{scratch_path, ResolveError, Transport};
use crate::ui::progress::ProgressObserver;
use crate::ui::UserInterface;

use super::session::Session;
use super::state::{ComponentOutcome, InstallState, PipelineEvent, RunReport, StateTracker};

/// Process name of the host application.
pub const HOST_PROCESS: &str = "Advanced Combat Tracker";

/// Directory under the install root holding one folder per plugin.
pub const PLUGIN_DIR: &str = "plugin";

/// The collaborators a run talks to.
pub struct PipelineContext<'a> {
    pub transport: &'a dyn Transport,
    pub prober: &'a dyn VersionProbe,
    pub executor: &'a dyn Executor,
    pub host: &'a mut dyn HostConfiguration,
    pub ui: &'a mut dyn UserInterface,
}

/// Runs the installation pipeline over a manifest.
pub struct Orchestrator<'a> {
    ctx: PipelineContext<'a>,
    session: Session,
    host_stopped: bool,
}

impl<'a> Orchestrator<'a> {
    pub fn new(ctx: PipelineContext<'a>, session: Session) -> Self {
        Self {
            ctx,
            session,
            host_stopped: false,
        }
    }

    pub fn run(&mut self, manifest: &Manifest) -> Result<RunReport> {
        self.run_with_progress(manifest, &mut |_| {})
    }

    /// Run the pipeline, reporting every state change to `progress`.
    ///
    /// A fatal error stops the run immediately. Components already
    /// processed stay installed.
    pub fn run_with_progress(
        &mut self,
        manifest: &Manifest,
        progress: &mut dyn FnMut(PipelineEvent<'_>),
    ) -> Result<RunReport> {
        let plan = manifest.install_plan();
        let mut report = RunReport::new();

        if !plan.prerequisites.is_empty() {
            if self.session.wants_prerequisites(self.ctx.ui)? {
                self.ctx.ui.show_header("Prerequisites");
                for component in &plan.prerequisites {
                    self.process(component, &mut report, progress)?;
                }
            } else {
                for component in &plan.prerequisites {
                    self.skip(component, &mut report, progress);
                }
            }
        }

        if !plan.main.is_empty() {
            self.ctx.ui.show_header("Components");
        }
        for component in &plan.main {
            self.process(component, &mut report, progress)?;
        }

        report.set_registrations(self.session.registrations().to_vec());
        self.remove_scratch_dir();
        Ok(report)
    }

    fn skip(
        &mut self,
        component: &Component,
        report: &mut RunReport,
        progress: &mut dyn FnMut(PipelineEvent<'_>),
    ) {
        let mut tracker = StateTracker::new(&component.name);
        tracker.advance(InstallState::Skipped, progress);
        self.ctx.ui.message(&format!("Skipping {}", component.name));
        report.record(&component.name, ComponentOutcome::Skipped);
    }

    fn process(
        &mut self,
        component: &Component,
        report: &mut RunReport,
        progress: &mut dyn FnMut(PipelineEvent<'_>),
    ) -> Result<()> {
        if component.can_be_skipped && !self.session.wants_component(component, self.ctx.ui)? {
            self.skip(component, report, progress);
            return Ok(());
        }

        let mut tracker = StateTracker::new(&component.name);
        tracker.advance(InstallState::ProbingVersion, progress);
        let status = self.ctx.prober.probe(
            component,
            self.session.install_root(),
            &mut |c: &Component, e: &ProbeError| tracing::debug!("{}: {}", c.name, e),
        );

        if status.up_to_date {
            tracker.advance(InstallState::UpToDate, progress);
            self.ctx.ui.success(&format!(
                "{} {} is up to date",
                component.name, status.installed_version
            ));
            let outcome = if component.is_plugin {
                tracker.advance(InstallState::PostInstall, progress);
                self.finish_plugin(component, &mut tracker, progress, ComponentOutcome::UpToDate)?
            } else {
                ComponentOutcome::UpToDate
            };
            tracker.advance(InstallState::Done, progress);
            report.record(&component.name, outcome);
            return Ok(());
        }

        tracker.advance(InstallState::NeedsInstall, progress);
        let artifact = self.acquire(component, &mut tracker, progress)?;

        if !component.is_prerequisite {
            self.stop_host();
        }

        let executable = match component.component_type {
            ComponentType::Executable => true,
            ComponentType::Archive => false,
            ComponentType::Auto => self.ctx.executor.is_executable(&artifact),
        };

        let failure = if executable {
            tracker.advance(InstallState::Installing, progress);
            self.run_installer(component, &artifact, &mut tracker, progress)?
        } else {
            tracker.advance(InstallState::Extracting, progress);
            self.unpack(component, &artifact, &mut tracker, progress)?
        };

        if let Some(reason) = failure {
            self.ctx.ui.warning(&reason);
            tracker.advance(InstallState::Done, progress);
            report.record(&component.name, ComponentOutcome::Failed { reason });
            return Ok(());
        }

        let outcome = if component.is_plugin {
            tracker.advance(InstallState::PostInstall, progress);
            self.finish_plugin(component, &mut tracker, progress, ComponentOutcome::Installed)?
        } else {
            ComponentOutcome::Installed
        };

        tracker.advance(InstallState::Done, progress);
        if outcome == ComponentOutcome::Installed {
            self.ctx
                .ui
                .success(&format!("Installed {} {}", component.name, component.version));
        }
        report.record(&component.name, outcome);
        Ok(())
    }

    /// Resolve and download the artifact into the scratch directory.
    fn acquire(
        &mut self,
        component: &Component,
        tracker: &mut StateTracker<'_>,
        progress: &mut dyn FnMut(PipelineEvent<'_>),
    ) -> Result<PathBuf> {
        tracker.advance(InstallState::Resolving, progress);
        let mut resolve_error = None;
        let url = self.ctx.transport.resolve_download_url(
            component,
            self.session.legacy_os(),
            &mut |_c: &Component, e: &ResolveError| resolve_error = Some(e.to_string()),
        );
        let Some(url) = url else {
            tracker.advance(InstallState::Fatal, progress);
            return Err(ActorError::UrlResolution {
                component: component.name.clone(),
                message: resolve_error.unwrap_or_else(|| "no download URL".to_string()),
            });
        };

        tracker.advance(InstallState::Downloading, progress);
        if let Err(e) = fs::create_dir_all(self.session.scratch_dir()) {
            tracker.advance(InstallState::Fatal, progress);
            return Err(e.into());
        }
        let destination = scratch_path(self.session.scratch_dir(), component);
        tracing::debug!("Downloading {} to {}", url, destination.display());

        let mut display = self.ctx.ui.start_download(&component.name);
        let result = {
            let mut observer = ProgressObserver::new(&mut *display);
            self.ctx.transport.download(&url, &destination, &mut observer)
        };

        if !result.is_success() {
            tracker.advance(InstallState::Fatal, progress);
            return Err(ActorError::DownloadFailed {
                component: component.name.clone(),
                url,
            });
        }
        Ok(result.file)
    }

    /// Returns a failure reason when the installer reports an error.
    fn run_installer(
        &mut self,
        component: &Component,
        artifact: &Path,
        tracker: &mut StateTracker<'_>,
        progress: &mut dyn FnMut(PipelineEvent<'_>),
    ) -> Result<Option<String>> {
        let args = component.installer_arguments(self.session.legacy_os());
        self.ctx
            .ui
            .message(&format!("Running installer for {}", component.name));
        let code = self.fatal_on_error(tracker, progress, |this| {
            this.ctx.executor.install(artifact, args)
        })?;
        if code != 0 {
            return Ok(Some(format!(
                "Installer for {} exited with code {}",
                component.name, code
            )));
        }
        Ok(None)
    }

    /// Returns a failure reason when the archive cannot be read.
    ///
    /// Prerequisites are system-wide installers with no folder of their
    /// own, so an archive in their place is a failure.
    fn unpack(
        &mut self,
        component: &Component,
        artifact: &Path,
        tracker: &mut StateTracker<'_>,
        progress: &mut dyn FnMut(PipelineEvent<'_>),
    ) -> Result<Option<String>> {
        if component.is_prerequisite {
            return Ok(Some(format!(
                "Prerequisite {} is an archive, not an installer",
                component.name
            )));
        }

        let target = self.fatal_on_error(tracker, progress, |this| this.extract_target(component))?;
        if component.is_plugin && target.exists() {
            if let Err(e) = fs::remove_dir_all(&target) {
                tracing::warn!("Could not remove {}: {}", target.display(), e);
            }
        }

        self.ctx
            .ui
            .message(&format!("Extracting {} to {}", component.name, target.display()));
        if !self.ctx.executor.extract(artifact, &target) {
            return Ok(Some(format!(
                "Could not extract {} from {}",
                component.name,
                artifact.display()
            )));
        }
        Ok(None)
    }

    /// Post-install for a plugin; `done` is the outcome when it succeeds.
    fn finish_plugin(
        &mut self,
        component: &Component,
        tracker: &mut StateTracker<'_>,
        progress: &mut dyn FnMut(PipelineEvent<'_>),
        done: ComponentOutcome,
    ) -> Result<ComponentOutcome> {
        let plugin_dir = self.fatal_on_error(tracker, progress, |this| this.plugin_dir(component))?;
        let failure = self.fatal_on_error(tracker, progress, |this| {
            this.post_install(component, &plugin_dir)
        })?;
        match failure {
            Some(reason) => {
                self.ctx.ui.warning(&reason);
                Ok(ComponentOutcome::Failed { reason })
            }
            None => Ok(done),
        }
    }

    /// Register plugin libraries and merge configuration files.
    ///
    /// Host configuration problems are returned as a failure reason.
    fn post_install(&mut self, component: &Component, plugin_dir: &Path) -> Result<Option<String>> {
        for library in &component.libraries {
            let path = paths::join_relative(plugin_dir, library);
            if let Err(e) = self.ctx.host.register_plugin(&path, true) {
                return Self::host_failure(e);
            }
            self.session.record_registration(path);
        }

        for (url, raw_destination) in &component.configurations {
            let Some(destination) = host::resolve_destination(
                raw_destination,
                self.session.install_root(),
                |name| std::env::var(name).ok(),
            ) else {
                self.ctx.ui.warning(&format!(
                    "No install directory for configuration {}",
                    raw_destination
                ));
                continue;
            };

            let overwrite = if self.ctx.host.configuration_exists(&destination) {
                self.session.overwrite_configurations(self.ctx.ui)?
            } else {
                true
            };
            match self
                .ctx
                .host
                .merge_configuration(url, &destination, overwrite)
            {
                Ok(MergeOutcome::Written) => {
                    tracing::debug!("Wrote configuration {}", destination.display())
                }
                Ok(MergeOutcome::Kept) => self.ctx.ui.message(&format!(
                    "Keeping existing configuration {}",
                    destination.display()
                )),
                Err(e) => return Self::host_failure(e),
            }
        }
        Ok(None)
    }

    /// Host configuration errors fail the component; anything else is fatal.
    fn host_failure(e: ActorError) -> Result<Option<String>> {
        match e {
            ActorError::HostConfig { .. } => Ok(Some(e.to_string())),
            other => Err(other),
        }
    }

    fn extract_target(&self, component: &Component) -> Result<PathBuf> {
        if component.is_plugin {
            let plugin_dir = self.plugin_dir(component)?;
            if let Some(parent) = plugin_dir.parent() {
                fs::create_dir_all(parent)?;
            }
            return Ok(plugin_dir);
        }
        self.install_root(component).map(Path::to_path_buf)
    }

    fn plugin_dir(&self, component: &Component) -> Result<PathBuf> {
        Ok(self
            .install_root(component)?
            .join(PLUGIN_DIR)
            .join(component.name.trim()))
    }

    fn install_root(&self, component: &Component) -> Result<&Path> {
        self.session
            .install_root()
            .ok_or_else(|| ActorError::InstallRootMissing {
                component: component.name.clone(),
            })
    }

    /// Close the host application once, before the first change under the root.
    fn stop_host(&mut self) {
        if !self.host_stopped {
            self.ctx.executor.kill_processes_by_name(HOST_PROCESS);
            self.host_stopped = true;
        }
    }

    fn fatal_on_error<T>(
        &mut self,
        tracker: &mut StateTracker<'_>,
        progress: &mut dyn FnMut(PipelineEvent<'_>),
        step: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        step(self).inspect_err(|_| {
            if tracker.state().can_transition_to(InstallState::Fatal) {
                tracker.advance(InstallState::Fatal, progress);
            }
        })
    }

    fn remove_scratch_dir(&self) {
        let scratch = self.session.scratch_dir();
        if scratch.exists() {
            match fs::remove_dir_all(scratch) {
                Ok(()) => tracing::debug!("Removed {}", scratch.display()),
                Err(e) => tracing::warn!("Could not remove {}: {}", scratch.display(), e),
            }
        }
    }
}
