//! The install run.

use std::path::{Path, PathBuf};

use crate::error::{ActorError, Result};
use crate::executor::SystemExecutor;
use crate::host::{default_config_path, XmlHostConfig};
use crate::manifest::{ManifestLoader, ManifestSource};
use crate::pipeline::{
    establish_install_root, ComponentOutcome, InstallPolicy, Orchestrator, PipelineContext,
    RunReport, Session,
};
use crate::probe::{detect_legacy_os, OsProbe, VersionProber};
use crate::transport::{DownloadMode, HttpTransport};
use crate::ui::{OutputMode, UserInterface};

use super::args::Cli;

const MANIFEST_FILE: &str = "components.json";
const SCRATCH_DIR: &str = "download";

/// Outcome of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandResult {
    /// Whether the command succeeded.
    pub success: bool,

    /// Exit code to use (0 for success, non-zero for failure).
    pub exit_code: i32,
}

impl CommandResult {
    pub fn success() -> Self {
        Self {
            success: true,
            exit_code: 0,
        }
    }

    pub fn failure(exit_code: i32) -> Self {
        Self {
            success: false,
            exit_code,
        }
    }
}

/// Everything a run needs, resolved from flags, environment and defaults.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub install_path: Option<String>,
    pub policy: InstallPolicy,
    pub manifest: ManifestSource,
    pub scratch_dir: PathBuf,
    pub host_config: Option<PathBuf>,
    pub legacy_os: bool,
    pub download_mode: DownloadMode,
}

impl RunSettings {
    pub fn from_cli(cli: &Cli) -> Self {
        let base = exe_dir();
        Self {
            install_path: cli.path.clone(),
            policy: cli.policy(),
            manifest: cli
                .manifest
                .as_deref()
                .map(ManifestSource::parse)
                .unwrap_or_else(|| ManifestSource::File(base.join(MANIFEST_FILE))),
            scratch_dir: cli
                .download_dir
                .clone()
                .unwrap_or_else(|| base.join(SCRATCH_DIR)),
            host_config: cli.host_config.clone(),
            legacy_os: cli.legacy_os || detect_legacy_os(),
            download_mode: if cli.background {
                DownloadMode::Background
            } else {
                DownloadMode::Blocking
            },
        }
    }

    /// Silent runs (`--yes` / `--no`) never ask anything.
    pub fn is_interactive(&self) -> bool {
        self.policy == InstallPolicy::Prompt
    }
}

/// Directory holding the running executable.
fn exe_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_default()
}

/// Installs everything the manifest lists.
pub struct RunCommand {
    settings: RunSettings,
}

impl RunCommand {
    pub fn new(settings: RunSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    pub fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let settings = &self.settings;
        ui.show_header(concat!("Actor ", env!("CARGO_PKG_VERSION")));

        let transport = HttpTransport::new()?.with_mode(settings.download_mode);
        let manifest = ManifestLoader::new().load(&settings.manifest, &transport)?;
        tracing::info!("Loaded {} components", manifest.components().len());

        let root = establish_install_root(settings.install_path.as_deref(), ui)?;
        let host_path = match &settings.host_config {
            Some(path) => path.clone(),
            None => default_config_path().ok_or_else(|| {
                ActorError::Other(anyhow::anyhow!(
                    "Cannot locate the host configuration directory; pass --host-config"
                ))
            })?,
        };
        tracing::debug!("Host configuration: {}", host_path.display());

        let mut host = XmlHostConfig::new(host_path, &transport);
        let prober = VersionProber::new(OsProbe);
        let executor = SystemExecutor;
        let session = Session::new(&settings.scratch_dir, settings.policy)
            .with_install_root(root)
            .with_legacy_os(settings.legacy_os);

        let report = {
            let ctx = PipelineContext {
                transport: &transport,
                prober: &prober,
                executor: &executor,
                host: &mut host,
                ui: &mut *ui,
            };
            Orchestrator::new(ctx, session).run(&manifest)?
        };

        show_summary(ui, &report);
        Ok(CommandResult::success())
    }
}

/// Print what the run did.
pub fn show_summary(ui: &mut dyn UserInterface, report: &RunReport) {
    if ui.output_mode() == OutputMode::Verbose {
        for entry in report.components() {
            let line = match &entry.outcome {
                ComponentOutcome::Installed => format!("{}: installed", entry.name),
                ComponentOutcome::UpToDate => format!("{}: up to date", entry.name),
                ComponentOutcome::Skipped => format!("{}: skipped", entry.name),
                ComponentOutcome::Failed { reason } => format!("{}: failed ({})", entry.name, reason),
            };
            ui.message(&line);
        }
        for path in report.registrations() {
            ui.message(&format!("Registered {}", path.display()));
        }
    }

    ui.success(&format!(
        "{} installed, {} up to date, {} skipped",
        report.installed(),
        report.up_to_date(),
        report.skipped()
    ));
    if !report.is_clean() {
        let failed: Vec<&str> = report
            .components()
            .iter()
            .filter(|c| matches!(c.outcome, ComponentOutcome::Failed { .. }))
            .map(|c| c.name.as_str())
            .collect();
        ui.warning(&format!("Failed: {}", failed.join(", ")));
    }
}
