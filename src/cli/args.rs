//! CLI argument definitions.
//!
//! The main entry point is the [`Cli`] struct. Slash-style switches are
//! rewritten by [`super::legacy::normalize_args`] before parsing.

use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::pipeline::InstallPolicy;
use crate::ui::OutputMode;

use super::legacy::normalize_args;

/// Actor - installs Advanced Combat Tracker and its plugins.
#[derive(Debug, Parser)]
#[command(name = "actor")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Install directory for the host application
    #[arg(long, env = "ACTOR_INSTALL_PATH", value_name = "DIR")]
    pub path: Option<String>,

    /// Install every optional component without asking
    #[arg(short = 'y', long, conflicts_with = "no")]
    pub yes: bool,

    /// Skip every optional component without asking
    #[arg(short = 'n', long)]
    pub no: bool,

    /// Component manifest (URL or file, defaults to components.json next to the executable)
    #[arg(long, env = "ACTOR_MANIFEST", value_name = "SRC")]
    pub manifest: Option<String>,

    /// Scratch directory for downloads (defaults to download/ next to the executable)
    #[arg(long, env = "ACTOR_DOWNLOAD_DIR", value_name = "DIR")]
    pub download_dir: Option<PathBuf>,

    /// Host configuration file to register plugins in
    #[arg(long, env = "ACTOR_HOST_CONFIG", value_name = "FILE")]
    pub host_config: Option<PathBuf>,

    /// Use Windows 7 installer arguments and release assets
    #[arg(long)]
    pub legacy_os: bool,

    /// Download on a worker thread
    #[arg(long)]
    pub background: bool,

    /// Show verbose output
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Parse the process arguments, accepting slash-style switches.
    pub fn parse_normalized() -> Self {
        Self::parse_from(normalize_args(std::env::args_os()))
    }

    /// Parse from an explicit argument list, accepting slash-style switches.
    pub fn try_parse_normalized<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self::try_parse_from(normalize_args(args))
    }

    pub fn policy(&self) -> InstallPolicy {
        if self.yes {
            InstallPolicy::InstallAll
        } else if self.no {
            InstallPolicy::InstallNone
        } else {
            InstallPolicy::Prompt
        }
    }

    pub fn output_mode(&self) -> OutputMode {
        OutputMode::from_flags(self.verbose, self.quiet)
    }
}
