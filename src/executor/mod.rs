//! Running installers and unpacking archives.
//!
//! [`Executor`] is the seam the pipeline uses; [`SystemExecutor`] does the
//! real work through the helpers in the submodules.

pub mod archive;
pub mod detect;
pub mod process;

pub use archive::{detect_format, extract_archive, ArchiveFormat};
pub use detect::is_executable;
pub use process::{kill_processes_by_name, run_installer, split_arguments};

use std::path::Path;

use crate::error::Result;

/// Artifact handling as seen by the pipeline.
pub trait Executor {
    /// Run `path` as an installer and wait for it. Returns the exit code.
    fn install(&self, path: &Path, args: &str) -> Result<i32>;

    /// Unpack `archive` into `destination`. False only when the archive
    /// itself is unusable.
    fn extract(&self, archive: &Path, destination: &Path) -> bool;

    /// Whether the artifact should be run rather than unpacked.
    fn is_executable(&self, path: &Path) -> bool;

    /// Best-effort termination of processes called `name`.
    fn kill_processes_by_name(&self, name: &str);
}

/// The executor that touches the real system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn install(&self, path: &Path, args: &str) -> Result<i32> {
        run_installer(path, args)
    }

    fn extract(&self, archive: &Path, destination: &Path) -> bool {
        extract_archive(archive, destination).is_ok()
    }

    fn is_executable(&self, path: &Path) -> bool {
        is_executable(path)
    }

    fn kill_processes_by_name(&self, name: &str) {
        kill_processes_by_name(name);
    }
}
