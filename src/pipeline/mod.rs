//! The installation pipeline.
//!
//! [`Orchestrator`] walks the manifest's install plan, prerequisites first,
//! moving each component through the states in [`InstallState`]. Answers
//! to run-wide questions live in the [`Session`].

pub mod install_path;
pub mod orchestrator;
pub mod session;
pub mod state;

pub use install_path::{establish_install_root, validate_install_path};
pub use orchestrator::{Orchestrator, PipelineContext, HOST_PROCESS};
pub use session::{InstallPolicy, Session};
pub use state::{ComponentOutcome, ComponentReport, InstallState, PipelineEvent, RunReport};
