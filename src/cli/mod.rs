//! Command-line interface.
//!
//! - [`args`] - Argument definitions using clap's derive macros
//! - [`legacy`] - Slash-style switch support
//! - [`run`] - The install run and its settings

pub mod args;
pub mod legacy;
pub mod run;

pub use args::Cli;
pub use run::{CommandResult, RunCommand, RunSettings};
