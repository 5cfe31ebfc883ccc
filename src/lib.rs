//! Actor - installer for Advanced Combat Tracker and its plugins.
//!
//! Actor reads a declarative component manifest, probes which components
//! are already installed, downloads the rest (directly or from the latest
//! GitHub release), runs installers or unpacks archives, and registers
//! plugins in the host application's XML configuration.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`error`] - Error types and result aliases
//! - [`executor`] - Running installers and extracting archives
//! - [`host`] - Host configuration file and plugin registration
//! - [`manifest`] - Component manifest model and loading
//! - [`paths`] - Manifest path conventions and environment expansion
//! - [`pipeline`] - Orchestration of the per-component install pipeline
//! - [`probe`] - Installed-version detection
//! - [`transport`] - Download URL resolution and file transfer
//! - [`ui`] - Interactive prompts, progress bars, and terminal output
//!
//! # Example
//!
//! ```
//! use actor::manifest::Manifest;
//!
//! let manifest = Manifest::from_json(r#"[
//!     {"installOrder": 2, "url": "https://example.com/b.zip", "fileName": "b.zip",
//!      "name": "B", "version": "1.0", "isPlugin": true},
//!     {"installOrder": 1, "url": "https://example.com/a.exe", "fileName": "a.exe",
//!      "name": "A", "version": "2.0"}
//! ]"#).unwrap();
//!
//! let plan = manifest.install_plan();
//! assert_eq!(plan.main[0].name, "A");
//! assert_eq!(plan.main[1].name, "B");
//! ```

pub mod cli;
pub mod error;
pub mod executor;
pub mod host;
pub mod manifest;
pub mod paths;
pub mod pipeline;
pub mod probe;
pub mod transport;
pub mod ui;

pub use error::{ActorError, Result};
