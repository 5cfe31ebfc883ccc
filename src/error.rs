//! Error types for Actor operations.
//!
//! This module defines [`ActorError`], the primary error type used throughout
//! the application, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Expected failures of the low-level collaborators (version probing,
//!   URL resolution, extraction) never surface here; they are reported as
//!   booleans, enums or callbacks
//! - `ActorError` carries the conditions that abort a run or need the user
//! - Use `anyhow::Error` (via `ActorError::Other`) for unexpected errors

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for Actor operations.
#[derive(Debug, Error)]
pub enum ActorError {
    /// The manifest could not be fetched or read from its source.
    #[error("Unable to read manifest from {source_desc}: {message}")]
    ManifestFetch {
        source_desc: String,
        message: String,
    },

    /// The manifest is not valid JSON or does not match the component schema.
    #[error("Failed to parse manifest: {message}")]
    ManifestParse { message: String },

    /// The manifest parsed but breaks an invariant.
    #[error("Invalid manifest: {message}")]
    ManifestValidation { message: String },

    /// The download URL of a component could not be determined.
    #[error("Could not resolve download URL for '{component}': {message}")]
    UrlResolution { component: String, message: String },

    /// A component artifact failed to download.
    #[error("Download of '{component}' failed: {url}")]
    DownloadFailed { component: String, url: String },

    /// A component needs the install root but none was established.
    #[error("No install directory available for '{component}'")]
    InstallRootMissing { component: String },

    /// The requested install directory is not usable.
    #[error("Invalid install path '{path}': {reason}")]
    InvalidInstallPath { path: String, reason: String },

    /// An installer process could not be started.
    #[error("Failed to run installer {path}: {message}")]
    Install { path: PathBuf, message: String },

    /// The host configuration store could not be read or written.
    #[error("Host configuration error at {path}: {message}")]
    HostConfig { path: PathBuf, message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ActorError {
    /// Whether this error terminates the whole run.
    ///
    /// Everything except an invalid install path (which the front end may
    /// resolve by asking again) is fatal.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ActorError::InvalidInstallPath { .. })
    }
}

/// Result type alias for Actor operations.
pub type Result<T> = std::result::Result<T, ActorError>;
