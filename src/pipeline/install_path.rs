//! Choosing and validating the host install directory.

use std::fs;
use std::path::PathBuf;

use crate::error::{ActorError, Result};
use crate::paths;
use crate::ui::{Prompt, UserInterface};

const FORBIDDEN: &[char] = &['<', '>', '"', '|', '?', '*'];

/// `<exe dir>/ACT`, the install directory used when none is requested.
pub fn default_install_root() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("ACT")))
}

/// Check a requested install directory without touching the disk.
pub fn validate_install_path(raw: &str) -> Result<PathBuf> {
    let invalid = |reason: &str| ActorError::InvalidInstallPath {
        path: raw.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(invalid("path is empty"));
    }
    if paths::split_segments(trimmed).any(|segment| segment.contains(FORBIDDEN)) {
        return Err(invalid("path contains one of < > \" | ? *"));
    }
    let path = paths::to_native_path(trimmed);
    if !path.is_absolute() {
        return Err(invalid("path must be absolute"));
    }
    Ok(path)
}

/// Validate `raw` and create the directory.
pub fn prepare_install_root(raw: &str) -> Result<PathBuf> {
    let path = validate_install_path(raw)?;
    fs::create_dir_all(&path).map_err(|e| ActorError::InvalidInstallPath {
        path: raw.to_string(),
        reason: format!("cannot create directory: {}", e),
    })?;
    Ok(path)
}

/// Settle on the install directory for this run.
///
/// Falls back to [`default_install_root`] when nothing is requested. An
/// interactive UI is asked for another directory until one is usable or
/// the answer is empty.
pub fn establish_install_root(
    requested: Option<&str>,
    ui: &mut dyn UserInterface,
) -> Result<PathBuf> {
    let mut candidate = match requested {
        Some(raw) => raw.to_string(),
        None => default_install_root()
            .map(|p| p.display().to_string())
            .unwrap_or_default(),
    };

    loop {
        let err = match prepare_install_root(&candidate) {
            Ok(path) => {
                tracing::info!("Install directory: {}", path.display());
                return Ok(path);
            }
            Err(e) => e,
        };

        if !ui.is_interactive() {
            return Err(err);
        }
        ui.warning(&err.to_string());
        let answer = ui
            .prompt(&Prompt::input(
                "install_path",
                "Install directory (leave empty to cancel)",
                None,
            ))?
            .as_string();
        if answer.trim().is_empty() {
            return Err(err);
        }
        candidate = answer;
    }
}
