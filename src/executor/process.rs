//! Installer processes and process termination.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use sysinfo::System;

use super::detect::is_msi;
use crate::error::{ActorError, Result};

/// Split an argument string the way a Windows command line reads.
///
/// Whitespace separates arguments, double quotes group, and the quotes
/// themselves are dropped.
pub fn split_arguments(args: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;

    for ch in args.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    out.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }
    if has_token {
        out.push(current);
    }
    out
}

/// Build the command that installs `artifact` with `args`.
///
/// `.msi` packages go through `msiexec /i`. The working directory is the
/// artifact's own directory.
pub fn installer_command(artifact: &Path, args: &str) -> Result<Command> {
    let artifact = absolute(artifact)?;
    let mut cmd = if is_msi(&artifact) {
        let mut cmd = Command::new("msiexec");
        cmd.arg("/i").arg(&artifact);
        cmd
    } else {
        Command::new(&artifact)
    };
    cmd.args(split_arguments(args));
    if let Some(dir) = artifact.parent() {
        cmd.current_dir(dir);
    }
    cmd.stdin(Stdio::null());
    Ok(cmd)
}

/// Run an installer to completion and return its exit code.
///
/// A process ended by a signal reports `-1`.
pub fn run_installer(artifact: &Path, args: &str) -> Result<i32> {
    let mut cmd = installer_command(artifact, args)?;
    tracing::debug!("Running {:?}", cmd);
    let status = cmd.status().map_err(|e| ActorError::Install {
        path: artifact.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(status.code().unwrap_or(-1))
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).map_err(|e| ActorError::Install {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Whether a running process name matches `wanted` with or without `.exe`.
pub fn process_name_matches(process_name: &str, wanted: &str) -> bool {
    let strip = |s: &str| -> String {
        let lower = s.trim().to_ascii_lowercase();
        lower
            .strip_suffix(".exe")
            .map(str::to_string)
            .unwrap_or(lower)
    };
    !wanted.trim().is_empty() && strip(process_name) == strip(wanted)
}

/// Kill every running process called `name`. Errors are ignored.
///
/// Returns how many processes were signalled.
pub fn kill_processes_by_name(name: &str) -> usize {
    if name.trim().is_empty() {
        return 0;
    }
    let mut system = System::new();
    system.refresh_processes();

    let mut killed = 0;
    for process in system.processes().values() {
        if process_name_matches(process.name(), name) && process.kill() {
            killed += 1;
        }
    }
    if killed > 0 {
        tracing::debug!("Killed {} process(es) named {}", killed, name);
    }
    killed
}
