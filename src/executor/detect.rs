//! Artifact sniffing.

use std::fs::File;
use std::io::Read;
use std::path::Path;

const MZ: [u8; 2] = *b"MZ";

/// Whether `path` is an installer rather than an archive.
///
/// True for `.exe` and `.msi` names, or for any file that starts with the
/// DOS/PE `MZ` signature. Unreadable files are not executables.
pub fn is_executable(path: &Path) -> bool {
    if has_installer_extension(path) {
        return true;
    }
    let mut magic = [0u8; 2];
    File::open(path)
        .and_then(|mut f| f.read_exact(&mut magic))
        .map(|_| magic == MZ)
        .unwrap_or(false)
}

/// Whether the file name ends in `.msi`.
pub fn is_msi(path: &Path) -> bool {
    extension_is(path, "msi")
}

fn has_installer_extension(path: &Path) -> bool {
    extension_is(path, "exe") || extension_is(path, "msi")
}

fn extension_is(path: &Path, wanted: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(wanted))
}
