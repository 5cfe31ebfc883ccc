//! Path helpers shared by the prober, the pipeline and the host merger.
//!
//! Manifests are authored on Windows, so relative paths arrive with `\`
//! separators and `%VAR%` environment tokens. These helpers normalize them
//! for whatever platform the installer runs on.

use regex::{Captures, Regex};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static ENV_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"%([^%\s]+)%").unwrap());

/// Expand `%VAR%` tokens using `lookup`.
///
/// Unknown variables are left verbatim, the way Windows does it.
pub fn expand_env_vars<F>(input: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    ENV_TOKEN
        .replace_all(input, |caps: &Captures<'_>| {
            lookup(&caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Split a manifest path on both separator styles, dropping empty parts.
pub fn split_segments(relative: &str) -> impl Iterator<Item = &str> {
    relative
        .split(['\\', '/'])
        .filter(|s| !s.is_empty() && *s != ".")
}

/// Join a manifest-style relative path onto `base`.
pub fn join_relative(base: &Path, relative: &str) -> PathBuf {
    let mut path = base.to_path_buf();
    for segment in split_segments(relative) {
        path.push(segment);
    }
    path
}

/// Turn a manifest path into a native path.
///
/// Backslashes become separators on platforms that do not use them.
pub fn to_native_path(raw: &str) -> PathBuf {
    if cfg!(windows) {
        PathBuf::from(raw)
    } else {
        PathBuf::from(raw.replace('\\', "/"))
    }
}

/// Whether a manifest path is absolute.
///
/// Recognizes drive-letter paths (`C:\...`) and UNC paths on every platform,
/// plus whatever the host platform considers absolute.
pub fn is_absolute_spec(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    let drive = bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'\\' || bytes[2] == b'/');
    drive || raw.starts_with("\\\\") || Path::new(raw).is_absolute()
}

/// Whether a manifest path has a leading separator marker.
///
/// Such paths are relative to the installed host application directory.
pub fn is_root_relative(raw: &str) -> bool {
    !raw.starts_with("\\\\") && (raw.starts_with('\\') || raw.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "APPDATA" => Some("/home/user/appdata".to_string()),
            "windir" => Some("C:\\Windows".to_string()),
            _ => None,
        }
    }

    #[test]
    fn expands_known_variable() {
        assert_eq!(
            expand_env_vars("%APPDATA%\\Advanced Combat Tracker", lookup),
            "/home/user/appdata\\Advanced Combat Tracker"
        );
    }

    #[test]
    fn leaves_unknown_variable_verbatim() {
        assert_eq!(
            expand_env_vars("%NOPE%\\file.dll", lookup),
            "%NOPE%\\file.dll"
        );
    }

    #[test]
    fn expands_multiple_tokens() {
        assert_eq!(
            expand_env_vars("%windir%;%APPDATA%", lookup),
            "C:\\Windows;/home/user/appdata"
        );
    }

    #[test]
    fn lone_percent_is_untouched() {
        assert_eq!(expand_env_vars("100% done", lookup), "100% done");
    }

    #[test]
    fn join_relative_handles_backslashes() {
        let joined = join_relative(Path::new("/opt/act"), "plugin\\Foo\\Foo.dll");
        assert_eq!(
            joined,
            Path::new("/opt/act").join("plugin").join("Foo").join("Foo.dll")
        );
    }

    #[test]
    fn join_relative_skips_empty_and_dot_segments() {
        let joined = join_relative(Path::new("/opt/act"), "\\.\\Advanced Combat Tracker.exe");
        assert_eq!(joined, Path::new("/opt/act").join("Advanced Combat Tracker.exe"));
    }

    #[cfg(not(windows))]
    #[test]
    fn native_path_converts_backslashes() {
        assert_eq!(
            to_native_path("/home/u\\Config\\a.xml"),
            PathBuf::from("/home/u/Config/a.xml")
        );
    }

    #[test]
    fn drive_letter_paths_are_absolute() {
        assert!(is_absolute_spec("C:\\Program Files\\ACT"));
        assert!(is_absolute_spec("\\\\server\\share\\file"));
        assert!(!is_absolute_spec("ACT\\Advanced Combat Tracker.exe"));
    }

    #[test]
    fn root_relative_marker() {
        assert!(is_root_relative("\\Config\\foo.xml"));
        assert!(is_root_relative("/Config/foo.xml"));
        assert!(!is_root_relative("\\\\server\\share"));
        assert!(!is_root_relative("%APPDATA%\\foo.xml"));
    }
}
