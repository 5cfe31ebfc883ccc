//! Operating-system reads used by the version prober.

use anyhow::{anyhow, bail, Context, Result};
use std::path::Path;

/// The OS facts a version probe can look at.
pub trait SystemProbe {
    /// Read a string value from a registry key given in Win32 full-path form.
    fn registry_value(&self, key_path: &str, value_name: &str) -> Result<String>;

    /// Read the product version resource of a file.
    fn product_version(&self, path: &Path) -> Result<String>;

    /// Look up an environment variable.
    fn env_var(&self, name: &str) -> Option<String>;
}

/// Registry root keys accepted at the start of a key path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryHive {
    ClassesRoot,
    CurrentUser,
    LocalMachine,
    Users,
    CurrentConfig,
}

/// Split `HKEY_LOCAL_MACHINE\SOFTWARE\...` into its hive and subkey.
pub fn parse_registry_path(key_path: &str) -> Option<(RegistryHive, &str)> {
    let (root, subkey) = match key_path.split_once('\\') {
        Some((root, subkey)) => (root, subkey),
        None => (key_path, ""),
    };
    let hive = match root.to_ascii_uppercase().as_str() {
        "HKEY_CLASSES_ROOT" | "HKCR" => RegistryHive::ClassesRoot,
        "HKEY_CURRENT_USER" | "HKCU" => RegistryHive::CurrentUser,
        "HKEY_LOCAL_MACHINE" | "HKLM" => RegistryHive::LocalMachine,
        "HKEY_USERS" | "HKU" => RegistryHive::Users,
        "HKEY_CURRENT_CONFIG" | "HKCC" => RegistryHive::CurrentConfig,
        _ => return None,
    };
    Some((hive, subkey.trim_end_matches('\\')))
}

/// Reads the real registry, PE resources and process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsProbe;

impl SystemProbe for OsProbe {
    fn registry_value(&self, key_path: &str, value_name: &str) -> Result<String> {
        let (hive, subkey) = parse_registry_path(key_path)
            .ok_or_else(|| anyhow!("'{}' does not start with a registry hive", key_path))?;
        read_registry(hive, subkey, value_name)
    }

    fn product_version(&self, path: &Path) -> Result<String> {
        read_product_version(path)
    }

    fn env_var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Whether an OS version string names Windows 7 (NT 6.1).
pub fn is_legacy_windows(os_version: &str) -> bool {
    let version = os_version.trim();
    version == "7" || version.starts_with("7 ") || version.starts_with("6.1")
}

/// Whether the running system is Windows 7.
pub fn detect_legacy_os() -> bool {
    if !cfg!(windows) {
        return false;
    }
    let legacy = sysinfo::System::os_version().is_some_and(|v| is_legacy_windows(&v));
    tracing::debug!("Legacy OS: {}", legacy);
    legacy
}

#[cfg(windows)]
fn read_registry(hive: RegistryHive, subkey: &str, value_name: &str) -> Result<String> {
    use winreg::enums::{
        HKEY_CLASSES_ROOT, HKEY_CURRENT_CONFIG, HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE, HKEY_USERS,
    };
    use winreg::RegKey;

    let root = RegKey::predef(match hive {
        RegistryHive::ClassesRoot => HKEY_CLASSES_ROOT,
        RegistryHive::CurrentUser => HKEY_CURRENT_USER,
        RegistryHive::LocalMachine => HKEY_LOCAL_MACHINE,
        RegistryHive::Users => HKEY_USERS,
        RegistryHive::CurrentConfig => HKEY_CURRENT_CONFIG,
    });
    let key = root
        .open_subkey(subkey)
        .with_context(|| format!("Failed to open registry key {}", subkey))?;
    key.get_value::<String, _>(value_name)
        .with_context(|| format!("Failed to read registry value {}", value_name))
}

#[cfg(not(windows))]
fn read_registry(hive: RegistryHive, subkey: &str, _value_name: &str) -> Result<String> {
    bail!("No registry on this platform ({:?}\\{})", hive, subkey)
}

/// Product version from a PE file's version resource.
///
/// Prefers the `ProductVersion` string of the first translation and falls
/// back to the fixed binary version.
fn read_product_version(path: &Path) -> Result<String> {
    let map = pelite::FileMap::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    if let Ok(version) = pe64_product_version(map.as_ref()) {
        return Ok(version);
    }
    pe32_product_version(map.as_ref())
        .with_context(|| format!("No version resource in {}", path.display()))
}

fn pe64_product_version(image: &[u8]) -> Result<String> {
    use pelite::pe64::{Pe, PeFile};

    let file = PeFile::from_bytes(image)?;
    let resources = file.resources()?;
    let info = resources
        .version_info()
        .map_err(|e| anyhow!("{:?}", e))?;
    version_from_info(&info)
}

fn pe32_product_version(image: &[u8]) -> Result<String> {
    use pelite::pe32::{Pe, PeFile};

    let file = PeFile::from_bytes(image)?;
    let resources = file.resources()?;
    let info = resources
        .version_info()
        .map_err(|e| anyhow!("{:?}", e))?;
    version_from_info(&info)
}

fn version_from_info(info: &pelite::resources::version_info::VersionInfo<'_>) -> Result<String> {
    let from_strings = info
        .translation()
        .first()
        .and_then(|lang| info.value(*lang, "ProductVersion"))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    if let Some(version) = from_strings {
        return Ok(version);
    }

    match info.fixed() {
        Some(fixed) => {
            let v = &fixed.dwProductVersion;
            Ok(format!("{}.{}.{}.{}", v.Major, v.Minor, v.Patch, v.Build))
        }
        None => bail!("version resource has no product version"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_hive_names() {
        assert_eq!(
            parse_registry_path("HKEY_LOCAL_MACHINE\\SOFTWARE\\WinPcap"),
            Some((RegistryHive::LocalMachine, "SOFTWARE\\WinPcap"))
        );
        assert_eq!(
            parse_registry_path("HKEY_CURRENT_USER\\Software\\Thing\\"),
            Some((RegistryHive::CurrentUser, "Software\\Thing"))
        );
    }

    #[test]
    fn abbreviated_hive_names() {
        assert_eq!(
            parse_registry_path("hklm\\SOFTWARE"),
            Some((RegistryHive::LocalMachine, "SOFTWARE"))
        );
        assert_eq!(parse_registry_path("HKCR").map(|p| p.0), Some(RegistryHive::ClassesRoot));
        assert_eq!(parse_registry_path("HKU\\x").map(|p| p.0), Some(RegistryHive::Users));
        assert_eq!(
            parse_registry_path("HKCC\\x").map(|p| p.0),
            Some(RegistryHive::CurrentConfig)
        );
    }

    #[test]
    fn unknown_hive() {
        assert_eq!(parse_registry_path("SOFTWARE\\WinPcap"), None);
        assert_eq!(parse_registry_path(""), None);
    }

    #[test]
    fn product_version_of_non_pe_file_fails() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("plain.dll");
        std::fs::write(&path, b"definitely not a PE image").unwrap();
        assert!(OsProbe.product_version(&path).is_err());
    }

    #[test]
    fn product_version_of_missing_file_fails() {
        assert!(OsProbe
            .product_version(Path::new("/nonexistent/actor/none.exe"))
            .is_err());
    }

    #[cfg(not(windows))]
    #[test]
    fn registry_is_unavailable_off_windows() {
        assert!(OsProbe
            .registry_value("HKLM\\SOFTWARE\\WinPcap", "Version")
            .is_err());
    }

    #[test]
    fn legacy_windows_versions() {
        assert!(is_legacy_windows("7 (7601)"));
        assert!(is_legacy_windows("6.1.7601"));
        assert!(!is_legacy_windows("10 (19045)"));
        assert!(!is_legacy_windows("11 (22631)"));
    }
}
