//! The manifest's component record.

use indexmap::IndexMap;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a downloaded artifact is handled.
///
/// Written by name. Read by name or by ordinal (`0` Executable, `1`
/// Archive, `2` Auto), since older manifests store the ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ComponentType {
    /// Run as a silent installer.
    Executable,
    /// Extract to the install directory.
    Archive,
    /// Decide from the downloaded bytes.
    #[default]
    Auto,
}

impl ComponentType {
    const NAMES: &'static [&'static str] = &["Executable", "Archive", "Auto"];

    fn from_ordinal(value: u64) -> Option<Self> {
        match value {
            0 => Some(Self::Executable),
            1 => Some(Self::Archive),
            2 => Some(Self::Auto),
            _ => None,
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "Executable" => Some(Self::Executable),
            "Archive" => Some(Self::Archive),
            "Auto" => Some(Self::Auto),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for ComponentType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ComponentTypeVisitor;

        impl Visitor<'_> for ComponentTypeVisitor {
            type Value = ComponentType;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a component type name or ordinal")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                ComponentType::from_name(v)
                    .ok_or_else(|| E::unknown_variant(v, ComponentType::NAMES))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                ComponentType::from_ordinal(v).ok_or_else(|| {
                    E::invalid_value(de::Unexpected::Unsigned(v), &"0, 1 or 2")
                })
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                u64::try_from(v)
                    .ok()
                    .and_then(ComponentType::from_ordinal)
                    .ok_or_else(|| E::invalid_value(de::Unexpected::Signed(v), &"0, 1 or 2"))
            }
        }

        deserializer.deserialize_any(ComponentTypeVisitor)
    }
}

/// Where the installed version of a component is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionCheck {
    /// `$<key path>;<value name>`
    Registry { key: String, value: String },
    /// `%VAR%\...`, expanded before reading the file version.
    Environment(String),
    /// A file path, absolute or relative to the install root.
    Path(String),
}

impl VersionCheck {
    /// Classify a raw `versionCheck` string by its leading character.
    ///
    /// A registry spec without a `;` keeps an empty value name; reading it
    /// fails later and the component is reported as not installed.
    pub fn parse(raw: &str) -> Self {
        if let Some(rest) = raw.strip_prefix('$') {
            let (key, value) = rest.split_once(';').unwrap_or((rest, ""));
            VersionCheck::Registry {
                key: key.to_string(),
                value: value.to_string(),
            }
        } else if raw.starts_with('%') {
            VersionCheck::Environment(raw.to_string())
        } else {
            VersionCheck::Path(raw.to_string())
        }
    }
}

/// One installable unit described in the manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub install_order: i32,
    pub url: String,
    pub file_name: String,
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub version_check: String,
    #[serde(default)]
    pub component_type: ComponentType,
    #[serde(default)]
    pub is_plugin: bool,
    #[serde(default, rename = "isFromGitHub")]
    pub is_from_github: bool,
    #[serde(default)]
    pub is_prerequisite: bool,
    #[serde(default)]
    pub can_be_skipped: bool,
    #[serde(default)]
    pub install_arguments: String,
    #[serde(default)]
    pub win7_install_arguments: String,
    #[serde(default)]
    pub libraries: Vec<String>,
    /// Source URL to destination, merged in manifest order.
    #[serde(default)]
    pub configurations: IndexMap<String, String>,
}

impl Component {
    /// The classified `versionCheck`.
    pub fn version_check(&self) -> VersionCheck {
        VersionCheck::parse(&self.version_check)
    }

    /// Install arguments for the current OS.
    ///
    /// `win7InstallArguments` wins on the legacy OS when it is non-empty.
    pub fn effective_install_arguments(&self, legacy_os: bool) -> &str {
        if legacy_os && !self.win7_install_arguments.trim().is_empty() {
            &self.win7_install_arguments
        } else {
            &self.install_arguments
        }
    }

    /// Arguments to hand to the installer process.
    ///
    /// For GitHub components the argument fields hold the asset index, so
    /// the installer runs without arguments.
    pub fn installer_arguments(&self, legacy_os: bool) -> &str {
        if self.is_from_github {
            ""
        } else {
            self.effective_install_arguments(legacy_os)
        }
    }

    /// The release asset index for GitHub components.
    pub fn asset_index(&self, legacy_os: bool) -> Option<usize> {
        self.effective_install_arguments(legacy_os)
            .trim()
            .parse()
            .ok()
    }
}
