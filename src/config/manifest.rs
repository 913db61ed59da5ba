//! Tool manifest: the JSON document that lists what to install per platform.
use std::collections::HashSet;

use serde::{Deserialize, Deserializer};

use crate::error::ConfigError;
use crate::platform::{Os, PlatformContext};
use crate::resources::backend::Backend;

/// Deserialize a missing-or-`null` value as `T::default()`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Root of the manifest, keyed by platform.
///
/// # Examples
///
/// ```
/// use workstation_cli::config::manifest::Manifest;
///
/// let m = Manifest::parse(r#"{"linux": {"apt_packages": ["nmap"]}}"#, "inline").unwrap();
/// assert_eq!(m.linux.apt_packages, ["nmap"]);
/// assert!(m.windows.is_empty());
/// assert!(m.linux.pip_packages.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Manifest {
    #[serde(deserialize_with = "null_as_default")]
    pub windows: Vec<ToolEntry>,
    #[serde(deserialize_with = "null_as_default")]
    pub linux: LinuxManifest,
}

/// Linux packages, one ordered list per backend family.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LinuxManifest {
    #[serde(deserialize_with = "null_as_default")]
    pub apt_packages: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub dnf_packages: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub pacman_packages: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub pip_packages: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub snap_packages: Vec<String>,
}

impl LinuxManifest {
    /// Package list for a Linux backend family (empty for Windows backends).
    #[must_use]
    pub fn family(&self, backend: Backend) -> &[String] {
        match backend {
            Backend::Apt => &self.apt_packages,
            Backend::Dnf => &self.dnf_packages,
            Backend::Pacman => &self.pacman_packages,
            Backend::Pip => &self.pip_packages,
            Backend::Snap => &self.snap_packages,
            Backend::Winget | Backend::Chocolatey => &[],
        }
    }

    const fn families(&self) -> [(&'static str, &[String]); 5] {
        [
            ("apt_packages", self.apt_packages.as_slice()),
            ("dnf_packages", self.dnf_packages.as_slice()),
            ("pacman_packages", self.pacman_packages.as_slice()),
            ("pip_packages", self.pip_packages.as_slice()),
            ("snap_packages", self.snap_packages.as_slice()),
        ]
    }
}

/// A Windows tool.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ToolEntry {
    /// Display name; falls back to `id` when empty.
    #[serde(default)]
    pub name: String,
    /// Package identifier passed to the backend.
    pub id: String,
    /// `winget` (default), `chocolatey`, or `choco`.
    #[serde(default)]
    pub source: Option<String>,
}

impl ToolEntry {
    /// Backend named by `source`, or `None` if it is not recognised.
    #[must_use]
    pub fn backend(&self) -> Option<Backend> {
        self.source
            .as_deref()
            .map_or(Some(Backend::Winget), Backend::from_source)
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

/// Where a planned install is dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Backend(Backend),
    /// A Windows entry whose `source` names no known backend.
    UnknownSource(String),
    /// An entry with a blank package id; never dispatched.
    BlankId,
}

/// One tool selected for installation, in manifest order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedInstall {
    pub name: String,
    pub id: String,
    pub target: Target,
}

impl PlannedInstall {
    fn package(id: &str, backend: Backend, index: usize) -> Self {
        if id.trim().is_empty() {
            return Self {
                name: format!("{backend}[{index}]"),
                id: String::new(),
                target: Target::BlankId,
            };
        }
        Self {
            name: id.to_string(),
            id: id.to_string(),
            target: Target::Backend(backend),
        }
    }

    fn windows(entry: &ToolEntry, index: usize) -> Self {
        if entry.id.trim().is_empty() {
            let name = entry.name.trim();
            return Self {
                name: if name.is_empty() {
                    format!("windows[{index}]")
                } else {
                    name.to_string()
                },
                id: String::new(),
                target: Target::BlankId,
            };
        }
        Self {
            name: entry.display_name().to_string(),
            id: entry.id.clone(),
            target: entry.backend().map_or_else(
                || Target::UnknownSource(entry.source.clone().unwrap_or_default()),
                Target::Backend,
            ),
        }
    }
}

impl Manifest {
    /// Parse manifest JSON.  `origin` names the source in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the content is not valid JSON for
    /// the manifest schema.
    pub fn parse(content: &str, origin: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|source| ConfigError::Parse {
            origin: origin.to_string(),
            source,
        })
    }

    /// Total number of entries across every platform.
    #[must_use]
    pub fn len(&self) -> usize {
        self.windows.len()
            + self
                .linux
                .families()
                .iter()
                .map(|(_, f)| f.len())
                .sum::<usize>()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Non-fatal problems: blank identifiers and duplicates.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        let mut seen = HashSet::new();
        for (index, entry) in self.windows.iter().enumerate() {
            if entry.id.trim().is_empty() {
                warnings.push(format!("windows[{index}] has a blank id"));
            } else if !seen.insert(entry.id.to_lowercase()) {
                warnings.push(format!("windows: duplicate id '{}'", entry.id));
            }
        }

        for (family, packages) in self.linux.families() {
            let mut seen = HashSet::new();
            for (index, id) in packages.iter().enumerate() {
                if id.trim().is_empty() {
                    warnings.push(format!("linux.{family}[{index}] is blank"));
                } else if !seen.insert(id.as_str()) {
                    warnings.push(format!("linux.{family}: duplicate package '{id}'"));
                }
            }
        }

        warnings
    }

    /// Select the tools for `platform`, preserving manifest order.
    ///
    /// Entries with a blank id are kept as [`Target::BlankId`] so they are
    /// reported rather than passed to a package manager.
    ///
    /// Linux installs the distribution's family, then `pip_packages`, then
    /// `snap_packages`.  On a dry run with an unidentified distribution every
    /// family is selected so the whole manifest is exercised.
    #[must_use]
    pub fn plan(&self, platform: &PlatformContext, dry_run: bool) -> Vec<PlannedInstall> {
        match platform.os {
            Os::Windows => self
                .windows
                .iter()
                .enumerate()
                .map(|(index, entry)| PlannedInstall::windows(entry, index))
                .collect(),
            Os::Linux => {
                let system: &[Backend] = match platform.primary_backend() {
                    Some(Backend::Apt) => &[Backend::Apt],
                    Some(Backend::Dnf) => &[Backend::Dnf],
                    Some(Backend::Pacman) => &[Backend::Pacman],
                    None if dry_run => &[Backend::Apt, Backend::Dnf, Backend::Pacman],
                    _ => &[],
                };
                system
                    .iter()
                    .chain(&[Backend::Pip, Backend::Snap])
                    .flat_map(|&backend| {
                        self.linux
                            .family(backend)
                            .iter()
                            .enumerate()
                            .map(move |(index, id)| PlannedInstall::package(id, backend, index))
                    })
                    .collect()
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::platform::Distro;

    const SAMPLE: &str = r#"{
        "windows": [
            {"name": "Wireshark", "id": "WiresharkFoundation.Wireshark", "source": "winget"},
            {"name": "Sysinternals", "id": "sysinternals", "source": "choco"},
            {"name": "Mystery", "id": "Mystery.Tool", "source": "unknown-backend"},
            {"name": "Git", "id": "Git.Git"}
        ],
        "linux": {
            "apt_packages": ["nmap", "wireshark"],
            "dnf_packages": ["nmap"],
            "pacman_packages": ["nmap"],
            "pip_packages": ["yara-python"],
            "snap_packages": ["ghidra"]
        }
    }"#;

    fn linux(distro: Option<Distro>) -> PlatformContext {
        PlatformContext::new(Os::Linux, distro, true)
    }

    fn ids(plan: &[PlannedInstall]) -> Vec<&str> {
        plan.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn parse_full_manifest() {
        let m = Manifest::parse(SAMPLE, "sample").unwrap();
        assert_eq!(m.windows.len(), 4);
        assert_eq!(m.linux.apt_packages, ["nmap", "wireshark"]);
        assert_eq!(m.len(), 10);
    }

    #[test]
    fn missing_and_null_sections_are_empty() {
        let m = Manifest::parse(r#"{"windows": null, "linux": {"apt_packages": null}}"#, "t")
            .unwrap();
        assert!(m.windows.is_empty());
        assert!(m.linux.apt_packages.is_empty());
        assert!(m.linux.snap_packages.is_empty());

        let m = Manifest::parse("{}", "t").unwrap();
        assert!(m.is_empty());
        assert_eq!(m, Manifest::default());
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let err = Manifest::parse(r#"{"linux": {"apt_packages": ["nmap",]}}"#, "bad.json")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { ref origin, .. } if origin == "bad.json"));
    }

    #[test]
    fn wrong_shape_is_parse_error() {
        let err = Manifest::parse(r#"{"linux": {"apt_packages": "nmap"}}"#, "t").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn windows_entry_requires_id() {
        assert!(Manifest::parse(r#"{"windows": [{"name": "x"}]}"#, "t").is_err());
    }

    #[test]
    fn tool_entry_backend_resolution() {
        let m = Manifest::parse(SAMPLE, "sample").unwrap();
        assert_eq!(m.windows[0].backend(), Some(Backend::Winget));
        assert_eq!(m.windows[1].backend(), Some(Backend::Chocolatey));
        assert_eq!(m.windows[2].backend(), None);
        assert_eq!(m.windows[3].backend(), Some(Backend::Winget), "default source");
    }

    #[test]
    fn plan_windows_keeps_order_and_unknown_sources() {
        let m = Manifest::parse(SAMPLE, "sample").unwrap();
        let plan = m.plan(&PlatformContext::new(Os::Windows, None, true), false);
        assert_eq!(
            ids(&plan),
            ["WiresharkFoundation.Wireshark", "sysinternals", "Mystery.Tool", "Git.Git"]
        );
        assert_eq!(
            plan[2].target,
            Target::UnknownSource("unknown-backend".to_string())
        );
        assert_eq!(plan[0].name, "Wireshark");
    }

    #[test]
    fn plan_ubuntu_uses_apt_then_pip_then_snap() {
        let m = Manifest::parse(SAMPLE, "sample").unwrap();
        let plan = m.plan(&linux(Some(Distro::Ubuntu)), false);
        assert_eq!(ids(&plan), ["nmap", "wireshark", "yara-python", "ghidra"]);
        assert_eq!(plan[0].target, Target::Backend(Backend::Apt));
        assert_eq!(plan[2].target, Target::Backend(Backend::Pip));
        assert_eq!(plan[3].target, Target::Backend(Backend::Snap));
    }

    #[test]
    fn plan_fedora_uses_dnf() {
        let m = Manifest::parse(SAMPLE, "sample").unwrap();
        let plan = m.plan(&linux(Some(Distro::Fedora)), false);
        assert_eq!(plan[0].target, Target::Backend(Backend::Dnf));
        assert_eq!(plan.len(), 3);
    }

    #[test]
    fn plan_unknown_distro_dry_run_selects_every_family() {
        let m = Manifest::parse(SAMPLE, "sample").unwrap();
        let plan = m.plan(&linux(None), true);
        assert_eq!(plan.len(), 6);
    }

    #[test]
    fn plan_marks_blank_ids() {
        let m = Manifest::parse(
            r#"{"windows": [{"name": "Empty", "id": " "}, {"id": ""}, {"id": "Git.Git"}],
                "linux": {"apt_packages": ["nmap", "", "tcpdump"]}}"#,
            "t",
        )
        .unwrap();

        let windows = m.plan(&PlatformContext::new(Os::Windows, None, true), false);
        assert_eq!(windows[0].target, Target::BlankId);
        assert_eq!(windows[0].name, "Empty");
        assert_eq!(windows[1].name, "windows[1]");
        assert_eq!(windows[2].target, Target::Backend(Backend::Winget));

        let linux = m.plan(&linux(Some(Distro::Debian)), false);
        assert_eq!(linux[1].target, Target::BlankId);
        assert_eq!(linux[1].name, "apt[1]");
        assert_eq!(linux[2].id, "tcpdump");
    }

    #[test]
    fn plan_missing_family_is_empty() {
        let m = Manifest::parse(r#"{"linux": {"apt_packages": ["nmap"]}}"#, "t").unwrap();
        assert!(m.plan(&linux(Some(Distro::Arch)), false).is_empty());
    }

    #[test]
    fn validate_reports_blanks_and_duplicates() {
        let m = Manifest::parse(
            r#"{
                "windows": [{"id": "Git.Git"}, {"id": "git.git"}, {"id": " "}],
                "linux": {"apt_packages": ["nmap", "nmap", ""], "dnf_packages": ["nmap"]}
            }"#,
            "t",
        )
        .unwrap();
        let warnings = m.validate();
        insta::assert_snapshot!(warnings.join("\n"), @r"
        windows: duplicate id 'git.git'
        windows[2] has a blank id
        linux.apt_packages: duplicate package 'nmap'
        linux.apt_packages[2] is blank
        ");
    }

    #[test]
    fn validate_clean_manifest() {
        let m = Manifest::parse(SAMPLE, "sample").unwrap();
        assert!(m.validate().is_empty());
    }
}
