//! Host platform resolution: operating system, distribution, and elevation.
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::RunConfig;
use crate::error::PlatformError;
use crate::exec::Executor;
use crate::logging::Log;
use crate::resources::backend::Backend;

/// Default location of the Linux release-identification file.
pub const OS_RELEASE_PATH: &str = "/etc/os-release";

/// Detected operating system platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    Linux,
    Windows,
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linux => write!(f, "linux"),
            Self::Windows => write!(f, "windows"),
        }
    }
}

/// Supported Linux distributions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distro {
    Debian,
    Ubuntu,
    Kali,
    Fedora,
    Centos,
    Rhel,
    Arch,
}

impl Distro {
    /// Map an `/etc/os-release` identifier onto a supported distribution.
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        match id.trim().to_ascii_lowercase().as_str() {
            "debian" => Some(Self::Debian),
            "ubuntu" => Some(Self::Ubuntu),
            "kali" => Some(Self::Kali),
            "fedora" => Some(Self::Fedora),
            "centos" => Some(Self::Centos),
            "rhel" => Some(Self::Rhel),
            "arch" => Some(Self::Arch),
            _ => None,
        }
    }

    /// System package manager used on this distribution.
    #[must_use]
    pub const fn primary_backend(self) -> Backend {
        match self {
            Self::Debian | Self::Ubuntu | Self::Kali => Backend::Apt,
            Self::Fedora | Self::Centos | Self::Rhel => Backend::Dnf,
            Self::Arch => Backend::Pacman,
        }
    }
}

impl fmt::Display for Distro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Debian => "debian",
            Self::Ubuntu => "ubuntu",
            Self::Kali => "kali",
            Self::Fedora => "fedora",
            Self::Centos => "centos",
            Self::Rhel => "rhel",
            Self::Arch => "arch",
        };
        f.write_str(name)
    }
}

/// Resolved platform information, immutable once computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformContext {
    pub os: Os,
    /// `None` on Windows, or on Linux when a dry run could not identify the
    /// distribution.
    pub distro: Option<Distro>,
    pub is_elevated: bool,
}

impl PlatformContext {
    /// Create a platform context with explicit values.
    #[must_use]
    pub const fn new(os: Os, distro: Option<Distro>, is_elevated: bool) -> Self {
        Self {
            os,
            distro,
            is_elevated,
        }
    }

    #[must_use]
    pub fn is_linux(&self) -> bool {
        self.os == Os::Linux
    }

    #[must_use]
    pub fn is_windows(&self) -> bool {
        self.os == Os::Windows
    }

    /// The backend every other backend is bootstrapped through.
    #[must_use]
    pub fn primary_backend(&self) -> Option<Backend> {
        match self.os {
            Os::Windows => Some(Backend::Winget),
            Os::Linux => self.distro.map(Distro::primary_backend),
        }
    }
}

impl fmt::Display for PlatformContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.distro {
            Some(distro) => write!(f, "{} ({distro})", self.os),
            None => write!(f, "{}", self.os),
        }
    }
}

/// Resolves the [`PlatformContext`] of the host.
#[derive(Debug, Clone)]
pub struct PlatformResolver {
    /// `None` when the compilation target is neither Windows nor Linux.
    os: Option<Os>,
    os_release: PathBuf,
}

impl PlatformResolver {
    /// Resolver for the machine this binary was compiled for.
    #[must_use]
    pub fn host() -> Self {
        let os = if cfg!(target_os = "linux") {
            Some(Os::Linux)
        } else if cfg!(target_os = "windows") {
            Some(Os::Windows)
        } else {
            None
        };
        Self {
            os,
            os_release: PathBuf::from(OS_RELEASE_PATH),
        }
    }

    /// Resolver with an explicit OS and release file.
    #[must_use]
    pub fn new(os: Option<Os>, os_release: &Path) -> Self {
        Self {
            os,
            os_release: os_release.to_path_buf(),
        }
    }

    /// Resolve the platform.
    ///
    /// Elevation is checked before the distribution so that a missing
    /// privilege is reported before anything else.  Under dry-run, an
    /// undeterminable elevation and an unknown distribution are logged and
    /// tolerated.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::Unsupported`] for a non-Windows, non-Linux
    /// host, [`PlatformError::ElevationRequired`] or
    /// [`PlatformError::ElevationUnknown`] outside dry-run when privileges
    /// are missing or cannot be determined, and
    /// [`PlatformError::UnknownDistribution`] outside dry-run when the Linux
    /// distribution is not recognised.
    pub fn resolve(
        &self,
        run: &RunConfig,
        executor: &dyn Executor,
        log: &dyn Log,
    ) -> Result<PlatformContext, PlatformError> {
        let os = self
            .os
            .ok_or_else(|| PlatformError::Unsupported(std::env::consts::OS.to_string()))?;

        let is_elevated = match detect_elevation(os, executor) {
            Ok(elevated) => elevated,
            Err(e) if run.dry_run => {
                log.warn(&format!("{e}; assuming not elevated"));
                false
            }
            Err(e) => return Err(e),
        };
        if !is_elevated {
            if run.dry_run {
                log.warn("not running elevated; continuing because this is a dry run");
            } else {
                return Err(PlatformError::ElevationRequired);
            }
        }

        let distro = match os {
            Os::Windows => None,
            Os::Linux => match self.detect_distro() {
                Ok(distro) => Some(distro),
                Err(e) if run.dry_run => {
                    log.warn(&format!("{e}; simulating with an unknown distribution"));
                    None
                }
                Err(e) => return Err(e),
            },
        };

        Ok(PlatformContext::new(os, distro, is_elevated))
    }

    fn detect_distro(&self) -> Result<Distro, PlatformError> {
        let content = std::fs::read_to_string(&self.os_release).map_err(|e| {
            PlatformError::UnknownDistribution(format!(
                "cannot read {}: {e}",
                self.os_release.display()
            ))
        })?;
        parse_os_release(&content)
    }
}

/// Identify the distribution from `/etc/os-release` content.
///
/// `ID` is matched first; when it is not a supported distribution the
/// space-separated `ID_LIKE` list is tried in order.
///
/// # Errors
///
/// Returns [`PlatformError::UnknownDistribution`] if neither key names a
/// supported distribution.
pub fn parse_os_release(content: &str) -> Result<Distro, PlatformError> {
    let value = |key: &str| {
        content.lines().find_map(|line| {
            line.trim()
                .strip_prefix(key)
                .and_then(|rest| rest.strip_prefix('='))
                .map(|v| v.trim().trim_matches('"').trim_matches('\'').to_string())
        })
    };

    let id = value("ID").unwrap_or_default();
    if let Some(distro) = Distro::from_id(&id) {
        return Ok(distro);
    }
    if let Some(distro) = value("ID_LIKE")
        .iter()
        .flat_map(|like| like.split_whitespace())
        .find_map(Distro::from_id)
    {
        return Ok(distro);
    }

    let shown = if id.is_empty() { "<missing ID>" } else { &id };
    Err(PlatformError::UnknownDistribution(shown.to_string()))
}

/// Probe for administrative privileges.
///
/// Linux: `id -u` prints `0`.  Windows: `net session` succeeds only in an
/// elevated shell.
fn detect_elevation(os: Os, executor: &dyn Executor) -> Result<bool, PlatformError> {
    match os {
        Os::Linux => {
            let result = executor
                .run_unchecked("id", &["-u"])
                .map_err(|e| PlatformError::ElevationUnknown(format!("{e:#}")))?;
            if !result.success {
                return Err(PlatformError::ElevationUnknown(format!(
                    "`id -u` exited with {}",
                    result.code.unwrap_or(-1)
                )));
            }
            Ok(result.stdout.trim() == "0")
        }
        Os::Windows => executor
            .run_unchecked("net", &["session"])
            .map(|r| r.success)
            .map_err(|e| PlatformError::ElevationUnknown(format!("{e:#}"))),
    }
}
