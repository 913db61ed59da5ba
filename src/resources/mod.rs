//! Package manager backends and per-item install outcomes.
pub mod adapter;
pub mod backend;

use std::fmt;

use backend::Backend;

/// Final state of one tool's installation attempt.
///
/// # Examples
///
/// ```
/// use workstation_cli::resources::InstallStatus;
///
/// assert_eq!(InstallStatus::Simulated.to_string(), "simulated");
/// assert_ne!(InstallStatus::Success, InstallStatus::Failed);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStatus {
    /// The package manager reported success.
    Success,
    /// The install command failed or could not be spawned.
    Failed,
    /// Nothing was attempted, or the package manager reported nothing to do.
    Skipped,
    /// Dry run: the command was logged but not executed.
    Simulated,
}

impl fmt::Display for InstallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
            Self::Simulated => "simulated",
        };
        f.write_str(s)
    }
}

/// Outcome of installing a single tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    /// Package identifier as written in the manifest.
    pub tool: String,
    /// Backend used, or `None` when the entry named an unknown source.
    pub backend: Option<Backend>,
    pub status: InstallStatus,
    /// Exit code and captured output on failure, or the skip reason.
    pub detail: Option<String>,
}

impl InstallOutcome {
    fn new(tool: &str, backend: Option<Backend>, status: InstallStatus) -> Self {
        Self {
            tool: tool.to_string(),
            backend,
            status,
            detail: None,
        }
    }

    #[must_use]
    pub fn success(tool: &str, backend: Backend) -> Self {
        Self::new(tool, Some(backend), InstallStatus::Success)
    }

    #[must_use]
    pub fn simulated(tool: &str, backend: Backend) -> Self {
        Self::new(tool, Some(backend), InstallStatus::Simulated)
    }

    #[must_use]
    pub fn failed(tool: &str, backend: Option<Backend>, detail: impl Into<String>) -> Self {
        Self {
            detail: Some(detail.into()),
            ..Self::new(tool, backend, InstallStatus::Failed)
        }
    }

    #[must_use]
    pub fn skipped(tool: &str, backend: Option<Backend>, reason: impl Into<String>) -> Self {
        Self {
            detail: Some(reason.into()),
            ..Self::new(tool, backend, InstallStatus::Skipped)
        }
    }

    /// `name (backend)` label used in log lines.
    #[must_use]
    pub fn label(&self, name: &str) -> String {
        self.backend
            .map_or_else(|| name.to_string(), |backend| format!("{name} ({backend})"))
    }
}
