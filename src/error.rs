//! Domain-specific error types for the workstation provisioner.
//!
//! Internal modules return typed errors built with [`thiserror`]. The
//! install command folds fatal ones into [`SetupError`] via `?`, and `main`
//! logs that at FATAL level and maps it to exit code 1.
//!
//! # Error hierarchy
//!
//! ```text
//! SetupError
//! ├── Config(ConfigError)     — manifest unavailable, unparseable, unreadable
//! └── Platform(PlatformError) — unsupported OS/distro, elevation problems
//!
//! BackendError                — package manager bootstrap (per-item)
//! ```
//!
//! Only [`SetupError`] ends the run. [`BackendError`] is captured by the
//! orchestrator into per-item outcomes and never propagates past it.

use std::path::PathBuf;

use thiserror::Error;

use crate::resources::backend::Backend;

/// Top-level error type for the provisioner.
#[derive(Error, Debug)]
pub enum SetupError {
    /// Manifest could not be obtained or parsed.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Host platform could not be resolved or is not usable.
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),
}

/// Errors that arise while obtaining and parsing the tool manifest.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Neither the local manifest nor the remote fallback could be obtained.
    #[error("manifest unavailable: {path} does not exist and fetching {url} failed: {reason}")]
    Unavailable {
        /// Local manifest path that was tried first.
        path: PathBuf,
        /// Remote URL that was tried second.
        url: String,
        /// Rendered cause of the fetch failure.
        reason: String,
    },

    /// The manifest content is not valid JSON for the expected schema.
    #[error("failed to parse manifest {origin}: {source}")]
    Parse {
        /// Where the content came from (a path or URL).
        origin: String,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// The manifest exists but could not be read.
    #[error("failed to read manifest {path}: {source}")]
    Io {
        /// Path of the manifest file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Errors that arise while resolving the host platform.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// The operating system is neither Windows nor Linux.
    #[error("unsupported operating system: {0}")]
    Unsupported(String),

    /// The Linux distribution could not be identified or is not supported.
    #[error("unsupported or unknown Linux distribution: {0}")]
    UnknownDistribution(String),

    /// The process is not running with administrative privileges.
    #[error("administrative privileges are required (run as root or from an elevated shell)")]
    ElevationRequired,

    /// Elevation could not be determined.
    #[error("could not determine elevation: {0}")]
    ElevationUnknown(String),
}

/// Errors that arise while making a package manager available.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The backend is absent and has no automated install route.
    #[error("{0} is not installed and cannot be bootstrapped automatically")]
    NotBootstrappable(Backend),

    /// A bootstrap route exists but failed.
    #[error("bootstrapping {backend} failed: {reason}")]
    BootstrapFailed {
        /// Backend that was being bootstrapped.
        backend: Backend,
        /// Rendered cause of the failure.
        reason: String,
    },
}
