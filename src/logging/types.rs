//! Core logging types: the [`Log`] trait and the persistent log levels.
use std::fmt;

/// Tracing target for stage headers.
pub const STAGE_TARGET: &str = "workstation::stage";
/// Tracing target for successful outcomes.
pub const SUCCESS_TARGET: &str = "workstation::success";
/// Tracing target for dry-run intents.
pub const DRY_RUN_TARGET: &str = "workstation::dry_run";
/// Tracing target for fatal, run-ending errors.
pub const FATAL_TARGET: &str = "workstation::fatal";

/// Level tag written to the persistent log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warning,
    Error,
    Fatal,
    Success,
    DryRun,
}

impl Level {
    /// Map a tracing level and target onto a log-file level.
    ///
    /// Returns `None` for events that never reach the file (debug, trace).
    #[must_use]
    pub fn from_event(level: tracing::Level, target: &str) -> Option<Self> {
        match (level, target) {
            (tracing::Level::ERROR, FATAL_TARGET) => Some(Self::Fatal),
            (tracing::Level::ERROR, _) => Some(Self::Error),
            (tracing::Level::WARN, _) => Some(Self::Warning),
            (tracing::Level::INFO, SUCCESS_TARGET) => Some(Self::Success),
            (tracing::Level::INFO, DRY_RUN_TARGET) => Some(Self::DryRun),
            (tracing::Level::INFO, _) => Some(Self::Info),
            _ => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Fatal => "FATAL",
            Self::Success => "SUCCESS",
            Self::DryRun => "DRYRUN",
        };
        f.write_str(tag)
    }
}

/// Abstraction over logging backends.
///
/// [`Logger`](super::logger::Logger) forwards to `tracing`; tests provide
/// recording implementations so components can be exercised without a
/// global subscriber.
pub trait Log: Send + Sync {
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a debug message (console only, and only when verbose).
    fn debug(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log a recoverable error.
    fn error(&self, msg: &str);
    /// Log a run-ending error.
    fn fatal(&self, msg: &str);
    /// Log a successful outcome.
    fn success(&self, msg: &str);
    /// Log a dry-run intent.
    fn dry_run(&self, msg: &str);
}
