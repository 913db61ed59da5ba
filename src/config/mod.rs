//! Run configuration and the tool manifest.
pub mod loader;
pub mod manifest;

use std::path::PathBuf;
use std::time::Duration;

use crate::cli::Cli;
use crate::tasks::InvokingUser;

/// Manifest fetched when no local file exists.
pub const DEFAULT_CONFIG_URL: &str =
    "https://raw.githubusercontent.com/security-workstation/workstation/main/tools.json";

/// Pause between install attempts when retries are enabled.
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// How often a failed install is retried.
///
/// # Examples
///
/// ```
/// use workstation_cli::config::RetryPolicy;
///
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.attempts, 0);
/// assert_eq!(policy.total_attempts(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first failure.
    pub attempts: u32,
    /// Delay before each extra attempt.
    pub delay: Duration,
}

impl RetryPolicy {
    /// Policy with `attempts` retries spaced by the default delay.
    #[must_use]
    pub const fn retries(attempts: u32) -> Self {
        Self {
            attempts,
            delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// First attempt plus retries.
    #[must_use]
    pub const fn total_attempts(&self) -> u32 {
        self.attempts.saturating_add(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::retries(0)
    }
}

/// Settings for a single run, fixed once built.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Log intended mutations instead of performing them.
    pub dry_run: bool,
    /// Local manifest path, tried first.
    pub config_path: PathBuf,
    /// Remote manifest, fetched when `config_path` does not exist.
    pub config_url: String,
    /// Persistent log file.
    pub log_path: PathBuf,
    /// Retry policy for per-tool installs.
    pub retry: RetryPolicy,
    /// User to configure after install (capture group, editor extensions).
    pub invoking_user: Option<InvokingUser>,
}

impl RunConfig {
    /// Build the run configuration from parsed CLI arguments.
    #[must_use]
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            dry_run: cli.dry_run,
            config_path: cli.config.clone(),
            config_url: cli.config_url.clone(),
            log_path: cli
                .log
                .clone()
                .unwrap_or_else(crate::logging::default_log_path),
            retry: RetryPolicy::retries(cli.retries),
            invoking_user: None,
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            config_path: PathBuf::from("tools.json"),
            config_url: DEFAULT_CONFIG_URL.to_string(),
            log_path: crate::logging::default_log_path(),
            retry: RetryPolicy::default(),
            invoking_user: None,
        }
    }
}
