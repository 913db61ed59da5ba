use std::sync::Arc;

use crate::config::{RetryPolicy, RunConfig};
use crate::exec::Executor;
use crate::logging::Log;
use crate::platform::PlatformContext;

/// The human user behind the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokingUser {
    pub name: String,
    /// `true` when taken from `SUDO_USER`, i.e. the run was started via sudo.
    pub via_sudo: bool,
}

impl InvokingUser {
    /// Resolve from `SUDO_USER`, falling back to `USER`.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        Self::from_vars(
            std::env::var("SUDO_USER").ok(),
            std::env::var("USER").ok(),
        )
    }

    fn from_vars(sudo_user: Option<String>, user: Option<String>) -> Option<Self> {
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        non_empty(sudo_user)
            .map(|name| Self {
                name,
                via_sudo: true,
            })
            .or_else(|| {
                non_empty(user).map(|name| Self {
                    name,
                    via_sudo: false,
                })
            })
    }
}

/// Shared context for task execution.
pub struct Context {
    /// Resolved host platform.
    pub platform: PlatformContext,
    /// Logger for output.
    pub log: Arc<dyn Log>,
    /// Log intended mutations instead of performing them.
    pub dry_run: bool,
    /// Retry policy for package installs.
    pub retry: RetryPolicy,
    /// Command executor (for testing or real system calls).
    pub executor: Arc<dyn Executor>,
    pub invoking_user: Option<InvokingUser>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("platform", &self.platform)
            .field("log", &"<dyn Log>")
            .field("dry_run", &self.dry_run)
            .field("retry", &self.retry)
            .field("executor", &self.executor)
            .field("invoking_user", &self.invoking_user)
            .finish()
    }
}

impl Context {
    /// Creates a new context from the run configuration.
    #[must_use]
    pub fn new(
        run: &RunConfig,
        platform: PlatformContext,
        log: Arc<dyn Log>,
        executor: Arc<dyn Executor>,
    ) -> Self {
        Self {
            platform,
            log,
            dry_run: run.dry_run,
            retry: run.retry,
            executor,
            invoking_user: run.invoking_user.clone(),
        }
    }

    /// Replace the invoking user.
    #[must_use]
    pub fn with_invoking_user(mut self, user: Option<InvokingUser>) -> Self {
        self.invoking_user = user;
        self
    }
}
