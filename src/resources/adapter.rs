//! Uniform presence/bootstrap/install operations over every [`Backend`].
use crate::config::RetryPolicy;
use crate::error::BackendError;
use crate::exec::Executor;
use crate::logging::Log;

use super::backend::{Backend, Invocation};
use super::InstallOutcome;

/// Result of making a backend available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bootstrap {
    /// The backend's program was already on `PATH`.
    AlreadyPresent,
    /// The bootstrap commands ran successfully.
    Installed,
    /// Dry run: the bootstrap was logged but not executed.
    Simulated,
}

/// Drives package managers through an [`Executor`].
///
/// Presence checks always run.  Bootstrap, refresh, and install commands are
/// replaced by dry-run log lines when `dry_run` is set.
pub struct BackendAdapter<'a> {
    executor: &'a dyn Executor,
    log: &'a dyn Log,
    dry_run: bool,
    retry: RetryPolicy,
    /// Primary backend of the host, used to install `pip` and `snap`.
    host: Option<Backend>,
}

impl std::fmt::Debug for BackendAdapter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendAdapter")
            .field("executor", &self.executor)
            .field("log", &"<dyn Log>")
            .field("dry_run", &self.dry_run)
            .field("retry", &self.retry)
            .field("host", &self.host)
            .finish()
    }
}

impl<'a> BackendAdapter<'a> {
    #[must_use]
    pub const fn new(
        executor: &'a dyn Executor,
        log: &'a dyn Log,
        dry_run: bool,
        retry: RetryPolicy,
        host: Option<Backend>,
    ) -> Self {
        Self {
            executor,
            log,
            dry_run,
            retry,
            host,
        }
    }

    /// Whether the backend's program is on `PATH`.
    #[must_use]
    pub fn is_backend_present(&self, backend: Backend) -> bool {
        self.executor.which(backend.program())
    }

    /// Make `backend` available, installing it if it is missing.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotBootstrappable`] if the backend is missing
    /// and has no install route, or [`BackendError::BootstrapFailed`] if one
    /// of the bootstrap commands fails.
    pub fn bootstrap_backend(&self, backend: Backend) -> Result<Bootstrap, BackendError> {
        if self.is_backend_present(backend) {
            self.log.debug(&format!("{backend} is present"));
            return Ok(Bootstrap::AlreadyPresent);
        }

        let plan = backend.bootstrap_plan(self.host);
        if self.dry_run {
            match &plan {
                Some(steps) => {
                    for step in steps {
                        self.log
                            .dry_run(&format!("would bootstrap {backend}: {step}"));
                    }
                }
                None => self.log.dry_run(&format!(
                    "would bootstrap {backend} (no automatic route on this host)"
                )),
            }
            return Ok(Bootstrap::Simulated);
        }

        let steps = plan.ok_or(BackendError::NotBootstrappable(backend))?;
        self.log.info(&format!("bootstrapping {backend}"));
        for step in &steps {
            self.log.debug(&format!("running: {step}"));
            self.executor
                .run(step.program, &step.arg_refs())
                .map_err(|e| BackendError::BootstrapFailed {
                    backend,
                    reason: format!("{e:#}"),
                })?;
        }
        self.log.success(&format!("{backend} bootstrapped"));
        Ok(Bootstrap::Installed)
    }

    /// Refresh the backend's package index, if it keeps one.
    ///
    /// A failed refresh is logged as a warning; installs are still attempted
    /// against the stale index.
    pub fn refresh_index(&self, backend: Backend) {
        let Some(refresh) = backend.refresh_invocation() else {
            return;
        };
        if self.dry_run {
            self.log.dry_run(&format!("would refresh {backend} index: {refresh}"));
            return;
        }
        self.log.info(&format!("refreshing {backend} package index"));
        if let Err(e) = self.executor.run(refresh.program, &refresh.arg_refs()) {
            self.log
                .warn(&format!("{backend} index refresh failed: {e:#}"));
        }
    }

    /// Install one package, retrying per the configured [`RetryPolicy`].
    ///
    /// Never fails: a non-zero exit or a spawn error becomes a
    /// [`Failed`](super::InstallStatus::Failed) outcome carrying the exit code
    /// and captured output.
    #[must_use]
    pub fn install_package(&self, backend: Backend, id: &str) -> InstallOutcome {
        let invocation = backend.install_invocation(id);
        if self.dry_run {
            self.log
                .dry_run(&format!("would install {id} via {backend}: {invocation}"));
            return InstallOutcome::simulated(id, backend);
        }

        let total = self.retry.total_attempts();
        let mut detail = String::new();
        for attempt in 1..=total {
            if attempt > 1 {
                self.log.warn(&format!(
                    "retrying {id} ({attempt}/{total}) after {}s",
                    self.retry.delay.as_secs()
                ));
                std::thread::sleep(self.retry.delay);
            }
            match self.attempt(backend, id, &invocation) {
                Ok(outcome) => return outcome,
                Err(reason) => {
                    self.log.debug(&format!("{id}: {reason}"));
                    detail = reason;
                }
            }
        }
        InstallOutcome::failed(id, Some(backend), detail)
    }

    /// One install attempt; `Err` carries the failure detail.
    fn attempt(
        &self,
        backend: Backend,
        id: &str,
        invocation: &Invocation,
    ) -> Result<InstallOutcome, String> {
        self.log.debug(&format!("running: {invocation}"));
        let result = self
            .executor
            .run_unchecked(invocation.program, &invocation.arg_refs())
            .map_err(|e| format!("{e:#}"))?;
        if result.success {
            return Ok(InstallOutcome::success(id, backend));
        }
        let code = result.code.unwrap_or(-1);
        if backend.is_noop_exit(code) {
            return Ok(InstallOutcome::skipped(
                id,
                Some(backend),
                format!("already installed (exit {code})"),
            ));
        }
        let output = result.combined_output();
        Err(if output.is_empty() {
            format!("exit {code}")
        } else {
            format!("exit {code}: {output}")
        })
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::resources::InstallStatus;
    use crate::resources::backend::WINGET_ALREADY_INSTALLED;
    use crate::resources::test_helpers::{RecordingExecutor, RecordingLog};

    fn no_delay(attempts: u32) -> RetryPolicy {
        RetryPolicy {
            attempts,
            delay: Duration::ZERO,
        }
    }

    #[test]
    fn debug_hides_logger() {
        let executor = RecordingExecutor::new();
        let log = RecordingLog::default();
        let adapter = BackendAdapter::new(&executor, &log, true, no_delay(0), Some(Backend::Apt));
        let debug = format!("{adapter:?}");
        assert!(debug.starts_with("BackendAdapter"));
        assert!(debug.contains("<dyn Log>"));
        assert!(debug.contains("host: Some(Apt)"));
    }

    fn adapter<'a>(
        executor: &'a RecordingExecutor,
        log: &'a RecordingLog,
        dry_run: bool,
    ) -> BackendAdapter<'a> {
        BackendAdapter::new(executor, log, dry_run, no_delay(0), Some(Backend::Apt))
    }

    #[test]
    fn presence_uses_program_lookup() {
        let executor = RecordingExecutor::new().with_present(&["apt-get", "pip3"]);
        let log = RecordingLog::default();
        let adapter = adapter(&executor, &log, false);
        assert!(adapter.is_backend_present(Backend::Apt));
        assert!(adapter.is_backend_present(Backend::Pip));
        assert!(!adapter.is_backend_present(Backend::Snap));
        assert!(executor.calls().is_empty());
    }

    #[test]
    fn install_success() {
        let executor = RecordingExecutor::new();
        let log = RecordingLog::default();
        let outcome = adapter(&executor, &log, false).install_package(Backend::Apt, "nmap");
        assert_eq!(outcome.status, InstallStatus::Success);
        assert_eq!(
            executor.calls(),
            ["env DEBIAN_FRONTEND=noninteractive apt-get install -y nmap"]
        );
    }

    #[test]
    fn install_failure_carries_exit_code_and_output() {
        let executor = RecordingExecutor::new().failing("install -y nope", 100);
        let log = RecordingLog::default();
        let outcome = adapter(&executor, &log, false).install_package(Backend::Apt, "nope");
        assert_eq!(outcome.status, InstallStatus::Failed);
        let detail = outcome.detail.unwrap();
        assert!(detail.starts_with("exit 100: "), "{detail}");
        assert!(detail.contains("simulated failure"), "{detail}");
    }

    #[test]
    fn install_spawn_error_is_failed_not_fatal() {
        let executor = RecordingExecutor::new().unspawnable("pip3");
        let log = RecordingLog::default();
        let outcome = adapter(&executor, &log, false).install_package(Backend::Pip, "yara");
        assert_eq!(outcome.status, InstallStatus::Failed);
        assert!(outcome.detail.unwrap().contains("failed to execute"));
    }

    #[test]
    fn winget_already_installed_is_skipped() {
        let executor =
            RecordingExecutor::new().failing("--id Git.Git", WINGET_ALREADY_INSTALLED);
        let log = RecordingLog::default();
        let outcome = adapter(&executor, &log, false).install_package(Backend::Winget, "Git.Git");
        assert_eq!(outcome.status, InstallStatus::Skipped);
    }

    #[test]
    fn dry_run_install_spawns_nothing() {
        let executor = RecordingExecutor::new();
        let log = RecordingLog::default();
        let outcome = adapter(&executor, &log, true).install_package(Backend::Dnf, "nmap");
        assert_eq!(outcome.status, InstallStatus::Simulated);
        assert!(executor.calls().is_empty());
        assert_eq!(
            log.messages("dry_run"),
            ["would install nmap via dnf: dnf install -y nmap"]
        );
    }

    #[test]
    fn retries_until_attempts_exhausted() {
        let executor = RecordingExecutor::new().failing("flaky", 1);
        let log = RecordingLog::default();
        let adapter =
            BackendAdapter::new(&executor, &log, false, no_delay(2), Some(Backend::Apt));
        let outcome = adapter.install_package(Backend::Apt, "flaky");
        assert_eq!(outcome.status, InstallStatus::Failed);
        assert_eq!(executor.calls().len(), 3);
        assert_eq!(log.messages("warn").len(), 2);
    }

    #[test]
    fn no_retry_after_success() {
        let executor = RecordingExecutor::new();
        let log = RecordingLog::default();
        let adapter =
            BackendAdapter::new(&executor, &log, false, no_delay(5), Some(Backend::Apt));
        assert_eq!(
            adapter.install_package(Backend::Apt, "nmap").status,
            InstallStatus::Success
        );
        assert_eq!(executor.calls().len(), 1);
    }

    #[test]
    fn bootstrap_present_backend_is_noop() {
        let executor = RecordingExecutor::new().with_present(&["snap"]);
        let log = RecordingLog::default();
        let result = adapter(&executor, &log, false).bootstrap_backend(Backend::Snap);
        assert_eq!(result.unwrap(), Bootstrap::AlreadyPresent);
        assert!(executor.calls().is_empty());
    }

    #[test]
    fn bootstrap_pip_through_apt() {
        let executor = RecordingExecutor::new();
        let log = RecordingLog::default();
        let result = adapter(&executor, &log, false).bootstrap_backend(Backend::Pip);
        assert_eq!(result.unwrap(), Bootstrap::Installed);
        assert_eq!(
            executor.calls(),
            [
                "env DEBIAN_FRONTEND=noninteractive apt-get update",
                "env DEBIAN_FRONTEND=noninteractive apt-get install -y python3-pip",
            ]
        );
    }

    #[test]
    fn bootstrap_system_backend_not_bootstrappable() {
        let executor = RecordingExecutor::new();
        let log = RecordingLog::default();
        let err = adapter(&executor, &log, false)
            .bootstrap_backend(Backend::Apt)
            .unwrap_err();
        assert!(matches!(err, BackendError::NotBootstrappable(Backend::Apt)));
        assert!(executor.calls().is_empty());
    }

    #[test]
    fn bootstrap_failure_is_reported() {
        let executor = RecordingExecutor::new().failing("snapd", 1);
        let log = RecordingLog::default();
        let err = adapter(&executor, &log, false)
            .bootstrap_backend(Backend::Snap)
            .unwrap_err();
        assert!(matches!(
            err,
            BackendError::BootstrapFailed {
                backend: Backend::Snap,
                ..
            }
        ));
    }

    #[test]
    fn bootstrap_dry_run_logs_plan() {
        let executor = RecordingExecutor::new();
        let log = RecordingLog::default();
        let result = adapter(&executor, &log, true).bootstrap_backend(Backend::Snap);
        assert_eq!(result.unwrap(), Bootstrap::Simulated);
        assert!(executor.calls().is_empty());
        assert_eq!(
            log.messages("dry_run"),
            [
                "would bootstrap snap: env DEBIAN_FRONTEND=noninteractive apt-get update",
                "would bootstrap snap: env DEBIAN_FRONTEND=noninteractive apt-get install -y snapd",
            ]
        );
    }

    #[test]
    fn refresh_failure_is_warning() {
        let executor = RecordingExecutor::new().failing("apt-get update", 100);
        let log = RecordingLog::default();
        adapter(&executor, &log, false).refresh_index(Backend::Apt);
        assert_eq!(log.messages("warn").len(), 1);
    }

    #[test]
    fn refresh_skipped_for_backends_without_index() {
        let executor = RecordingExecutor::new();
        let log = RecordingLog::default();
        adapter(&executor, &log, false).refresh_index(Backend::Pacman);
        assert!(executor.calls().is_empty());
    }
}
