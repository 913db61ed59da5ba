use std::fmt;

use crate::resources::{InstallOutcome, InstallStatus};

/// Outcome counters for one run.
///
/// # Examples
///
/// ```
/// use workstation_cli::tasks::Summary;
///
/// let summary = Summary { success: 3, failed: 1, skipped: 0, simulated: 0 };
/// assert_eq!(summary.total(), 4);
/// assert_eq!(
///     summary.to_string(),
///     "4 tools: 3 succeeded, 1 failed, 0 skipped, 0 simulated"
/// );
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub success: u32,
    pub failed: u32,
    pub skipped: u32,
    pub simulated: u32,
}

impl Summary {
    /// Count one outcome.
    pub const fn record(&mut self, outcome: &InstallOutcome) {
        let counter = match outcome.status {
            InstallStatus::Success => &mut self.success,
            InstallStatus::Failed => &mut self.failed,
            InstallStatus::Skipped => &mut self.skipped,
            InstallStatus::Simulated => &mut self.simulated,
        };
        *counter = counter.saturating_add(1);
    }

    #[must_use]
    pub const fn total(&self) -> u32 {
        self.success
            .saturating_add(self.failed)
            .saturating_add(self.skipped)
            .saturating_add(self.simulated)
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.total();
        let noun = if total == 1 { "tool" } else { "tools" };
        write!(
            f,
            "{total} {noun}: {} succeeded, {} failed, {} skipped, {} simulated",
            self.success, self.failed, self.skipped, self.simulated
        )
    }
}
