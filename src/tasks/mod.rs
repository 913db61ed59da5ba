//! Installation pass and the post-install tasks that follow it.
pub mod capture_group;
mod context;
pub mod editor_extensions;
pub mod install_tools;
mod summary;

pub use context::{Context, InvokingUser};
pub use summary::Summary;

use anyhow::Result;

/// Result of a single task execution.
///
/// # Examples
///
/// ```
/// use workstation_cli::tasks::TaskResult;
///
/// let ok = TaskResult::Ok;
/// let skipped = TaskResult::Skipped("no capture tools".into());
/// let dry = TaskResult::DryRun;
///
/// assert!(matches!(ok, TaskResult::Ok));
/// assert!(matches!(skipped, TaskResult::Skipped(_)));
/// assert!(matches!(dry, TaskResult::DryRun));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskResult {
    /// Task completed successfully.
    Ok,
    /// Task was skipped (nothing to do on this host).
    Skipped(String),
    /// Task ran in dry-run mode.
    DryRun,
}

/// A named, executable task.
pub trait Task: Send + Sync {
    /// Human-readable task name.
    fn name(&self) -> &str;

    /// Whether this task should run on the current platform.
    fn should_run(&self, ctx: &Context) -> bool;

    /// Execute the task.
    ///
    /// # Errors
    ///
    /// Returns an error if a required system command fails.
    fn run(&self, ctx: &Context) -> Result<TaskResult>;
}

/// Tasks run after the main installation pass, in order.
#[must_use]
pub fn post_install_tasks() -> Vec<Box<dyn Task>> {
    vec![
        Box::new(capture_group::ConfigureCaptureGroup),
        Box::new(editor_extensions::InstallEditorExtensions),
    ]
}

/// Execute a task, logging its result.  Task failures never end the run.
pub fn execute(task: &dyn Task, ctx: &Context) -> Option<TaskResult> {
    if !task.should_run(ctx) {
        ctx.log
            .debug(&format!("skipping task: {} (not applicable)", task.name()));
        return None;
    }

    ctx.log.stage(task.name());

    match task.run(ctx) {
        Ok(TaskResult::Skipped(reason)) => {
            ctx.log.warn(&format!("skipped: {reason}"));
            Some(TaskResult::Skipped(reason))
        }
        Ok(result) => Some(result),
        Err(e) => {
            ctx.log.error(&format!("{}: {e:#}", task.name()));
            None
        }
    }
}
