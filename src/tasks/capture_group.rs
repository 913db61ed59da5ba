use anyhow::Result;

use super::{Context, Task, TaskResult};
use crate::exec::command_line;

/// Group that may capture packets without root.
const CAPTURE_GROUP: &str = "wireshark";

/// Programs whose presence means packet capture is installed.
const CAPTURE_PROGRAMS: &[&str] = &["dumpcap", "wireshark"];

/// Add the invoking user to the packet capture group.
#[derive(Debug)]
pub struct ConfigureCaptureGroup;

impl Task for ConfigureCaptureGroup {
    fn name(&self) -> &'static str {
        "Configure packet capture group"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.platform.is_linux()
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        if !CAPTURE_PROGRAMS.iter().any(|p| ctx.executor.which(p)) {
            return Ok(TaskResult::Skipped(
                "no packet capture tools found".to_string(),
            ));
        }
        let Some(user) = &ctx.invoking_user else {
            return Ok(TaskResult::Skipped(
                "cannot determine the invoking user (SUDO_USER and USER are unset)".to_string(),
            ));
        };

        let groupadd = ["-f", CAPTURE_GROUP];
        let usermod = ["-aG", CAPTURE_GROUP, user.name.as_str()];

        if ctx.dry_run {
            ctx.log
                .dry_run(&format!("would run: {}", command_line("groupadd", &groupadd)));
            ctx.log
                .dry_run(&format!("would run: {}", command_line("usermod", &usermod)));
            return Ok(TaskResult::DryRun);
        }

        ctx.executor.run("groupadd", &groupadd)?;
        ctx.executor.run("usermod", &usermod)?;
        ctx.log.success(&format!(
            "added {} to the {CAPTURE_GROUP} group (takes effect at next login)",
            user.name
        ));
        Ok(TaskResult::Ok)
    }
}
