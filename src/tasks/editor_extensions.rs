use anyhow::Result;

use super::{Context, Task, TaskResult};
use crate::exec::{self, ExecResult, command_line};

/// Extensions installed into the editor on every run.
pub const EXTENSIONS: &[&str] = &[
    "ms-python.python",
    "ms-vscode.powershell",
    "ms-vscode.hexeditor",
    "redhat.vscode-yaml",
    "redhat.vscode-xml",
];

/// Install the fixed editor extension set.
#[derive(Debug)]
pub struct InstallEditorExtensions;

impl Task for InstallEditorExtensions {
    fn name(&self) -> &'static str {
        "Install editor extensions"
    }

    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn run(&self, ctx: &Context) -> Result<TaskResult> {
        let Some(cmd) = find_code_command(&*ctx.executor) else {
            ctx.log.debug("neither code-insiders nor code found in PATH");
            return Ok(TaskResult::Skipped("editor CLI not found".to_string()));
        };
        ctx.log.debug(&format!("using editor CLI: {cmd}"));

        let mut installed = 0usize;
        for id in EXTENSIONS {
            let (program, args) = invocation(ctx, cmd, id);
            let args: Vec<&str> = args.iter().map(String::as_str).collect();
            if ctx.dry_run {
                ctx.log
                    .dry_run(&format!("would run: {}", command_line(program, &args)));
                continue;
            }
            match ctx.executor.run_unchecked(program, &args) {
                Ok(ExecResult { success: true, .. }) => installed += 1,
                Ok(result) => ctx.log.warn(&format!(
                    "failed to install extension {id}: {}",
                    result.combined_output()
                )),
                Err(e) => ctx
                    .log
                    .warn(&format!("failed to install extension {id}: {e:#}")),
            }
        }

        if ctx.dry_run {
            return Ok(TaskResult::DryRun);
        }
        ctx.log.info(&format!(
            "{installed}/{} extensions installed",
            EXTENSIONS.len()
        ));
        Ok(TaskResult::Ok)
    }
}

/// Find the editor CLI, preferring code-insiders.
#[must_use]
pub fn find_code_command(executor: &dyn exec::Executor) -> Option<&'static str> {
    ["code-insiders", "code"]
        .into_iter()
        .find(|cmd| executor.which(cmd))
}

/// Build the install command for one extension.
///
/// On Windows the CLI is a `.cmd` wrapper and needs `cmd /C`.  On Linux the
/// editor refuses to run as root, so a sudo-started run installs as the
/// invoking user.
fn invocation(ctx: &Context, cmd: &'static str, id: &str) -> (&'static str, Vec<String>) {
    let base = [cmd, "--install-extension", id, "--force"].map(str::to_string);
    if ctx.platform.is_windows() {
        let mut args = vec!["/C".to_string()];
        args.extend(base);
        return ("cmd", args);
    }
    match &ctx.invoking_user {
        Some(user) if user.via_sudo => {
            let mut args = vec!["-u".to_string(), user.name.clone()];
            args.extend(base);
            ("sudo", args)
        }
        _ => (cmd, base.into_iter().skip(1).collect()),
    }
}
