use std::sync::Arc;

use crate::config::RunConfig;
use crate::config::loader::{self, Fetcher};
use crate::error::SetupError;
use crate::exec::Executor;
use crate::logging::Log;
use crate::platform::PlatformResolver;
use crate::tasks::{self, Context, Summary, install_tools};

/// Run the install command.
///
/// Resolves the platform, loads the manifest, installs every selected tool,
/// then runs the post-install tasks.  Per-tool and per-task failures are
/// logged and counted in the returned [`Summary`]; they never fail the run.
///
/// # Errors
///
/// Returns [`SetupError`] if the platform cannot be used or the manifest
/// cannot be obtained or parsed.  Nothing is installed in that case.
pub fn run(
    run: &RunConfig,
    log: Arc<dyn Log>,
    executor: Arc<dyn Executor>,
    fetcher: &dyn Fetcher,
    resolver: &PlatformResolver,
) -> Result<Summary, SetupError> {
    let version = env!("WORKSTATION_VERSION");
    log.info(&format!("workstation {version}"));
    if run.dry_run {
        log.info("dry run: no changes will be made");
    }

    log.stage("Resolving platform");
    let platform = resolver.resolve(run, &*executor, &*log)?;
    log.info(&format!(
        "platform: {platform}{}",
        if platform.is_elevated { "" } else { " (not elevated)" }
    ));

    log.stage("Loading manifest");
    let manifest = loader::load(run, fetcher, &*log)?;
    log.info(&format!("loaded {} manifest entries", manifest.len()));

    let warnings = manifest.validate();
    if !warnings.is_empty() {
        log.warn(&format!("found {} manifest warning(s):", warnings.len()));
        for warning in &warnings {
            log.warn(&format!("  {warning}"));
        }
    }

    let ctx = Context::new(run, platform, log, executor);
    let summary = install_tools::run(&manifest, &ctx);

    for task in tasks::post_install_tasks() {
        tasks::execute(task.as_ref(), &ctx);
    }

    Ok(summary)
}
