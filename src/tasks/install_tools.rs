//! Main installation pass: every planned tool, in manifest order.
use std::collections::HashMap;

use super::{Context, Summary};
use crate::config::manifest::{Manifest, PlannedInstall, Target};
use crate::logging::Log;
use crate::resources::adapter::BackendAdapter;
use crate::resources::backend::Backend;
use crate::resources::{InstallOutcome, InstallStatus};

/// Install every tool the manifest selects for the host.
///
/// Failures are logged and counted; the pass always visits the whole list.
/// The primary backend is bootstrapped up front (and its index refreshed),
/// secondary backends lazily on first use.  A backend that cannot be made
/// available fails each of its items.
#[must_use]
pub fn run(manifest: &Manifest, ctx: &Context) -> Summary {
    ctx.log.stage("Installing tools");
    let plan = manifest.plan(&ctx.platform, ctx.dry_run);
    let mut summary = Summary::default();
    if plan.is_empty() {
        ctx.log.info("nothing to install");
        return summary;
    }
    ctx.log.info(&format!("{} tool(s) selected", plan.len()));

    let host = ctx.platform.primary_backend();
    let adapter = BackendAdapter::new(
        &*ctx.executor,
        &*ctx.log,
        ctx.dry_run,
        ctx.retry,
        host,
    );

    let mut available: HashMap<Backend, Result<(), String>> = HashMap::new();
    if let Some(primary) = host {
        if ctx.dry_run {
            ctx.log
                .debug(&format!("dry run: not bootstrapping {primary}"));
            available.insert(primary, Ok(()));
        } else {
            let ready = ensure_available(&adapter, &*ctx.log, primary);
            let used = plan
                .iter()
                .any(|item| item.target == Target::Backend(primary));
            if ready.is_ok() && used {
                adapter.refresh_index(primary);
            }
            available.insert(primary, ready);
        }
    }

    for item in &plan {
        let outcome = match &item.target {
            Target::BlankId => InstallOutcome::skipped(&item.name, None, "blank package id"),
            Target::UnknownSource(source) => InstallOutcome::skipped(
                &item.id,
                None,
                format!("unknown source '{source}'"),
            ),
            &Target::Backend(backend) => {
                let ready = available
                    .entry(backend)
                    .or_insert_with(|| ensure_available(&adapter, &*ctx.log, backend));
                match ready {
                    Ok(()) => adapter.install_package(backend, &item.id),
                    Err(reason) => InstallOutcome::failed(&item.id, Some(backend), reason.clone()),
                }
            }
        };
        report(&*ctx.log, item, &outcome);
        summary.record(&outcome);
    }

    summary
}

fn ensure_available(
    adapter: &BackendAdapter<'_>,
    log: &dyn Log,
    backend: Backend,
) -> Result<(), String> {
    adapter.bootstrap_backend(backend).map(|_| ()).map_err(|e| {
        log.error(&e.to_string());
        format!("backend unavailable: {e}")
    })
}

fn report(log: &dyn Log, item: &PlannedInstall, outcome: &InstallOutcome) {
    let label = outcome.label(&item.name);
    let detail = outcome.detail.as_deref().unwrap_or_default();
    match outcome.status {
        InstallStatus::Success => log.success(&format!("installed {label}")),
        InstallStatus::Failed => log.error(&format!("failed to install {label}: {detail}")),
        InstallStatus::Skipped => log.warn(&format!("skipped {label}: {detail}")),
        // the adapter already logged the intended command
        InstallStatus::Simulated => {}
    }
}
