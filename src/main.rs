use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use workstation_cli::cli::Cli;
use workstation_cli::commands;
use workstation_cli::config::RunConfig;
use workstation_cli::config::loader::HttpFetcher;
use workstation_cli::exec::SystemExecutor;
use workstation_cli::logging::{self, Logger};
use workstation_cli::platform::PlatformResolver;
use workstation_cli::tasks::InvokingUser;

fn main() -> ExitCode {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();
    let run = RunConfig {
        invoking_user: InvokingUser::from_env(),
        ..RunConfig::from_cli(&args)
    };

    let file_opened = logging::init_subscriber(args.verbose, &run.log_path);
    let log = Arc::new(Logger::new(&run.log_path));
    if !file_opened {
        log.warn(&format!(
            "cannot open log file {}; logging to console only",
            run.log_path.display()
        ));
    }

    let interrupt_log = Arc::clone(&log);
    if let Err(e) = ctrlc::set_handler(move || {
        interrupt_log.fatal("interrupted");
        std::process::exit(1);
    }) {
        log.warn(&format!("cannot install interrupt handler: {e}"));
    }

    match commands::install::run(
        &run,
        Arc::clone(&log) as _,
        Arc::new(SystemExecutor),
        &HttpFetcher::new(),
        &PlatformResolver::host(),
    ) {
        Ok(summary) => {
            log.print_summary(&summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            log.fatal(&e.to_string());
            ExitCode::FAILURE
        }
    }
}
