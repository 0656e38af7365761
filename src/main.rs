//! DBNode configurator
//!
//! Entry point for the dbnode-config application.

use std::io::{self, IsTerminal};
use std::process::ExitCode;
use std::sync::Arc;

use dbnode_config::config::{Invocation, command};
use dbnode_config::options::StdioPrompter;
use dbnode_config::service::{InitctlService, InterruptGuard};
use dbnode_config::system::{HostDisks, HostPorts};
use dbnode_config::time::SystemClock;

mod app;
mod run;

use app::{exit_code, print_run_hint, setup_tracing};
use run::{Context, RunError};

/// Main entry point.
///
/// Excluded from coverage as it's the thin wrapper around testable components.
#[cfg(not(tarpaulin_include))]
fn main() -> ExitCode {
    // Option flags come from the host-derived option table, so it is built
    // before the command line can be parsed.
    let prepared = run::prepare().and_then(|(registry, resolver)| {
        let command = command(&registry)?;
        Ok((registry, resolver, command))
    });
    let (mut registry, resolver, command) = match prepared {
        Ok(prepared) => prepared,
        Err(e) => {
            eprintln!("Error: {e}");
            return exit_code::FAILURE;
        }
    };

    let invocation = match Invocation::parse_from(command, &registry, std::env::args_os()) {
        Ok(invocation) => invocation,
        Err(e) => e.exit(),
    };

    setup_tracing(invocation.cli.verbose);
    let stdout_is_terminal = io::stdout().is_terminal();
    let mode = invocation.run_mode(stdout_is_terminal);
    if !stdout_is_terminal && !mode.print_config {
        tracing::warn!(
            "Running with no TTY - if the command hangs, it is probably waiting for input. \
             Try again with a TTY, or use --force."
        );
    }

    let service = Arc::new(InitctlService::new(invocation.cli.service.clone()));
    let guard = Arc::new(InterruptGuard::new(service));
    if let Err(e) = guard.install(exit_code::INTERRUPTED) {
        tracing::warn!("Interrupt handler not installed: {e}");
    }

    let mut ctx = Context {
        program: program_name(),
        prompter: Box::new(StdioPrompter),
        resolver,
        ports: Box::new(HostPorts),
        disks: Box::new(HostDisks::default()),
        clock: Box::new(SystemClock),
        guard,
    };

    match run::execute(&invocation, mode, &mut registry, &mut ctx, &mut io::stdout()) {
        Ok(()) => exit_code::SUCCESS,
        Err(e) => report_failure(&e),
    }
}

/// Name this program was invoked as.
fn program_name() -> String {
    std::env::args_os().next().map_or_else(
        || "dbnode-config".to_string(),
        |arg| arg.to_string_lossy().into_owned(),
    )
}

fn report_failure(error: &RunError) -> ExitCode {
    tracing::error!("{error}");
    print_run_hint(error);
    exit_code::FAILURE
}
