//! Application startup and utilities.
//!
//! This module contains exit codes, tracing setup, and error hints
//! that support the main entry point.

use std::io;

use dbnode_config::config::ConfigError;
use dbnode_config::options::CheckError;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::run::RunError;

/// Application exit codes.
pub mod exit_code {
    use std::process::ExitCode;

    /// Success (exit code 0).
    pub const SUCCESS: ExitCode = ExitCode::SUCCESS;

    /// Failure (exit code 1) - unreadable host state, unusable option, file I/O, etc.
    pub const FAILURE: ExitCode = ExitCode::FAILURE;

    /// Interrupted with Ctrl+C (exit code 130).
    ///
    /// A raw status because the interrupt handler exits through
    /// `std::process::exit`.
    pub const INTERRUPTED: i32 = 130;
}

/// Prints helpful hints for common run failures.
pub fn print_run_hint(error: &RunError) {
    match error {
        RunError::Check(CheckError::Prompt { .. }) => {
            eprintln!(
                "\nNo input available. Run from a terminal, or pass --force to accept \
                 best-effort values without asking."
            );
        }
        RunError::Check(CheckError::Fatal { .. }) => {
            eprintln!(
                "\nUnable to achieve a minimum valid config. Contact DBNode Support for assistance."
            );
        }
        RunError::Config(ConfigError::FileRead { .. }) => {
            eprintln!("\nUse --config-file to read a different file, or drop --load-config.");
        }
        _ => {}
    }
}

/// Sets up the tracing subscriber for logging.
///
/// Logs go to stderr; stdout carries prompts and `--print-config` output.
pub fn setup_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}
