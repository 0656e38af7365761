//! Control of the database service around a reconfiguration.
//!
//! Port checks need the running service out of the way, so a reconfigure
//! run stops it first. [`InterruptGuard`] remembers that, so an interrupt
//! can put the terminal back and start the service again before exiting.

use std::io::{self, IsTerminal};
use std::process::{Command, ExitStatus};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use nix::sys::termios::{self, SetArg, Termios};
use thiserror::Error;

/// Error stopping or starting the service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The control command could not be run.
    #[error("Failed to run initctl {action} {job}: {source}")]
    Spawn {
        /// "stop" or "start"
        action: &'static str,
        /// Service job name
        job: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The control command ran and reported failure.
    #[error("initctl {action} {job} failed: {status}")]
    Failed {
        /// "stop" or "start"
        action: &'static str,
        /// Service job name
        job: String,
        /// Exit status of the command
        status: ExitStatus,
    },
}

/// Stops and starts the database service.
pub trait ServiceControl: Send + Sync {
    /// Stops the service.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] if the service could not be stopped.
    fn stop(&self) -> Result<(), ServiceError>;

    /// Starts the service.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] if the service could not be started.
    fn start(&self) -> Result<(), ServiceError>;
}

/// Upstart job driven through `initctl`.
#[derive(Debug, Clone)]
pub struct InitctlService {
    job: String,
}

impl InitctlService {
    /// Controls the job named `job`.
    #[must_use]
    pub fn new(job: impl Into<String>) -> Self {
        Self { job: job.into() }
    }

    fn run(&self, action: &'static str) -> Result<(), ServiceError> {
        tracing::debug!("initctl {action} {}", self.job);
        let status = Command::new("initctl")
            .args([action, self.job.as_str()])
            .status()
            .map_err(|source| ServiceError::Spawn {
                action,
                job: self.job.clone(),
                source,
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(ServiceError::Failed {
                action,
                job: self.job.clone(),
                status,
            })
        }
    }
}

impl ServiceControl for InitctlService {
    fn stop(&self) -> Result<(), ServiceError> {
        self.run("stop")
    }

    fn start(&self) -> Result<(), ServiceError> {
        self.run("start")
    }
}

/// Undoes a run's side effects when it is interrupted.
pub struct InterruptGuard {
    service: Arc<dyn ServiceControl>,
    stopped: AtomicBool,
    terminal: Mutex<Option<Termios>>,
}

impl std::fmt::Debug for InterruptGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterruptGuard")
            .field("stopped", &self.stopped)
            .finish_non_exhaustive()
    }
}

impl InterruptGuard {
    /// Creates a guard, capturing the terminal settings if stdin is a
    /// terminal.
    #[must_use]
    pub fn new(service: Arc<dyn ServiceControl>) -> Self {
        let stdin = io::stdin();
        let terminal = if stdin.is_terminal() {
            termios::tcgetattr(&stdin)
                .inspect_err(|e| tracing::debug!("Terminal attributes unavailable: {e}"))
                .ok()
        } else {
            None
        };
        Self {
            service,
            stopped: AtomicBool::new(false),
            terminal: Mutex::new(terminal),
        }
    }

    /// Installs the process interrupt handler, which runs
    /// [`Self::on_interrupt`] and exits with `exit_code`.
    ///
    /// # Errors
    ///
    /// Returns [`ctrlc::Error`] if a handler is already installed.
    pub fn install(self: &Arc<Self>, exit_code: i32) -> Result<(), ctrlc::Error> {
        let guard = Arc::clone(self);
        ctrlc::set_handler(move || {
            eprintln!("\nQuitting DBNode configuration...");
            guard.on_interrupt();
            std::process::exit(exit_code);
        })
    }

    /// Stops the service and remembers to restart it.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] if the service could not be stopped; it is
    /// then not restarted later either.
    pub fn stop_service(&self) -> Result<(), ServiceError> {
        self.service.stop()?;
        self.stopped.store(true, Ordering::SeqCst);
        tracing::info!("Service stopped for reconfiguration");
        Ok(())
    }

    /// True while the service is stopped by this run.
    #[must_use]
    pub fn service_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Starts the service again if this run stopped it.
    ///
    /// Returns whether a restart was attempted.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError`] if the restart failed.
    pub fn restart_service(&self) -> Result<bool, ServiceError> {
        if !self.stopped.swap(false, Ordering::SeqCst) {
            return Ok(false);
        }
        self.service.start()?;
        tracing::info!("Service restarted");
        Ok(true)
    }

    /// Restores the terminal and restarts a stopped service.
    pub fn on_interrupt(&self) {
        let saved = self
            .terminal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(saved) = saved {
            if let Err(e) = termios::tcsetattr(io::stdin(), SetArg::TCSANOW, &saved) {
                tracing::warn!("Could not restore terminal: {e}");
            }
        }
        match self.restart_service() {
            Ok(true) => eprintln!("DBNode service restarted successfully."),
            Ok(false) => {}
            Err(e) => eprintln!("Error restarting DBNode service: {e}"),
        }
    }
}
