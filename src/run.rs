//! Application execution logic.
//!
//! One configuration run: load the existing file, apply flags, optionally
//! walk the wizard, check every option, write the file, then tell the user
//! how to configure the next node.

use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use dbnode_config::config::{ConfigError, ConfigFile, FlagValue, Invocation};
use dbnode_config::network::platform::PlatformFetcher;
use dbnode_config::network::{InterfaceResolver, PROC_NET_ROUTE, RouteError, RouteTable};
use dbnode_config::options::catalog::{HostFacts, standard_options};
use dbnode_config::options::{
    CheckError, Env, MemoryBudget, OptionRegistry, PRODUCT_NAME, Prompter, RegistryError,
    RunMode, assign,
};
use dbnode_config::service::{InterruptGuard, ServiceError};
use dbnode_config::system::{
    DiskProbe, Hypervisor, PROC_ACPI, PROC_MEMINFO, PortProbe, SYS_HYPERVISOR_TYPE, SystemError,
    total_memory_mib,
};
use dbnode_config::time::Clock;

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;

/// Error type for a failed run.
#[derive(Debug, Error)]
pub enum RunError {
    /// The kernel route table could not be read.
    #[error("{0}")]
    Route(#[from] RouteError),

    /// Host memory could not be determined.
    #[error("{0}")]
    System(#[from] SystemError),

    /// The option table is inconsistent.
    #[error("Invalid option table: {0}")]
    Registry(#[from] RegistryError),

    /// Reading or writing the config file failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Some option cannot reach a usable value.
    #[error("Configuration failed: {0}")]
    Check(#[from] CheckError),

    /// The service stopped for reconfiguration did not come back.
    #[error("Error restarting the DBNode service: {0}")]
    Service(#[source] ServiceError),

    /// Printing results failed.
    #[error("Failed to write output: {0}")]
    Output(#[from] io::Error),
}

/// Everything a run needs from the host, behind swappable seams.
pub struct Context {
    /// Name the program was invoked as, repeated in the join command.
    pub program: String,
    /// Source of interactive answers.
    pub prompter: Box<dyn Prompter>,
    /// Interface and address lookups.
    pub resolver: InterfaceResolver,
    /// Port availability.
    pub ports: Box<dyn PortProbe>,
    /// Free space and filesystem types.
    pub disks: Box<dyn DiskProbe>,
    /// Timestamp source for the file header.
    pub clock: Box<dyn Clock>,
    /// Service control shared with the interrupt handler.
    pub guard: Arc<InterruptGuard>,
}

impl Context {
    fn env(&mut self, mode: RunMode) -> Env<'_> {
        Env {
            mode,
            prompter: self.prompter.as_mut(),
            resolver: &mut self.resolver,
            ports: self.ports.as_ref(),
            disks: self.disks.as_ref(),
        }
    }
}

/// Builds the live resolver and the standard option table for this host.
///
/// # Errors
///
/// Returns an error if the route table or `/proc/meminfo` is unreadable.
#[cfg(not(tarpaulin_include))]
pub fn prepare() -> Result<(OptionRegistry, InterfaceResolver), RunError> {
    let routes = RouteTable::load(Path::new(PROC_NET_ROUTE))?;
    let mut resolver = InterfaceResolver::new(Box::new(PlatformFetcher::new()), routes);
    let facts = host_facts(
        Path::new(PROC_MEMINFO),
        Path::new(SYS_HYPERVISOR_TYPE),
        Path::new(PROC_ACPI),
        &mut resolver,
    )?;
    let registry = standard_options(&facts)?;
    Ok((registry, resolver))
}

/// Collects the host-derived defaults.
///
/// # Errors
///
/// Returns [`RunError::System`] if total memory cannot be read.
pub fn host_facts(
    meminfo: &Path,
    hypervisor_type: &Path,
    acpi: &Path,
    resolver: &mut InterfaceResolver,
) -> Result<HostFacts, RunError> {
    let total = total_memory_mib(meminfo)?;
    let hypervisor = Hypervisor::detect(hypervisor_type, acpi);
    tracing::debug!("Host has {total} MiB of memory ({hypervisor:?})");
    Ok(HostFacts {
        memory: MemoryBudget::new(total),
        hugetlb: hypervisor.supports_hugetlb(),
        backend: resolver.default_interface(),
    })
}

/// Runs one configuration pass and reports to `out`.
///
/// A service stopped for `--reconfigure` is started again whether or not
/// the pass succeeded.
///
/// # Errors
///
/// Returns an error if the config file cannot be read or written, an
/// option cannot be made valid, input ends while asking, or the service
/// cannot be restarted.
pub fn execute(
    invocation: &Invocation,
    mode: RunMode,
    registry: &mut OptionRegistry,
    ctx: &mut Context,
    out: &mut dyn Write,
) -> Result<(), RunError> {
    let loaded = mode.load_config || mode.print_config;
    let mut file = if loaded {
        ConfigFile::load(invocation.cli.config_file.clone())?
    } else {
        ConfigFile::new(invocation.cli.config_file.clone())
    };
    if loaded {
        file.apply(registry, &mut ctx.env(mode));
    }
    apply_flags(invocation, registry, &mut ctx.env(mode));

    if mode.print_config {
        writeln!(out, "{}", registry.join_args(false, loaded).join(" "))?;
        return Ok(());
    }

    if mode.reconfigure {
        if let Err(e) = ctx.guard.stop_service() {
            tracing::warn!("{e}; checking ports with the service running");
        }
    }

    let outcome = configure(mode, registry, &file, ctx, out);
    let restarted = restart_service(&ctx.guard, out);
    match (outcome, restarted) {
        (Err(e), Err(restart)) => {
            tracing::error!("{restart}");
            return Err(e);
        }
        (outcome, restarted) => outcome.and(restarted)?,
    }

    report(mode, registry, loaded, &ctx.program, out)?;
    Ok(())
}

/// Applies option flags on top of whatever the file set.
fn apply_flags(invocation: &Invocation, registry: &mut OptionRegistry, env: &mut Env<'_>) {
    for assignment in &invocation.assignments {
        let Some(option) = registry.get_mut(&assignment.variable) else {
            tracing::debug!("No option named {}", assignment.variable);
            continue;
        };
        match &assignment.value {
            FlagValue::Toggle => option.toggle(),
            FlagValue::Value(raw) => assign(option, raw, env),
        }
    }
}

fn configure(
    mode: RunMode,
    registry: &mut OptionRegistry,
    file: &ConfigFile,
    ctx: &mut Context,
    out: &mut dyn Write,
) -> Result<(), RunError> {
    {
        let mut env = ctx.env(mode);
        if mode.wizard {
            env.prompter
                .notify(&format!("Starting {PRODUCT_NAME} configuration wizard...\n"));
            registry.prompt_all(&mut env)?;
        }
        registry.check_all(&mut env)?;
    }
    writeln!(out, "\n{PRODUCT_NAME} successfully configured!")?;
    file.write(registry, mode.force, ctx.clock.as_ref())?;
    Ok(())
}

fn restart_service(guard: &InterruptGuard, out: &mut dyn Write) -> Result<(), RunError> {
    match guard.restart_service() {
        Ok(true) => {
            writeln!(out, "{PRODUCT_NAME} service restarted successfully.")?;
            Ok(())
        }
        Ok(false) => Ok(()),
        Err(e) => Err(RunError::Service(e)),
    }
}

/// Prints the join command (new installs only) and this node's address.
fn report(
    mode: RunMode,
    registry: &OptionRegistry,
    loaded: bool,
    program: &str,
    out: &mut dyn Write,
) -> io::Result<()> {
    if !mode.reconfigure {
        let bar = "= ".repeat(39);
        let mut command = vec![program.to_string()];
        command.extend(registry.join_args(true, loaded));
        command.push("--yes".to_string());

        writeln!(out)?;
        writeln!(out, "{bar}")?;
        writeln!(
            out,
            "Run this command on other machines (after untarring) to configure them \
             as additional {PRODUCT_NAME} nodes:"
        )?;
        writeln!(out, "\t{}", command.join(" "))?;
        writeln!(out, "{bar}")?;
    }

    let backend = registry
        .get("BACKEND_ADDR")
        .map(|option| option.value_string())
        .unwrap_or_default();
    writeln!(
        out,
        "\n*** This Node's IP (Needed later during cluster configuration): {backend}"
    )
}
