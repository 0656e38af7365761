//! The node's option declarations.
//!
//! Declaration order matters twice: path options may only reference paths
//! declared before them, and port options look up the address of an
//! interface option declared before them.

use super::{
    BooleanOption, CoresOption, HugeTlbOption, InterfaceOption, MemoryBudget, MemoryOption,
    OptionMeta, OptionRegistry, PathKind, PathOption, PathRequirements, PortOption, PortSpec,
    RegistryError, TextOption,
};
use crate::config::defaults;
use crate::network::Interface;

/// Host facts that shape option defaults.
#[derive(Debug, Clone)]
pub struct HostFacts {
    /// Memory split derived from the host's total.
    pub memory: MemoryBudget,
    /// Whether the platform runs huge pages reliably.
    pub hugetlb: bool,
    /// Interface carrying the default route, if any.
    pub backend: Option<Interface>,
}

/// Builds the registry of every option the node is configured with.
///
/// # Errors
///
/// Returns [`RegistryError`] if two declarations collide.
pub fn standard_options(host: &HostFacts) -> Result<OptionRegistry, RegistryError> {
    let mut registry = OptionRegistry::new();
    sizing(&mut registry, host)?;
    paths(&mut registry)?;
    network(&mut registry, host)?;
    switches(&mut registry, host)?;
    Ok(registry)
}

fn sizing(registry: &mut OptionRegistry, host: &HostFacts) -> Result<(), RegistryError> {
    registry.register(Box::new(MemoryOption::new(
        OptionMeta::new("NODE_MEMORY", "Memory to use for DBNode, in MiB")
            .flag("node-mem")
            .help("Use {{variable_name}} to specify how much memory (in MiB) to allocate for DBNode."),
        host.memory,
    )))?;
    registry.register(Box::new(TextOption::new(
        OptionMeta::new("MAX_REDO", "Maximum DBNode Redo Space, in MiB"),
        defaults::MAX_REDO_MIB,
    )))?;
    registry.register(Box::new(CoresOption::new(
        OptionMeta::new("CPU_CORES", "CPU cores to use for DBNode")
            .flag("cpu-cores")
            .help(
                "Use {{variable_name}} to limit the number of CPU cores used by DBNode. \
                 Set equal to or less than the licensed core count.",
            ),
    )))?;
    Ok(())
}

// Paths reference each other by $VARIABLE and must stay in this order.
fn paths(registry: &mut OptionRegistry) -> Result<(), RegistryError> {
    registry.register(Box::new(PathOption::new(
        OptionMeta::new("DATA_PATH", "Database Storage").flag("data-path"),
        PathKind::Directory,
        defaults::DATA_PATH,
        PathRequirements {
            min_free_gib: Some(defaults::MIN_FREE_SPACE_GIB),
            valid_fs: defaults::VALID_FILESYSTEMS
                .iter()
                .map(ToString::to_string)
                .collect(),
        },
    )))?;
    registry.register(Box::new(PathOption::new(
        OptionMeta::new("LOG_PATH", "Logs").flag("log-path"),
        PathKind::Directory,
        defaults::LOG_PATH,
        PathRequirements::default(),
    )))?;
    registry.register(Box::new(PathOption::new(
        OptionMeta::new("UI_LOGDIR", "WebUI Logs").flag("ui-log-path"),
        PathKind::Directory,
        defaults::UI_LOGDIR,
        PathRequirements::default(),
    )))?;
    registry.register(Box::new(PathOption::new(
        OptionMeta::new("UI_CACHEDIR", "WebUI Cache"),
        PathKind::Directory,
        defaults::UI_CACHEDIR,
        PathRequirements::default(),
    )))?;
    registry.register(Box::new(PathOption::new(
        OptionMeta::new("UNIX_SOCKET_PATH", "MySQL Protocol Unix Socket").flag("unix-socket"),
        PathKind::File,
        defaults::UNIX_SOCKET_PATH,
        PathRequirements::default(),
    )))?;
    Ok(())
}

// Interfaces precede the ports bound to them.
fn network(registry: &mut OptionRegistry, host: &HostFacts) -> Result<(), RegistryError> {
    registry.register(Box::new(InterfaceOption::new(
        OptionMeta::new("LISTEN_ADDR", "Database Listen Address (Front-End IP)")
            .flag("listen-addr")
            .per_node()
            .help(
                "Use {{variable_name}} to specify on which IP addresses DBNode will accept \
                 client connections. This must be an IP assigned to this host, or 0.0.0.0 \
                 to allow connections at any IP address assigned to this host.",
            ),
        Interface::wildcard(),
        false,
    )))?;
    registry.register(Box::new(PortOption::new(
        OptionMeta::new("MYSQL_PORT", "Database MySQL")
            .flag("mysql-port")
            .help(
                "Use {{variable_name}} to specify the TCP port on which DBNode will accept \
                 MySQL client connections",
            ),
        defaults::MYSQL_PORT,
        PortSpec::tcp().bound_to("LISTEN_ADDR"),
    )))?;
    registry.register(Box::new(InterfaceOption::new(
        OptionMeta::new("BACKEND_ADDR", "Private (Back-End) IP")
            .flag("cluster-addr")
            .per_node(),
        host.backend.clone().unwrap_or_else(Interface::wildcard),
        true,
    )))?;
    registry.register(Box::new(PortOption::new(
        OptionMeta::new("BACKEND_PORT", "Back End Network").flag("cluster-port"),
        defaults::BACKEND_PORT,
        PortSpec::tcp_udp().bound_to("BACKEND_ADDR"),
    )))?;
    registry.register(Box::new(PortOption::new(
        OptionMeta::new("HTTP_PORT", "WebUI HTTP").flag("http-port"),
        defaults::HTTP_PORT,
        PortSpec::tcp(),
    )))?;
    registry.register(Box::new(PortOption::new(
        OptionMeta::new("NANNY_PORT", "Nanny"),
        defaults::NANNY_PORT,
        PortSpec::tcp().fixed(),
    )))?;
    registry.register(Box::new(PortOption::new(
        OptionMeta::new("CONTROL_PORT", "Control"),
        defaults::CONTROL_PORT,
        PortSpec::tcp().fixed(),
    )))?;
    Ok(())
}

fn switches(registry: &mut OptionRegistry, host: &HostFacts) -> Result<(), RegistryError> {
    registry.register(Box::new(BooleanOption::new(
        OptionMeta::new(
            "WRITE_HOSTS",
            "Allow DBNode to modify sshd_config and /etc/hosts. This is required for \
             internode communication for administrative tasks, including upgrades",
        )
        .flag("no-configure-sshd-trust")
        .help(
            "Do not allow DBNode to enable Host-Based Authentication in \
             /etc/ssh/sshd_config and /etc/ssh/ssh_config or modify /etc/hosts.",
        ),
        true,
    )))?;
    registry.register(Box::new(HugeTlbOption::new(
        OptionMeta::new(
            "HUGE_TLB_ENABLE",
            "Enable HugeTLB memory allocation for faster startup. NOTE: This causes \
             instability on some systems, contact DBNode Support before changing from default",
        )
        .flag("toggle-hugetlb")
        .help(
            "Use --{{option_name}} to toggle HugeTLB memory allocation in DBNode. Please \
             check with DBNode Support before modifying this value from the default, \
             especially in virtualized environments.",
        ),
        host.hugetlb,
    )))?;
    Ok(())
}
