//! Host introspection: memory, hypervisor, disks and ports.
//!
//! Filesystem and socket queries sit behind the [`DiskProbe`] and
//! [`PortProbe`] traits so option checks can run against fakes.

use std::fmt;
use std::io;
use std::net::{Ipv4Addr, SocketAddrV4, TcpListener, UdpSocket};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::network::Address;

/// Kernel memory summary.
pub const PROC_MEMINFO: &str = "/proc/meminfo";

/// Hypervisor type file, present only under a hypervisor.
pub const SYS_HYPERVISOR_TYPE: &str = "/sys/hypervisor/type";

/// ACPI tree; absent on Xen paravirtual guests.
pub const PROC_ACPI: &str = "/proc/acpi";

/// Mount table.
pub const PROC_MOUNTS: &str = "/proc/mounts";

/// Error type for host introspection.
#[derive(Debug, Error)]
pub enum SystemError {
    /// A kernel file could not be read.
    #[error("Failed to read '{}': {source}", path.display())]
    Read {
        /// Path that was read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// `/proc/meminfo` had no usable `MemTotal` line.
    #[error("No MemTotal entry in '{}'", path.display())]
    NoMemTotal {
        /// Path that was read
        path: PathBuf,
    },
}

/// Total system memory in MiB from `/proc/meminfo`-formatted text.
#[must_use]
pub fn parse_meminfo(content: &str) -> Option<u64> {
    content.lines().find_map(|line| {
        let mut fields = line.split_whitespace();
        if fields.next()? != "MemTotal:" {
            return None;
        }
        fields.next()?.parse::<u64>().ok().map(|kib| kib / 1024)
    })
}

/// Reads total system memory in MiB.
///
/// # Errors
///
/// Returns [`SystemError`] if the file is unreadable or lacks `MemTotal`.
pub fn total_memory_mib(path: &Path) -> Result<u64, SystemError> {
    let content = std::fs::read_to_string(path).map_err(|source| SystemError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_meminfo(&content).ok_or_else(|| SystemError::NoMemTotal {
        path: path.to_path_buf(),
    })
}

/// Virtualization platform as far as huge pages are concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hypervisor {
    /// No hypervisor type file.
    BareMetal,
    /// Xen with ACPI (hardware virtualized).
    XenHvm,
    /// Xen without ACPI (paravirtualized).
    XenPv,
    /// Any other reported hypervisor.
    Other(String),
}

impl Hypervisor {
    /// Detects the platform from the hypervisor type file and ACPI tree.
    #[must_use]
    pub fn detect(type_path: &Path, acpi_path: &Path) -> Self {
        let Ok(kind) = std::fs::read_to_string(type_path) else {
            return Self::BareMetal;
        };
        match kind.trim() {
            "xen" if acpi_path.exists() => Self::XenHvm,
            "xen" => Self::XenPv,
            other => Self::Other(other.to_string()),
        }
    }

    /// Whether huge pages are safe here.
    ///
    /// Xen PV guests panic with them; other hypervisors are untested.
    #[must_use]
    pub const fn supports_hugetlb(&self) -> bool {
        matches!(self, Self::BareMetal | Self::XenHvm)
    }
}

/// Filesystem queries used by path checks.
pub trait DiskProbe {
    /// Bytes available to unprivileged users on the filesystem holding `path`.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error.
    fn available_bytes(&self, path: &Path) -> io::Result<u64>;

    /// Filesystem type of the mount holding `path`, if known.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error.
    fn fs_type(&self, path: &Path) -> io::Result<Option<String>>;
}

/// Filesystem type of the longest mount point containing `path`.
///
/// `content` is `/proc/mounts`-formatted; the `rootfs` pseudo entry is
/// ignored.
#[must_use]
pub fn mount_fs_type(content: &str, path: &Path) -> Option<String> {
    content
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let device = fields.next()?;
            let mount_point = fields.next()?;
            let fs_type = fields.next()?;
            (device != "rootfs" && path.starts_with(mount_point))
                .then_some((mount_point.len(), fs_type))
        })
        .max_by_key(|(len, _)| *len)
        .map(|(_, fs_type)| fs_type.to_string())
}

/// [`DiskProbe`] over the live host.
#[derive(Debug, Clone)]
pub struct HostDisks {
    mounts: PathBuf,
}

impl HostDisks {
    /// Probe reading the given mount table.
    #[must_use]
    pub fn new(mounts: impl Into<PathBuf>) -> Self {
        Self {
            mounts: mounts.into(),
        }
    }
}

impl Default for HostDisks {
    fn default() -> Self {
        Self::new(PROC_MOUNTS)
    }
}

impl DiskProbe for HostDisks {
    fn available_bytes(&self, path: &Path) -> io::Result<u64> {
        let stat = nix::sys::statvfs::statvfs(path).map_err(io::Error::from)?;
        #[allow(clippy::useless_conversion)]
        let available = u64::from(stat.fragment_size()) * u64::from(stat.blocks_available());
        Ok(available)
    }

    fn fs_type(&self, path: &Path) -> io::Result<Option<String>> {
        let real = std::fs::canonicalize(path)?;
        let content = std::fs::read_to_string(&self.mounts)?;
        Ok(mount_fs_type(&content, &real))
    }
}

/// Transport protocol of a port option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// Stream sockets.
    Tcp,
    /// Datagram sockets.
    Udp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Tcp => "TCP",
            Self::Udp => "UDP",
        })
    }
}

/// Bind-and-release availability check.
pub trait PortProbe {
    /// Binds `port` on `address` for `protocol` and releases it at once.
    ///
    /// # Errors
    ///
    /// Returns the bind error (typically `AddrInUse` or `PermissionDenied`).
    fn try_bind(&self, protocol: Protocol, address: Address, port: u16) -> io::Result<()>;
}

/// [`PortProbe`] using real sockets.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostPorts;

impl PortProbe for HostPorts {
    fn try_bind(&self, protocol: Protocol, address: Address, port: u16) -> io::Result<()> {
        let socket_addr = SocketAddrV4::new(Ipv4Addr::from(address), port);
        match protocol {
            Protocol::Tcp => TcpListener::bind(socket_addr).map(drop),
            Protocol::Udp => UdpSocket::bind(socket_addr).map(drop),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    mod meminfo {
        use super::*;

        #[test]
        fn mem_total_is_converted_to_mib() {
            let content = "MemTotal:        8388608 kB\nMemFree:         1234 kB\n";
            assert_eq!(parse_meminfo(content), Some(8192));
        }

        #[test]
        fn missing_mem_total_is_none() {
            assert_eq!(parse_meminfo("MemFree: 10 kB\n"), None);
        }

        #[test]
        fn unreadable_file_names_path() {
            let err = total_memory_mib(Path::new("/nonexistent/meminfo")).unwrap_err();
            assert!(err.to_string().contains("/nonexistent/meminfo"));
        }

        #[test]
        fn file_without_mem_total_is_an_error() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("meminfo");
            std::fs::write(&path, "SwapTotal: 0 kB\n").unwrap();

            assert!(matches!(
                total_memory_mib(&path),
                Err(SystemError::NoMemTotal { .. })
            ));
        }
    }

    mod hypervisor {
        use super::*;

        fn detect(kind: Option<&str>, acpi: bool) -> Hypervisor {
            let dir = tempfile::tempdir().unwrap();
            let type_path = dir.path().join("type");
            let acpi_path = dir.path().join("acpi");
            if let Some(kind) = kind {
                std::fs::write(&type_path, format!("{kind}\n")).unwrap();
            }
            if acpi {
                std::fs::create_dir(&acpi_path).unwrap();
            }
            Hypervisor::detect(&type_path, &acpi_path)
        }

        #[test]
        fn no_type_file_is_bare_metal() {
            let hv = detect(None, true);
            assert_eq!(hv, Hypervisor::BareMetal);
            assert!(hv.supports_hugetlb());
        }

        #[test]
        fn xen_with_acpi_is_hvm() {
            let hv = detect(Some("xen"), true);
            assert_eq!(hv, Hypervisor::XenHvm);
            assert!(hv.supports_hugetlb());
        }

        #[test]
        fn xen_without_acpi_is_pv() {
            let hv = detect(Some("xen"), false);
            assert_eq!(hv, Hypervisor::XenPv);
            assert!(!hv.supports_hugetlb());
        }

        #[test]
        fn other_hypervisors_disable_hugetlb() {
            let hv = detect(Some("kvm"), true);
            assert_eq!(hv, Hypervisor::Other("kvm".to_string()));
            assert!(!hv.supports_hugetlb());
        }
    }

    mod mounts {
        use super::*;

        const MOUNTS: &str = "\
rootfs / rootfs rw 0 0
/dev/sda1 / ext4 rw,relatime 0 0
/dev/sdb1 /data xfs rw,relatime 0 0
tmpfs /data/tmp tmpfs rw 0 0
";

        #[test]
        fn longest_mount_point_wins() {
            assert_eq!(
                mount_fs_type(MOUNTS, Path::new("/data/dbnode")).as_deref(),
                Some("xfs")
            );
            assert_eq!(
                mount_fs_type(MOUNTS, Path::new("/data/tmp/x")).as_deref(),
                Some("tmpfs")
            );
        }

        #[test]
        fn rootfs_entry_is_ignored() {
            assert_eq!(mount_fs_type(MOUNTS, Path::new("/var/log")).as_deref(), Some("ext4"));
        }

        #[test]
        fn mount_point_match_is_by_component() {
            assert_eq!(
                mount_fs_type(MOUNTS, Path::new("/database")).as_deref(),
                Some("ext4")
            );
        }

        #[test]
        fn host_disks_reads_configured_mount_table() {
            let dir = tempfile::tempdir().unwrap();
            let real = std::fs::canonicalize(dir.path()).unwrap();
            let mounts = dir.path().join("mounts");
            std::fs::write(&mounts, format!("/dev/x {} btrfs rw 0 0\n", real.display())).unwrap();

            let probe = HostDisks::new(&mounts);

            assert_eq!(probe.fs_type(dir.path()).unwrap().as_deref(), Some("btrfs"));
            assert!(probe.available_bytes(dir.path()).unwrap() > 0);
        }
    }

    mod ports {
        use super::*;

        #[test]
        fn protocol_names() {
            assert_eq!(Protocol::Tcp.to_string(), "TCP");
            assert_eq!(Protocol::Udp.to_string(), "UDP");
        }

        #[test]
        fn bound_tcp_port_is_refused() {
            let holder = TcpListener::bind("127.0.0.1:0").unwrap();
            let port = holder.local_addr().unwrap().port();
            let loopback = Address::parse("127.0.0.1").unwrap();

            let err = HostPorts.try_bind(Protocol::Tcp, loopback, port).unwrap_err();

            assert_eq!(err.kind(), io::ErrorKind::AddrInUse);
        }

        #[test]
        fn free_udp_port_binds() {
            let probe = UdpSocket::bind("127.0.0.1:0").unwrap();
            let port = probe.local_addr().unwrap().port();
            drop(probe);
            let loopback = Address::parse("127.0.0.1").unwrap();

            assert!(HostPorts.try_bind(Protocol::Udp, loopback, port).is_ok());
        }
    }
}
