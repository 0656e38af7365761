//! Linux network interface enumeration using `getifaddrs`.

use std::net::Ipv4Addr;

use nix::ifaddrs::getifaddrs;

use crate::network::{Address, FetchError, InterfaceFetcher, InterfaceSnapshot};

/// Linux implementation of [`InterfaceFetcher`] using `getifaddrs(3)`.
///
/// Every interface is reported once, in kernel order, carrying the first
/// IPv4 address the kernel lists for it.
///
/// # Example
///
/// ```no_run
/// use dbnode_config::network::{InterfaceFetcher, platform::LinuxFetcher};
///
/// let fetcher = LinuxFetcher::new();
/// for iface in fetcher.fetch().expect("Failed to fetch interfaces") {
///     println!("{}: {:?}", iface.name, iface.address);
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct LinuxFetcher {
    _private: (),
}

impl LinuxFetcher {
    /// Creates a new Linux interface fetcher.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }
}

impl InterfaceFetcher for LinuxFetcher {
    fn fetch(&self) -> Result<Vec<InterfaceSnapshot>, FetchError> {
        let addrs = getifaddrs().map_err(std::io::Error::from)?;

        let mut interfaces: Vec<InterfaceSnapshot> = Vec::new();
        for ifaddr in addrs {
            let ipv4 = ifaddr
                .address
                .as_ref()
                .and_then(|storage| storage.as_sockaddr_in())
                .map(|sin| Address::from(Ipv4Addr::from(sin.ip())));

            match interfaces.iter_mut().find(|s| s.name == ifaddr.interface_name) {
                Some(existing) => {
                    if existing.address.is_none() {
                        existing.address = ipv4;
                    }
                }
                None => interfaces.push(InterfaceSnapshot::new(ifaddr.interface_name, ipv4)),
            }
        }
        Ok(interfaces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loopback_is_enumerated() {
        let interfaces = LinuxFetcher::new().fetch().unwrap();

        let lo = interfaces.iter().find(|s| s.name == "lo");
        assert!(lo.is_some(), "expected loopback in {interfaces:?}");
    }

    #[test]
    fn names_are_unique() {
        let interfaces = LinuxFetcher::new().fetch().unwrap();
        let mut names: Vec<_> = interfaces.iter().map(|s| s.name.as_str()).collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
    }
}
