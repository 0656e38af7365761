//! Kernel IPv4 route table.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::Address;

/// Location of the kernel route table on Linux.
pub const PROC_NET_ROUTE: &str = "/proc/net/route";

/// Error reading the route table.
#[derive(Debug, Error)]
pub enum RouteError {
    /// The route file could not be read.
    #[error("Failed to read route table '{}': {source}", path.display())]
    Read {
        /// Path that was read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// One row of the kernel route table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Owning interface name.
    pub interface: String,
    /// Destination network.
    pub destination: Address,
    /// Next hop.
    pub gateway: Address,
    /// Destination mask.
    pub mask: Address,
}

impl Route {
    /// Parses a whitespace-separated `/proc/net/route` row.
    ///
    /// Columns used: 0 `Iface`, 1 `Destination`, 2 `Gateway`, 7 `Mask`.
    /// Returns `None` for the header row and malformed rows.
    #[must_use]
    pub fn parse_line(line: &str) -> Option<Self> {
        let columns: Vec<&str> = line.split_whitespace().collect();
        if columns.len() < 8 || columns[0] == "Iface" {
            return None;
        }
        Some(Self {
            interface: columns[0].to_string(),
            destination: Address::parse(columns[1]).ok()?,
            gateway: Address::parse(columns[2]).ok()?,
            mask: Address::parse(columns[7]).ok()?,
        })
    }

    /// True if `address` falls in this route's destination subnet.
    #[must_use]
    pub const fn applies_to(&self, address: Address) -> bool {
        self.destination.in_subnet(address, self.mask)
    }

    /// True for a `/0` route.
    #[must_use]
    pub const fn is_default(&self) -> bool {
        self.mask.specificity() == 0
    }
}

/// Routes grouped by interface, plus the default route's interface.
///
/// Built once per process and held by the resolver.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<String, Vec<Route>>,
    default_interface: Option<String>,
}

impl RouteTable {
    /// Reads and parses the live route table.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::Read`] if the file cannot be read.
    pub fn load(path: &Path) -> Result<Self, RouteError> {
        let content = std::fs::read_to_string(path).map_err(|source| RouteError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&content))
    }

    /// Parses route table text, skipping the header and malformed rows.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let mut table = Self::default();
        for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let Some(route) = Route::parse_line(line) else {
                tracing::debug!("Skipping route table row: {line}");
                continue;
            };
            if route.is_default() && table.default_interface.is_none() {
                table.default_interface = Some(route.interface.clone());
            }
            table
                .routes
                .entry(route.interface.clone())
                .or_default()
                .push(route);
        }
        table
    }

    /// Name of the interface owning the first `/0` route.
    #[must_use]
    pub fn default_interface(&self) -> Option<&str> {
        self.default_interface.as_deref()
    }

    /// Routes owned by `interface`, in table order.
    #[must_use]
    pub fn routes_for(&self, interface: &str) -> &[Route] {
        self.routes.get(interface).map_or(&[], Vec::as_slice)
    }

    /// Most specific mask among `interface`'s routes whose destination
    /// contains `address`.
    ///
    /// `None` when the interface has no routes or none apply; an unknown
    /// mask is a normal condition, not an error.
    #[must_use]
    pub fn mask_for(&self, interface: &str, address: Address) -> Option<Address> {
        self.routes_for(interface)
            .iter()
            .filter(|route| route.applies_to(address))
            .map(|route| route.mask)
            .reduce(|best, mask| {
                if mask.cmp_specificity(best).is_gt() {
                    mask
                } else {
                    best
                }
            })
    }

    /// True if no routes were parsed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
pub(crate) const SAMPLE_ROUTES: &str = "\
Iface\tDestination\tGateway \tFlags\tRefCnt\tUse\tMetric\tMask\t\tMTU\tWindow\tIRTT
eth0\t00000000\t0101A8C0\t0003\t0\t0\t100\t00000000\t0\t0\t0
eth0\t0000A8C0\t00000000\t0001\t0\t0\t100\t0000FFFF\t0\t0\t0
eth0\t0001A8C0\t00000000\t0001\t0\t0\t100\t00FFFFFF\t0\t0\t0
eth1\t0000000A\t00000000\t0001\t0\t0\t0\t000000FF\t0\t0\t0
wlan0\t00000000\t0100A8C0\t0003\t0\t0\t600\t00000000\t0\t0\t0
";
