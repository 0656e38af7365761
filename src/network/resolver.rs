//! Interface name ↔ address ↔ mask resolution.

use thiserror::Error;

use super::{Address, AddressError, FetchError, Interface, InterfaceFetcher, InterfaceSnapshot, RouteTable};

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;

/// Synthetic interface name for the wildcard address. Never enumerated.
pub const GLOBAL_INTERFACE: &str = "Global";

/// Error type for interface resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The named interface does not exist or has no IPv4 address.
    #[error("Interface {interface} does not exist or has no address assigned")]
    NoAddress {
        /// The interface name that was looked up
        interface: String,
    },

    /// More than one live interface falls in the requested subnet.
    #[error("Multiple interfaces match subnet {subnet}: {}", candidates.join(", "))]
    MultipleMatches {
        /// The subnet that was searched
        subnet: String,
        /// Names of the matching interfaces
        candidates: Vec<String>,
    },

    /// The address or mask text could not be parsed.
    #[error(transparent)]
    InvalidAddress(#[from] AddressError),

    /// Interface enumeration failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Resolves interfaces against the live host.
///
/// Owns the interface enumeration seam and the route table, which is
/// built once and reused. The interface list is fetched on first use and
/// memoized for the lifetime of the resolver.
pub struct InterfaceResolver {
    fetcher: Box<dyn InterfaceFetcher>,
    routes: RouteTable,
    interfaces: Option<Vec<InterfaceSnapshot>>,
}

impl std::fmt::Debug for InterfaceResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterfaceResolver")
            .field("routes", &self.routes)
            .field("interfaces", &self.interfaces)
            .finish_non_exhaustive()
    }
}

impl InterfaceResolver {
    /// Creates a resolver over `fetcher` and an already-built route table.
    #[must_use]
    pub fn new(fetcher: Box<dyn InterfaceFetcher>, routes: RouteTable) -> Self {
        Self {
            fetcher,
            routes,
            interfaces: None,
        }
    }

    /// The cached route table.
    #[must_use]
    pub const fn routes(&self) -> &RouteTable {
        &self.routes
    }

    fn snapshots(&mut self) -> Result<&[InterfaceSnapshot], ResolveError> {
        if self.interfaces.is_none() {
            let fetched = self.fetcher.fetch()?;
            tracing::debug!("Enumerated {} network interfaces", fetched.len());
            self.interfaces = Some(fetched);
        }
        Ok(self.interfaces.as_deref().unwrap_or_default())
    }

    /// Live address of the named interface.
    ///
    /// # Errors
    ///
    /// [`ResolveError::NoAddress`] if the interface is missing or unaddressed;
    /// [`ResolveError::Fetch`] if enumeration fails.
    pub fn address_for(&mut self, name: &str) -> Result<Address, ResolveError> {
        if name == GLOBAL_INTERFACE {
            return Ok(Address::WILDCARD);
        }
        self.snapshots()?
            .iter()
            .find(|s| s.name == name)
            .and_then(|s| s.address)
            .ok_or_else(|| ResolveError::NoAddress {
                interface: name.to_string(),
            })
    }

    /// Name of the interface currently holding `address`.
    ///
    /// The wildcard maps to [`GLOBAL_INTERFACE`].
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Fetch`] if enumeration fails.
    pub fn interface_for(&mut self, address: Address) -> Result<Option<String>, ResolveError> {
        if address.is_wildcard() {
            return Ok(Some(GLOBAL_INTERFACE.to_string()));
        }
        Ok(self
            .snapshots()?
            .iter()
            .find(|s| s.address == Some(address))
            .map(|s| s.name.clone()))
    }

    /// Mask for `interface` from the route table.
    #[must_use]
    pub fn mask_for(&self, interface: &Interface) -> Option<Address> {
        let name = interface.name.as_deref()?;
        self.routes.mask_for(name, interface.address)
    }

    /// Builds an [`Interface`] from user text.
    ///
    /// Accepts an address (any [`Address::parse`] form) or an interface
    /// name, either optionally followed by `/mask`. The missing half is
    /// looked up on the host; a missing mask is derived from the route table.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::InvalidAddress`] for an unparsable mask
    /// - [`ResolveError::NoAddress`] for a name with no assigned address
    /// - [`ResolveError::Fetch`] if enumeration fails
    pub fn resolve(&mut self, text: &str) -> Result<Interface, ResolveError> {
        let (head, mask_text) = match text.split_once('/') {
            Some((head, mask)) => (head, Some(mask)),
            None => (text, None),
        };
        let mask = mask_text.map(Address::parse).transpose()?;

        let mut interface = match Address::parse(head) {
            Ok(address) if address.is_wildcard() => {
                return Ok(Interface::new(None, address, mask));
            }
            Ok(address) => Interface::new(self.interface_for(address)?, address, mask),
            Err(_) => {
                let address = self.address_for(head)?;
                Interface::new(Some(head.to_string()), address, mask)
            }
        };
        if interface.mask.is_none() {
            interface.mask = self.mask_for(&interface);
        }
        Ok(interface)
    }

    /// Every live interface with an address, preceded by the synthetic
    /// global interface.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Fetch`] if enumeration fails.
    pub fn list_interfaces(&mut self) -> Result<Vec<Interface>, ResolveError> {
        let mut found = vec![Interface::new(
            Some(GLOBAL_INTERFACE.to_string()),
            Address::WILDCARD,
            None,
        )];
        found.extend(self.live_interfaces()?);
        Ok(found)
    }

    fn live_interfaces(&mut self) -> Result<Vec<Interface>, ResolveError> {
        let addressed: Vec<(String, Address)> = self
            .snapshots()?
            .iter()
            .filter_map(|s| s.address.map(|a| (s.name.clone(), a)))
            .collect();
        Ok(addressed
            .into_iter()
            .map(|(name, address)| {
                let mask = self.routes.mask_for(&name, address);
                Interface::new(Some(name), address, mask)
            })
            .collect())
    }

    /// Non-loopback addresses on the host, optionally led by the wildcard.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Fetch`] if enumeration fails.
    pub fn available_addresses(&mut self, include_wildcard: bool) -> Result<Vec<Address>, ResolveError> {
        let mut addresses = Vec::new();
        if include_wildcard {
            addresses.push(Address::WILDCARD);
        }
        addresses.extend(
            self.snapshots()?
                .iter()
                .filter_map(|s| s.address)
                .filter(|a| !a.is_loopback()),
        );
        Ok(addresses)
    }

    /// The interface that owns the default route, if it has an address.
    pub fn default_interface(&mut self) -> Option<Interface> {
        let name = self.routes.default_interface()?.to_string();
        match self.address_for(&name) {
            Ok(address) => {
                let mask = self.routes.mask_for(&name, address);
                Some(Interface::new(Some(name), address, mask))
            }
            Err(e) => {
                tracing::debug!("Default route interface unusable: {e}");
                None
            }
        }
    }

    /// The unique live interface whose address falls in `subnet`.
    ///
    /// The global interface is never a candidate.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::MultipleMatches`] when the subnet is ambiguous
    /// - [`ResolveError::Fetch`] if enumeration fails
    pub fn find_interface_in_subnet(&mut self, subnet: &Interface) -> Result<Option<Interface>, ResolveError> {
        let mut found: Vec<Interface> = self
            .live_interfaces()?
            .into_iter()
            .filter(|candidate| subnet.contains(candidate))
            .collect();
        match found.len() {
            0 => Ok(None),
            1 => Ok(found.pop()),
            _ => Err(ResolveError::MultipleMatches {
                subnet: subnet.to_string(),
                candidates: found.into_iter().filter_map(|i| i.name).collect(),
            }),
        }
    }
}
