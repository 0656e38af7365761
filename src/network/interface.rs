//! A network interface as named by the user or found on the host.

use std::fmt;

use super::Address;

/// Interface name, address and (optionally) mask.
///
/// Built through [`InterfaceResolver::resolve`](super::InterfaceResolver::resolve)
/// from either a device name or an address / CIDR string; the resolver fills
/// in whichever half it can.
///
/// # Equality
///
/// Two interfaces are equal if they have the same name. Unnamed interfaces
/// compare equal to each other.
#[derive(Debug, Clone, Default)]
pub struct Interface {
    /// Device name, when known.
    pub name: Option<String>,
    /// Assigned address; `0.0.0.0` for the null interface.
    pub address: Address,
    /// Subnet mask, when known.
    pub mask: Option<Address>,
}

impl Interface {
    /// The null interface: `0.0.0.0`, no name, no mask.
    #[must_use]
    pub const fn wildcard() -> Self {
        Self {
            name: None,
            address: Address::WILDCARD,
            mask: None,
        }
    }

    /// Creates an interface from its parts.
    #[must_use]
    pub fn new(name: Option<String>, address: Address, mask: Option<Address>) -> Self {
        Self {
            name,
            address,
            mask,
        }
    }

    /// True if this is the wildcard address.
    #[must_use]
    pub const fn is_wildcard(&self) -> bool {
        self.address.is_wildcard()
    }

    /// True for a routable, non-loopback interface.
    ///
    /// The null interface is never external.
    #[must_use]
    pub fn is_external(&self) -> bool {
        !self.address.is_wildcard() && self.name.as_deref() != Some("lo")
    }

    /// True if `other`'s address is inside this interface's subnet.
    ///
    /// Without both an address and a mask nothing is considered local.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        match self.mask {
            Some(mask) if !self.address.is_wildcard() => {
                self.address.in_subnet(other.address, mask)
            }
            _ => false,
        }
    }
}

impl PartialEq for Interface {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Interface {}

impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mask {
            Some(mask) => write!(f, "{}/{}", self.address, mask),
            None => write!(f, "{}", self.address),
        }
    }
}
