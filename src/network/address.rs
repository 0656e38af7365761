//! IPv4 addresses and masks as 32-bit values.

use std::cmp::Ordering;
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use thiserror::Error;

/// Error returned when a string matches none of the accepted address forms.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// The input is not dotted-quad, 8-digit hex, a prefix length or an integer.
    #[error("`{0}` is not a known IP address format")]
    InvalidFormat(String),
}

/// An IPv4 address or subnet mask.
///
/// Equality is value equality. Masks additionally have a *specificity*
/// (the number of set bits), see [`Address::cmp_specificity`].
///
/// The all-zero address is the wildcard ("listen on all interfaces").
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Address(u32);

impl Address {
    /// The wildcard address `0.0.0.0`.
    pub const WILDCARD: Self = Self(0);

    /// Wraps a raw host-order value.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Returns the raw host-order value.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Builds the left-packed mask for a CIDR prefix length.
    ///
    /// Lengths above 32 saturate to `/32`.
    #[must_use]
    pub const fn from_prefix_len(len: u32) -> Self {
        if len == 0 {
            return Self(0);
        }
        if len >= 32 {
            return Self(u32::MAX);
        }
        Self(u32::MAX << (32 - len))
    }

    /// Parses any accepted textual form.
    ///
    /// Tried in order:
    /// 1. dotted-quad `a.b.c.d` (exactly four decimal octets)
    /// 2. eight hex digits in network byte order, as found in `/proc/net/route`
    /// 3. an integer below 32, taken as a CIDR prefix length
    /// 4. any other integer, taken as the raw 32-bit value
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::InvalidFormat`] naming the input when no form matches.
    pub fn parse(input: &str) -> Result<Self, AddressError> {
        if let Some(address) = parse_dotted(input) {
            return Ok(address);
        }
        if let Some(address) = parse_route_hex(input) {
            return Ok(address);
        }
        match input.parse::<u32>() {
            Ok(len) if len < 32 => Ok(Self::from_prefix_len(len)),
            Ok(raw) => Ok(Self(raw)),
            Err(_) => Err(AddressError::InvalidFormat(input.to_string())),
        }
    }

    /// Returns true for `0.0.0.0`.
    #[must_use]
    pub const fn is_wildcard(self) -> bool {
        self.0 == 0
    }

    /// Number of set bits; the specificity of a mask.
    #[must_use]
    pub const fn specificity(self) -> u32 {
        self.0.count_ones()
    }

    /// Orders masks by specificity. More set bits is more specific.
    ///
    /// This is the only ordering defined on addresses; it says nothing
    /// about numeric magnitude.
    #[must_use]
    pub const fn cmp_specificity(self, other: Self) -> Ordering {
        let (a, b) = (self.specificity(), other.specificity());
        if a < b {
            Ordering::Less
        } else if a > b {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }

    /// True iff `self` and `other` fall in the same subnet under `mask`.
    #[must_use]
    pub const fn in_subnet(self, other: Self, mask: Self) -> bool {
        self.0 & mask.0 == other.0 & mask.0
    }

    /// True for addresses in `127.0.0.0/8`.
    #[must_use]
    pub const fn is_loopback(self) -> bool {
        const LOOPBACK: Address = Address(0x7f00_0001);
        LOOPBACK.in_subnet(self, Self::from_prefix_len(8))
    }
}

fn parse_dotted(input: &str) -> Option<Address> {
    if input.matches('.').count() != 3 {
        return None;
    }
    let mut bits = 0u32;
    for octet in input.split('.') {
        if octet.is_empty() || !octet.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        bits = (bits << 8) | u32::from(octet.parse::<u8>().ok()?);
    }
    Some(Address(bits))
}

fn parse_route_hex(input: &str) -> Option<Address> {
    if input.len() != 8 || !input.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    // The kernel prints the in-memory (network order) bytes of a
    // little-endian word, so the least significant pair is the first octet.
    u32::from_str_radix(input, 16)
        .ok()
        .map(|raw| Address(raw.swap_bytes()))
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Ipv4Addr> for Address {
    fn from(addr: Ipv4Addr) -> Self {
        Self(u32::from(addr))
    }
}

impl From<Address> for Ipv4Addr {
    fn from(addr: Address) -> Self {
        Self::from(addr.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Ipv4Addr::from(*self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        Address::parse(s).unwrap()
    }

    mod parsing {
        use super::*;

        #[test]
        fn dotted_quad_round_trips() {
            for s in ["0.0.0.0", "10.2.3.4", "192.168.1.254", "255.255.255.255"] {
                assert_eq!(addr(s).to_string(), s);
            }
        }

        #[test]
        fn dotted_quad_requires_four_octets() {
            assert!(Address::parse("10.1.1").is_err());
            assert!(Address::parse("10.1.1.1.1").is_err());
            assert!(Address::parse("10..1.1").is_err());
        }

        #[test]
        fn dotted_quad_rejects_out_of_range_octet() {
            assert!(Address::parse("10.1.1.256").is_err());
        }

        #[test]
        fn hex_is_network_byte_order() {
            assert_eq!(addr("0001A8C0").to_string(), "192.168.1.0");
            assert_eq!(addr("00FFFFFF").to_string(), "255.255.255.0");
            assert_eq!(addr("00000000"), Address::WILDCARD);
        }

        #[test]
        fn small_integer_is_prefix_length() {
            assert_eq!(addr("24").to_string(), "255.255.255.0");
            assert_eq!(addr("16").to_string(), "255.255.0.0");
            assert_eq!(addr("0"), Address::WILDCARD);
            assert_eq!(addr("31").to_string(), "255.255.255.254");
        }

        #[test]
        fn larger_integer_is_raw_value() {
            assert_eq!(addr("32").bits(), 32);
            assert_eq!(addr("3232235777").to_string(), "192.168.1.1");
        }

        #[test]
        fn garbage_names_the_input() {
            let err = Address::parse("eth0").unwrap_err();
            assert_eq!(err, AddressError::InvalidFormat("eth0".to_string()));
            assert!(err.to_string().contains("eth0"));
        }
    }

    mod subnet {
        use super::*;

        #[test]
        fn in_subnet_is_reflexive() {
            for mask in [0, 8, 16, 24, 31, 32] {
                let a = addr("172.16.5.9");
                assert!(a.in_subnet(a, Address::from_prefix_len(mask)));
            }
        }

        #[test]
        fn in_subnet_compares_masked_bits() {
            let mask = addr("24");
            assert!(addr("10.0.0.7").in_subnet(addr("10.0.0.200"), mask));
            assert!(!addr("10.0.1.7").in_subnet(addr("10.0.0.200"), mask));
        }

        #[test]
        fn loopback_covers_slash_eight() {
            assert!(addr("127.0.0.1").is_loopback());
            assert!(addr("127.255.0.3").is_loopback());
            assert!(!addr("128.0.0.1").is_loopback());
        }
    }

    mod specificity {
        use super::*;

        #[test]
        fn counts_set_bits() {
            assert_eq!(addr("24").specificity(), 24);
            assert_eq!(Address::WILDCARD.specificity(), 0);
            assert_eq!(Address::from_prefix_len(32).specificity(), 32);
        }

        #[test]
        fn slash_24_is_more_specific_than_slash_16() {
            assert_eq!(addr("24").cmp_specificity(addr("16")), Ordering::Greater);
            assert_eq!(addr("16").cmp_specificity(addr("24")), Ordering::Less);
        }

        #[test]
        fn equal_bit_counts_are_equally_specific() {
            let a = Address::from_bits(0x0000_00ff);
            assert_eq!(a.cmp_specificity(addr("8")), Ordering::Equal);
            assert_ne!(a, addr("8"));
        }
    }
}
