//! Live interface enumeration seam.

use thiserror::Error;

use super::Address;

/// One network interface as seen by the operating system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceSnapshot {
    /// Kernel interface name (e.g. `eth0`).
    pub name: String,
    /// Primary IPv4 address, if one is assigned.
    pub address: Option<Address>,
}

impl InterfaceSnapshot {
    /// Creates a snapshot.
    #[must_use]
    pub fn new(name: impl Into<String>, address: Option<Address>) -> Self {
        Self {
            name: name.into(),
            address,
        }
    }
}

/// Error type for interface enumeration.
///
/// Describes what went wrong without dictating recovery strategy.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The platform query failed.
    #[error("Failed to enumerate network interfaces: {0}")]
    Io(#[from] std::io::Error),

    /// Platform-specific error with a generic message.
    #[error("Platform error: {message}")]
    Platform {
        /// Error message describing the platform-specific failure.
        message: String,
    },
}

/// Trait for enumerating the host's network interfaces.
///
/// Implementations return every interface, including ones without an
/// IPv4 address; callers decide what to skip.
pub trait InterfaceFetcher {
    /// Fetches the current state of all network interfaces.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when the platform query fails.
    fn fetch(&self) -> Result<Vec<InterfaceSnapshot>, FetchError>;
}
