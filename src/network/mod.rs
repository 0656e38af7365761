//! Network layer for resolving interfaces, addresses and masks.
//!
//! This module provides types and traits for:
//! - IPv4 addresses and masks ([`Address`])
//! - The kernel route table ([`RouteTable`])
//! - Interfaces as named by the user or found on the host ([`Interface`])
//! - Live interface enumeration ([`InterfaceFetcher`])
//! - Name ↔ address ↔ mask resolution ([`InterfaceResolver`])
//! - Platform-specific implementations ([`platform`])

mod address;
pub(crate) mod fetcher;
mod interface;
pub mod platform;
pub(crate) mod route;
mod resolver;

pub use address::{Address, AddressError};
pub use fetcher::{FetchError, InterfaceFetcher, InterfaceSnapshot};
pub use interface::Interface;
pub use resolver::{GLOBAL_INTERFACE, InterfaceResolver, ResolveError};
pub use route::{PROC_NET_ROUTE, Route, RouteError, RouteTable};
